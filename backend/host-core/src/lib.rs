pub mod bridge;
pub mod context;
pub mod deeplink;
pub mod environment;
pub mod error;
pub mod modstate;
pub mod protocol;
pub mod store;
pub mod updater;

#[cfg(test)]
mod tests;

pub const APP_NAME: &str = "rivulet";
pub const BRIDGE_HOSTNAME: &str = "127.0.0.1";
pub const BRIDGE_BASE_URL: &str = const_format::concatcp!("ws://", BRIDGE_HOSTNAME);

/// User agent sent on every request to the distribution source.
pub const UPDATE_USER_AGENT: &str =
    const_format::concatcp!(APP_NAME, "/", env!("CARGO_PKG_VERSION"));
