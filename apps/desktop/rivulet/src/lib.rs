// Library exports for testing
// The binary (main.rs) imports these as well

pub mod bridge_access;
pub mod error;
pub mod logger;
pub mod shell;

#[cfg(test)]
mod tests;
