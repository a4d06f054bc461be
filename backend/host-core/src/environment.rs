//! Process environment configuration.
//!
//! Read once at startup and immutable afterward. Every field has a
//! compiled-in default, so a bare process comes up pointing at production
//! endpoints; `RIVULET_*` variables override per field, and a `.env` file in
//! the working directory or next to the executable is honored with the real
//! environment winning.

use crate::error::environment::EnvironmentError;

use common::ErrorLocation;

use std::env;

use log::{debug, info, warn};
use url::Url;

pub const OAUTH_CLIENT_ID_VAR: &str = "RIVULET_OAUTH_CLIENT_ID";
pub const OAUTH_REDIRECT_URL_VAR: &str = "RIVULET_OAUTH_REDIRECT_URL";
pub const APP_PROTOCOL_VAR: &str = "RIVULET_APP_PROTOCOL";
pub const UPDATE_FEED_URL_VAR: &str = "RIVULET_UPDATE_FEED_URL";
pub const DEV_SERVER_URL_VAR: &str = "RIVULET_DEV_SERVER_URL";

const DEFAULT_OAUTH_CLIENT_ID: &str = "rivulet-desktop";
const DEFAULT_OAUTH_REDIRECT_URL: &str = "rivulet://oauth/callback";
const DEFAULT_APP_PROTOCOL: &str = "rivulet";
const DEFAULT_UPDATE_FEED_URL: &str = "https://updates.rivulet.app/stable";

/// Everything the shell learns from its process environment.
#[derive(Debug, Clone)]
pub struct Environment {
    /// OAuth client identifier presented to streaming platforms.
    pub oauth_client_id: String,
    /// Where the OAuth flow sends the user back to.
    pub oauth_redirect_url: Url,
    /// Custom URL scheme this shell registers with the OS.
    pub app_protocol: String,
    /// Base URL of the update distribution feed.
    pub update_feed_url: Url,
    /// Dev-server override for the presentation bundle, when set.
    pub dev_server_url: Option<Url>,
}

impl Environment {
    /// Load the environment, honoring `.env` files and validating URLs and
    /// the protocol identifier.
    pub fn load() -> Result<Self, EnvironmentError> {
        try_load_dotenv();

        let oauth_client_id = var_or(OAUTH_CLIENT_ID_VAR, DEFAULT_OAUTH_CLIENT_ID);
        let oauth_redirect_url = url_var(OAUTH_REDIRECT_URL_VAR, DEFAULT_OAUTH_REDIRECT_URL)?;
        let app_protocol = validated_protocol(var_or(APP_PROTOCOL_VAR, DEFAULT_APP_PROTOCOL))?;
        let update_feed_url = url_var(UPDATE_FEED_URL_VAR, DEFAULT_UPDATE_FEED_URL)?;

        let dev_server_url = match present_var(DEV_SERVER_URL_VAR) {
            Some(raw) => Some(parse_url(DEV_SERVER_URL_VAR, &raw)?),
            None => None,
        };

        debug!(
            "Environment loaded: protocol={app_protocol}, update feed={update_feed_url}, dev server={}",
            dev_server_url
                .as_ref()
                .map(Url::as_str)
                .unwrap_or("none")
        );

        Ok(Self {
            oauth_client_id,
            oauth_redirect_url,
            app_protocol,
            update_feed_url,
            dev_server_url,
        })
    }
}

/// Load `.env` from the working directory, falling back to the executable's
/// directory. Variables already in the real environment are not overridden.
fn try_load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from {}", path.display());
        return;
    }

    let Ok(exe_path) = env::current_exe() else {
        return;
    };
    let Some(exe_dir) = exe_path.parent() else {
        return;
    };
    let env_path = exe_dir.join(".env");
    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => info!("Loaded .env from {}", env_path.display()),
            Err(reason) => warn!("Failed to parse .env at {} ({reason})", env_path.display()),
        }
    }
}

/// The variable's value when it is set, unicode, and non-blank.
fn present_var(variable: &'static str) -> Option<String> {
    match env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!("{variable} is set but blank, ignoring it");
            None
        }
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!("{variable} contains invalid unicode, ignoring it");
            None
        }
    }
}

fn var_or(variable: &'static str, default: &str) -> String {
    present_var(variable).unwrap_or_else(|| default.to_string())
}

fn url_var(variable: &'static str, default: &str) -> Result<Url, EnvironmentError> {
    let raw = var_or(variable, default);
    parse_url(variable, &raw)
}

fn parse_url(variable: &'static str, raw: &str) -> Result<Url, EnvironmentError> {
    Url::parse(raw).map_err(|reason| EnvironmentError::InvalidUrl {
        variable,
        reason: reason.to_string(),
        location: ErrorLocation::capture(),
    })
}

/// A protocol identifier must be a valid URL scheme: an ASCII letter
/// followed by letters, digits, `+`, `-`, or `.`.
fn validated_protocol(value: String) -> Result<String, EnvironmentError> {
    let mut characters = value.chars();
    let leading_alphabetic = characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic());
    if !leading_alphabetic {
        return Err(EnvironmentError::InvalidProtocol {
            value,
            reason: "must start with an ASCII letter",
            location: ErrorLocation::capture(),
        });
    }
    let body_valid = characters
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));
    if !body_valid {
        return Err(EnvironmentError::InvalidProtocol {
            value,
            reason: "may only contain letters, digits, '+', '-' and '.'",
            location: ErrorLocation::capture(),
        });
    }
    Ok(value.to_ascii_lowercase())
}
