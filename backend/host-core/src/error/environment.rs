use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Environment Url Error: {variable}: {reason} {location}")]
    InvalidUrl {
        variable: &'static str,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Environment Protocol Error: {value:?}: {reason} {location}")]
    InvalidProtocol {
        value: String,
        reason: &'static str,
        location: ErrorLocation,
    },
}
