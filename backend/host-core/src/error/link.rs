use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Link Malformed Error: {url:?}: {reason} {location}")]
    Malformed {
        url: String,
        reason: String,
        location: ErrorLocation,
    },

    /// The URL parsed but its scheme is not the protocol this shell
    /// registered. Never published as an event.
    #[error("Link Foreign Scheme Error: {url:?} has scheme {scheme:?}, expected {expected:?} {location}")]
    ForeignScheme {
        url: String,
        scheme: String,
        expected: String,
        location: ErrorLocation,
    },

    #[error("Link Missing Method Error: {url:?} carries no method path {location}")]
    MissingMethod {
        url: String,
        location: ErrorLocation,
    },
}
