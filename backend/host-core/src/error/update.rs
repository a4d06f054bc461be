use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    /// A check or download is still running. Contract violation: the state
    /// machine accepts the next command only once the current one settles.
    #[error("Update Operation In Flight Error: status is {status} {location}")]
    OperationInFlight {
        status: String,
        location: ErrorLocation,
    },

    /// The operation is not legal from the current state, e.g. `install`
    /// before anything was downloaded. Contract violation, not retryable.
    #[error("Update Invalid Transition Error: cannot {operation} from {status} {location}")]
    InvalidTransition {
        operation: &'static str,
        status: String,
        location: ErrorLocation,
    },

    #[error("Update Feed Request Error: {url}: {source} {location}")]
    FeedRequest {
        url: String,
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Update Feed Status Error: {url} answered {status} {location}")]
    FeedStatus {
        url: String,
        status: u16,
        location: ErrorLocation,
    },

    #[error("Update Manifest Parse Error: {reason} {location}")]
    ManifestParse {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Update Manifest Invalid Error: {reason} {location}")]
    ManifestInvalid {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Update Artifact Request Error: {name}: {reason} {location}")]
    ArtifactFetch {
        name: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Update Artifact Digest Error: {name}: expected {expected}, got {actual} {location}")]
    DigestMismatch {
        name: String,
        expected: String,
        actual: String,
        location: ErrorLocation,
    },

    #[error("Update Staging Error: {path}: {source} {location}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    /// A previously staged artifact is gone from disk.
    #[error("Update Artifact Missing Error: {path} {location}")]
    ArtifactMissing {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Update Install Error: {reason} {location}")]
    Install {
        reason: String,
        location: ErrorLocation,
    },
}
