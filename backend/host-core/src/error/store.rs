use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store Serialize Error: {reason} {location}")]
    Serialize {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Store Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    /// The store actor is gone. Only reachable after every handle to the
    /// store has been dropped, so a live caller should never see it.
    #[error("Store Actor Closed Error {location}")]
    ActorClosed { location: ErrorLocation },
}
