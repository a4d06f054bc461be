pub mod bridge;
pub mod environment;
pub mod link;
pub mod store;
pub mod update;

use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// An OS facility behind [`HostIntegration`] failed while executing a
    /// privileged call.
    ///
    /// [`HostIntegration`]: crate::bridge::HostIntegration
    #[error("Host Integration Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error(transparent)]
    Update(#[from] update::UpdateError),

    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Environment(#[from] environment::EnvironmentError),

    #[error(transparent)]
    Link(#[from] link::LinkError),
}
