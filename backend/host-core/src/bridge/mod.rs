//! The bridge between the privileged host and the sandboxed presentation
//! process.
//!
//! A localhost-only WebSocket server carries the typed channel contract
//! from [`crate::protocol`]: the presentation side sends correlated
//! requests, the host answers and pushes unsolicited events. Both halves
//! live here:
//!
//! - [`start_bridge_server`] runs the privileged side against a
//!   [`HostContext`](crate::context::HostContext);
//! - [`BridgeSurface`] is the typed presentation-side client the
//!   integration tests (and any Rust presentation code) drive.
//!
//! # Security
//!
//! - Binds `127.0.0.1` only; non-loopback peers are silently dropped.
//! - The first frame must be `Hello` with the per-launch token; every
//!   failure closes the connection.

mod handle;
mod host;
mod server;
mod surface;

pub use handle::BridgeServerHandle;
pub use host::{HostIntegration, NativeHost, RecordingHost};
pub use server::start_bridge_server;
pub use surface::{BridgeSurface, Subscription};
