//! The channel contract between the privileged host and the sandboxed
//! presentation process.
//!
//! This module is the single source of truth both sides compile against:
//! the closed [`ChannelName`] set, the payload types, and the wire frames.
//! The server ([`crate::bridge::server`]) and the presentation surface
//! ([`crate::bridge::surface`]) share these definitions, so a drift between
//! the two process images is a compile error here rather than a runtime
//! surprise there.
//!
//! # Wire shape
//!
//! Frames are JSON text messages over the WebSocket transport:
//!
//! - presentation → host: [`PresentationFrame`] — the `Hello` handshake or a
//!   [`BridgeRequest`] carrying a caller-generated v4 UUID and a
//!   channel-tagged [`ChannelCall`].
//! - host → presentation: [`HostFrame`] — the `Welcome` handshake answer, a
//!   correlated [`BridgeResponse`], or an unsolicited [`BridgeEvent`].
//!
//! Responses are paired to callers exclusively by the correlation id, never
//! by arrival order.

mod channel;
mod frames;
mod types;

pub use channel::ChannelName;
pub use frames::{
    BridgeEvent, BridgeRequest, BridgeResponse, ChannelCall, ChannelReturn, HostFrame,
    PresentationFrame, ResponseOutcome,
};
pub use types::{
    AppProperties, InterceptedLink, LinkValue, ThemeSource, UpdateArtifact, UpdateInfo,
    UpdateStatus,
};
