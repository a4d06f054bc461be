use super::channel::ChannelName;
use super::types::{AppProperties, InterceptedLink, ThemeSource, UpdateInfo};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================
// CHANNEL PAYLOADS
// ============================================

/// Request payload, tagged with the channel it invokes.
///
/// One variant per request channel; the variant shape is that channel's
/// argument list. Unit variants are zero-argument calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args")]
pub enum ChannelCall {
    GetAppProperties,
    SetThemeSource { value: ThemeSource },
    ClearSessionStorage,
    CheckForUpdates,
    DownloadUpdate,
    InstallUpdate,
    OpenUrlInBrowser { url: String },
}

impl ChannelCall {
    pub fn channel(&self) -> ChannelName {
        match self {
            ChannelCall::GetAppProperties => ChannelName::GetAppProperties,
            ChannelCall::SetThemeSource { .. } => ChannelName::SetThemeSource,
            ChannelCall::ClearSessionStorage => ChannelName::ClearSessionStorage,
            ChannelCall::CheckForUpdates => ChannelName::CheckForUpdates,
            ChannelCall::DownloadUpdate => ChannelName::DownloadUpdate,
            ChannelCall::InstallUpdate => ChannelName::InstallUpdate,
            ChannelCall::OpenUrlInBrowser { .. } => ChannelName::OpenUrlInBrowser,
        }
    }
}

/// Successful return payload, tagged with the channel that produced it.
///
/// The variant must match the request channel; the surface treats any other
/// pairing as a contract violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "value")]
pub enum ChannelReturn {
    GetAppProperties(AppProperties),
    SetThemeSource,
    ClearSessionStorage,
    CheckForUpdates(Option<UpdateInfo>),
    DownloadUpdate(Vec<String>),
    InstallUpdate,
    OpenUrlInBrowser,
}

impl ChannelReturn {
    pub fn channel(&self) -> ChannelName {
        match self {
            ChannelReturn::GetAppProperties(_) => ChannelName::GetAppProperties,
            ChannelReturn::SetThemeSource => ChannelName::SetThemeSource,
            ChannelReturn::ClearSessionStorage => ChannelName::ClearSessionStorage,
            ChannelReturn::CheckForUpdates(_) => ChannelName::CheckForUpdates,
            ChannelReturn::DownloadUpdate(_) => ChannelName::DownloadUpdate,
            ChannelReturn::InstallUpdate => ChannelName::InstallUpdate,
            ChannelReturn::OpenUrlInBrowser => ChannelName::OpenUrlInBrowser,
        }
    }
}

/// Unsolicited host-to-presentation push, tagged with its event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum BridgeEvent {
    InterceptedLink(InterceptedLink),
}

impl BridgeEvent {
    pub fn channel(&self) -> ChannelName {
        match self {
            BridgeEvent::InterceptedLink(_) => ChannelName::InterceptedLink,
        }
    }
}

// ============================================
// CORRELATION ENVELOPES
// ============================================

/// One in-flight call: a caller-generated correlation id plus the channel
/// payload. Responses are paired to callers exclusively by `id`, never by
/// arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: Uuid,
    pub call: ChannelCall,
}

impl BridgeRequest {
    /// Wrap a call with a fresh v4 correlation id.
    pub fn new(call: ChannelCall) -> Self {
        Self {
            id: Uuid::new_v4(),
            call,
        }
    }
}

/// The host's answer to one [`BridgeRequest`], carrying the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub id: Uuid,
    pub outcome: ResponseOutcome,
}

impl BridgeResponse {
    pub fn ok(id: Uuid, value: ChannelReturn) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Ok { value },
        }
    }

    pub fn err(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: ResponseOutcome::Err {
                message: message.into(),
            },
        }
    }
}

/// Success or failure of one privileged call.
///
/// Failures cross the boundary as a human-readable message; the typed error
/// stays on the host side (and in its log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Ok { value: ChannelReturn },
    Err { message: String },
}

// ============================================
// WIRE FRAMES
// ============================================

/// Everything the presentation process may send: the opening `Hello`
/// handshake, then requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum PresentationFrame {
    Hello { token: String },
    Request(BridgeRequest),
}

/// Everything the host may send: the handshake answer, correlated responses,
/// and unsolicited events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum HostFrame {
    Welcome {
        granted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Response(BridgeResponse),
    Event(BridgeEvent),
}
