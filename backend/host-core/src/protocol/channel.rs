use serde::{Deserialize, Serialize};

use std::fmt;

/// The closed set of names a frame may carry.
///
/// Seven request/response channels and one event channel. The enum is the
/// contract: a name outside this set fails deserialization at the transport
/// boundary, so handler code never sees an unknown channel, and a name is
/// never reused for a different payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelName {
    /// Request: snapshot of read-only host information.
    GetAppProperties,
    /// Request: switch the OS-level theme hint and persist the choice.
    SetThemeSource,
    /// Request: wipe presentation-side session data at the host level.
    ClearSessionStorage,
    /// Request: query the distribution source for a newer version.
    CheckForUpdates,
    /// Request: fetch and stage the artifacts of an offered update.
    DownloadUpdate,
    /// Request: apply a staged update and restart.
    InstallUpdate,
    /// Request: open a URL in the user's default external browser.
    OpenUrlInBrowser,
    /// Event: the OS handed the running instance a custom-protocol URL.
    InterceptedLink,
}

impl ChannelName {
    /// Every channel, request channels first.
    pub const ALL: [ChannelName; 8] = [
        ChannelName::GetAppProperties,
        ChannelName::SetThemeSource,
        ChannelName::ClearSessionStorage,
        ChannelName::CheckForUpdates,
        ChannelName::DownloadUpdate,
        ChannelName::InstallUpdate,
        ChannelName::OpenUrlInBrowser,
        ChannelName::InterceptedLink,
    ];

    /// The wire spelling of the channel name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::GetAppProperties => "GetAppProperties",
            ChannelName::SetThemeSource => "SetThemeSource",
            ChannelName::ClearSessionStorage => "ClearSessionStorage",
            ChannelName::CheckForUpdates => "CheckForUpdates",
            ChannelName::DownloadUpdate => "DownloadUpdate",
            ChannelName::InstallUpdate => "InstallUpdate",
            ChannelName::OpenUrlInBrowser => "OpenUrlInBrowser",
            ChannelName::InterceptedLink => "InterceptedLink",
        }
    }

    /// Resolve a wire spelling back to a channel, if it names one.
    pub fn from_name(name: &str) -> Option<ChannelName> {
        ChannelName::ALL
            .iter()
            .copied()
            .find(|channel| channel.as_str() == name)
    }

    /// True for host-to-presentation event channels, which carry no
    /// correlation id and produce no response.
    pub fn is_event(&self) -> bool {
        matches!(self, ChannelName::InterceptedLink)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
