use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

// ============================================
// THEME
// ============================================

/// Theme hint shared by the host window and the presentation UI.
///
/// `System` defers to the OS preference; the other two force a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSource {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeSource::System => "system",
            ThemeSource::Light => "light",
            ThemeSource::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// APP PROPERTIES
// ============================================

/// Read-only host facts returned by the `GetAppProperties` channel.
///
/// Built once per request from process constants; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppProperties {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub architecture: String,
    pub app_protocol: String,
}

impl AppProperties {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        platform: impl Into<String>,
        architecture: impl Into<String>,
        app_protocol: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            platform: platform.into(),
            architecture: architecture.into(),
            app_protocol: app_protocol.into(),
        }
    }

    /// Properties of the running process, with platform and architecture
    /// taken from the compile-time target.
    pub fn current(version: impl Into<String>, app_protocol: impl Into<String>) -> Self {
        Self::new(
            crate::APP_NAME,
            version,
            std::env::consts::OS,
            std::env::consts::ARCH,
            app_protocol,
        )
    }
}

// ============================================
// INTERCEPTED LINKS
// ============================================

/// A query-string value after coercion to its JSON primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Payload of the `InterceptedLink` event channel.
///
/// `method` is the path portion of the custom-protocol URL; `payload` holds
/// the coerced query parameters. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedLink {
    pub method: String,
    #[serde(default)]
    pub payload: BTreeMap<String, LinkValue>,
}

// ============================================
// UPDATES
// ============================================

/// Where the updater currently is in the check/download/install sequence.
///
/// Process-wide, single-instance state; the updater is the only writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UpdateStatus {
    #[default]
    NotChecked,
    Checking,
    Error,
    Available,
    NotAvailable,
    Downloading,
    ReadyForInstall,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::NotChecked => "NotChecked",
            UpdateStatus::Checking => "Checking",
            UpdateStatus::Error => "Error",
            UpdateStatus::Available => "Available",
            UpdateStatus::NotAvailable => "NotAvailable",
            UpdateStatus::Downloading => "Downloading",
            UpdateStatus::ReadyForInstall => "ReadyForInstall",
        }
    }

    /// True when no check or download is in flight. Only a settled updater
    /// accepts the next command.
    pub fn is_settled(&self) -> bool {
        !matches!(self, UpdateStatus::Checking | UpdateStatus::Downloading)
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable file listed in an update manifest.
///
/// `url` may be absolute or relative to the feed base. `sha256` is the hex
/// digest the staged file must match when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateArtifact {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Update metadata parsed from the distribution feed's `latest.json`.
///
/// Transient: a new check discards the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<UpdateArtifact>,
}
