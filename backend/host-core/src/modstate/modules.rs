use super::{ModuleState, ModuleStates, SavePolicy};

use crate::error::store::StoreError;

use serde::{Deserialize, Serialize};

pub const SIDEBAR_MODULE: &str = "sidebar";
pub const THEME_MODULE: &str = "theme";
pub const LIBRARY_MODULE: &str = "library";

/// Sidebar geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarState {
    pub width: u32,
}

impl Default for SidebarState {
    fn default() -> Self {
        Self { width: 300 }
    }
}

/// Named color theme selected in the presentation UI. Distinct from the
/// root-level OS theme hint, which lives outside the module namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeState {
    pub name: String,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            name: "dark".to_string(),
        }
    }
}

/// How the stream library is ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryState {
    pub sorting: String,
}

impl Default for LibraryState {
    fn default() -> Self {
        Self {
            sorting: "recent".to_string(),
        }
    }
}

impl ModuleStates {
    /// Sidebar module slice. Persists on every change.
    pub async fn sidebar(&self) -> Result<ModuleState<SidebarState>, StoreError> {
        self.create(SIDEBAR_MODULE, SidebarState::default(), SavePolicy::OnChange)
            .await
    }

    /// Theme module slice. Persists on every change.
    pub async fn theme(&self) -> Result<ModuleState<ThemeState>, StoreError> {
        self.create(THEME_MODULE, ThemeState::default(), SavePolicy::OnChange)
            .await
    }

    /// Library module slice. Persists only on an explicit `save()`; a
    /// mutation not yet saved does not survive a crash.
    pub async fn library(&self) -> Result<ModuleState<LibraryState>, StoreError> {
        self.create(LIBRARY_MODULE, LibraryState::default(), SavePolicy::Explicit)
            .await
    }
}
