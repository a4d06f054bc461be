//! Per-module state synchronized with the config store.
//!
//! A feature module asks [`ModuleStates`] for its named slice once at
//! startup and receives a [`ModuleState`]: live in-memory state backed by
//! the store's `modules` namespace. The module mutates the in-memory copy;
//! persistence follows the [`SavePolicy`] the module registered with.
//!
//! The store stays the durability authority. This layer never touches the
//! disk itself; everything goes through the store's module-slice calls.

mod modules;

pub use modules::{LIBRARY_MODULE, LibraryState, SIDEBAR_MODULE, SidebarState, THEME_MODULE, ThemeState};

use crate::error::store::StoreError;
use crate::store::ConfigStore;

use common::ErrorLocation;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, RwLockReadGuard};

/// When a module's in-memory changes reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Nothing persists until the module calls [`ModuleState::save`].
    Explicit,
    /// Every [`ModuleState::modify`] persists before it resolves.
    OnChange,
}

/// Factory for named module slices, one per store.
///
/// Module names must be unique within one factory; registering a name twice
/// is a programming error and panics.
#[derive(Clone)]
pub struct ModuleStates {
    store: ConfigStore,
    registered: Arc<Mutex<HashSet<String>>>,
}

impl ModuleStates {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            registered: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Build the live state for module `name`.
    ///
    /// The slice is read from the store; a missing or wrong-shaped stored
    /// value falls back to `default_state`, which is then seeded over
    /// whatever was there. After creation the returned [`ModuleState`] is
    /// the module's only handle to the slice.
    ///
    /// # Panics
    ///
    /// Panics when `name` was already registered on this factory.
    pub async fn create<S>(
        &self,
        name: &str,
        default_state: S,
        policy: SavePolicy,
    ) -> Result<ModuleState<S>, StoreError>
    where
        S: Serialize + DeserializeOwned + Clone,
    {
        {
            let mut registered = self.registered.lock().expect("module registry poisoned");
            assert!(
                registered.insert(name.to_string()),
                "module state '{name}' registered twice"
            );
        }

        let state = match self.store.module_slice(name).await {
            Some(stored) => match serde_json::from_value::<S>(stored) {
                Ok(state) => state,
                Err(reason) => {
                    warn!(
                        "Stored state for module '{name}' has the wrong shape ({reason}), reseeding the default"
                    );
                    self.seed(name, &default_state).await?;
                    default_state
                }
            },
            None => {
                self.seed(name, &default_state).await?;
                default_state
            }
        };

        Ok(ModuleState {
            name: name.to_string(),
            policy,
            store: self.store.clone(),
            state: Arc::new(RwLock::new(state)),
        })
    }

    async fn seed<S: Serialize>(&self, name: &str, state: &S) -> Result<(), StoreError> {
        let value = serde_json::to_value(state).map_err(|reason| StoreError::Serialize {
            reason: reason.to_string(),
            location: ErrorLocation::capture(),
        })?;
        self.store.set_module_slice(name, value).await
    }
}

/// Live, store-backed state of one feature module.
///
/// Cloneable; clones share the in-memory state and the policy.
#[derive(Clone)]
pub struct ModuleState<S> {
    name: String,
    policy: SavePolicy,
    store: ConfigStore,
    state: Arc<RwLock<S>>,
}

impl<S> ModuleState<S>
where
    S: Serialize + DeserializeOwned + Clone,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    /// Read guard over the current in-memory state.
    pub async fn read(&self) -> RwLockReadGuard<'_, S> {
        self.state.read().await
    }

    /// Clone of the current in-memory state.
    pub async fn snapshot(&self) -> S {
        self.state.read().await.clone()
    }

    /// Mutate the in-memory state.
    ///
    /// Under [`SavePolicy::OnChange`] the mutated state is persisted before
    /// this resolves; under [`SavePolicy::Explicit`] it stays in memory
    /// until [`save`](Self::save).
    pub async fn modify(&self, mutate: impl FnOnce(&mut S)) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().await;
            mutate(&mut state);
        }
        match self.policy {
            SavePolicy::OnChange => self.save().await,
            SavePolicy::Explicit => Ok(()),
        }
    }

    /// Copy the current in-memory state into the store.
    pub async fn save(&self) -> Result<(), StoreError> {
        let snapshot = self.state.read().await.clone();
        let value = serde_json::to_value(&snapshot).map_err(|reason| StoreError::Serialize {
            reason: reason.to_string(),
            location: ErrorLocation::capture(),
        })?;
        self.store.set_module_slice(&self.name, value).await
    }
}
