//! Persisted configuration store.
//!
//! One [`ConfigStore`] owns one JSON document on disk and is the only code
//! in the process allowed to touch that file. Mutations go through an actor
//! task so concurrent writers serialize, and every save rewrites the whole
//! document atomically (temp file, then rename). Reads are served from an
//! in-memory mirror and never touch the disk.
//!
//! A `set_*` call resolves only after the actor has persisted the change, so
//! a read issued after a resolved write always observes that write.

mod document;

pub use document::{StoreDocument, WindowBounds};

use crate::error::store::StoreError;
use crate::protocol::ThemeSource;

use common::ErrorLocation;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;
use tokio::sync::{RwLock, mpsc, oneshot};

/// Capacity of the actor's command queue.
const COMMAND_QUEUE_DEPTH: usize = 32;

type Ack = oneshot::Sender<Result<(), StoreError>>;

/// Commands that mutate the persisted document. Each carries an ack channel
/// the actor answers once the document has hit the disk.
enum StoreCommand {
    SetWindowBounds {
        value: Option<WindowBounds>,
        ack: Ack,
    },
    SetTheme {
        value: Option<ThemeSource>,
        ack: Ack,
    },
    SetModuleSlice {
        name: String,
        value: Option<Value>,
        ack: Ack,
    },
}

/// Handle to one persisted store file.
///
/// Cloneable; all clones share the same actor and mirror. Dropping every
/// clone shuts the actor down.
#[derive(Clone)]
pub struct ConfigStore {
    command_tx: mpsc::Sender<StoreCommand>,
    document: Arc<RwLock<StoreDocument>>,
    path: Arc<PathBuf>,
}

impl ConfigStore {
    /// Open (or conjure with defaults) the store named `name` under `dir`.
    ///
    /// A missing file, an unreadable file, or a file that is not valid JSON
    /// all load as the default document with a log line; schema recovery
    /// beyond that is per key ([`StoreDocument::from_loose_value`]). Opening
    /// never writes to disk.
    pub async fn open(dir: &Path, name: &str) -> Self {
        let path = dir.join(format!("{name}.json"));
        let document = load_document(&path).await;

        let document = Arc::new(RwLock::new(document));
        let path = Arc::new(path);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

        tokio::spawn(store_actor(
            command_rx,
            Arc::clone(&document),
            Arc::clone(&path),
        ));

        Self {
            command_tx,
            document,
            path,
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn window_bounds(&self) -> WindowBounds {
        self.document.read().await.window_bounds
    }

    pub async fn theme(&self) -> ThemeSource {
        self.document.read().await.theme
    }

    /// Current value of the named module slice, if one is stored.
    pub async fn module_slice(&self, name: &str) -> Option<Value> {
        self.document.read().await.modules.get(name).cloned()
    }

    /// Persist new window bounds; `None` clears back to the default.
    pub async fn set_window_bounds(&self, value: Option<WindowBounds>) -> Result<(), StoreError> {
        self.submit(|ack| StoreCommand::SetWindowBounds { value, ack })
            .await
    }

    /// Persist a new theme; `None` clears back to the default.
    pub async fn set_theme(&self, value: Option<ThemeSource>) -> Result<(), StoreError> {
        self.submit(|ack| StoreCommand::SetTheme { value, ack }).await
    }

    /// Persist the named module slice.
    pub async fn set_module_slice(&self, name: &str, value: Value) -> Result<(), StoreError> {
        self.submit(|ack| StoreCommand::SetModuleSlice {
            name: name.to_string(),
            value: Some(value),
            ack,
        })
        .await
    }

    /// Remove the named module slice from the document.
    pub async fn clear_module_slice(&self, name: &str) -> Result<(), StoreError> {
        self.submit(|ack| StoreCommand::SetModuleSlice {
            name: name.to_string(),
            value: None,
            ack,
        })
        .await
    }

    /// Queue one command and wait for the actor's durability ack.
    async fn submit(
        &self,
        command: impl FnOnce(Ack) -> StoreCommand,
    ) -> Result<(), StoreError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(command(ack_tx))
            .await
            .map_err(|_| StoreError::ActorClosed {
                location: ErrorLocation::capture(),
            })?;
        ack_rx.await.map_err(|_| StoreError::ActorClosed {
            location: ErrorLocation::capture(),
        })?
    }
}

/// Read and decode the backing file, defaulting on any failure.
async fn load_document(path: &Path) -> StoreDocument {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(reason) if reason.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "Store file {} not found, starting from defaults",
                path.display()
            );
            return StoreDocument::default();
        }
        Err(reason) => {
            warn!(
                "Store file {} could not be read ({reason}), starting from defaults",
                path.display()
            );
            return StoreDocument::default();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => StoreDocument::from_loose_value(value, path),
        Err(reason) => {
            warn!(
                "Store file {} holds invalid JSON ({reason}), starting from defaults",
                path.display()
            );
            StoreDocument::default()
        }
    }
}

/// Store actor task. Applies commands sequentially: mirror first, then the
/// atomic rewrite of the backing file, then the ack.
async fn store_actor(
    mut command_rx: mpsc::Receiver<StoreCommand>,
    document: Arc<RwLock<StoreDocument>>,
    path: Arc<PathBuf>,
) {
    info!("Config store actor started for {}", path.display());

    while let Some(command) = command_rx.recv().await {
        let ack = {
            let mut document = document.write().await;
            match command {
                StoreCommand::SetWindowBounds { value, ack } => {
                    document.window_bounds = value.unwrap_or_default();
                    ack
                }
                StoreCommand::SetTheme { value, ack } => {
                    document.theme = value.unwrap_or_default();
                    ack
                }
                StoreCommand::SetModuleSlice { name, value, ack } => {
                    match value {
                        Some(value) => {
                            document.modules.insert(name, value);
                        }
                        None => {
                            document.modules.remove(&name);
                        }
                    }
                    ack
                }
            }
        };

        let snapshot = document.read().await.clone();
        let result = save_document(&snapshot, &path).await;
        if let Err(reason) = &result {
            warn!("Store save failed, memory and disk now differ: {reason}");
        }
        let _ = ack.send(result);
    }

    info!("Config store actor stopped for {}", path.display());
}

/// Serialize the document and atomically replace the backing file.
async fn save_document(document: &StoreDocument, path: &Path) -> Result<(), StoreError> {
    let serialized =
        serde_json::to_string_pretty(document).map_err(|reason| StoreError::Serialize {
            reason: reason.to_string(),
            location: ErrorLocation::capture(),
        })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
                location: ErrorLocation::capture(),
            })?;
    }

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, serialized)
        .await
        .map_err(|source| StoreError::Write {
            path: staging.clone(),
            source,
            location: ErrorLocation::capture(),
        })?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::capture(),
        })
}
