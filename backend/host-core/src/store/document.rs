use crate::protocol::ThemeSource;

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const WINDOW_BOUNDS_KEY: &str = "windowBounds";
pub(crate) const THEME_KEY: &str = "theme";
pub(crate) const MODULES_KEY: &str = "modules";

/// Outer window geometry persisted across launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// The full persisted shape of one store file.
///
/// Root keys are typed; module slices stay loose JSON under `modules` and are
/// given a shape by the module that owns them. Every key has a
/// compile-time-known default, so an empty file and a missing file load to
/// the same document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    pub window_bounds: WindowBounds,
    pub theme: ThemeSource,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, Value>,
}

impl StoreDocument {
    /// Rebuild a document from whatever JSON was found on disk.
    ///
    /// Recovery is per key: a key with the wrong shape falls back to its
    /// default and the rest of the document still loads. Top-level keys
    /// outside the schema are ignored here and therefore dropped by the next
    /// save.
    pub(crate) fn from_loose_value(value: Value, origin: &Path) -> Self {
        let Value::Object(mut fields) = value else {
            warn!(
                "Store file {} does not hold a JSON object, starting from defaults",
                origin.display()
            );
            return Self::default();
        };

        let window_bounds = take_key(&mut fields, WINDOW_BOUNDS_KEY, origin);
        let theme = take_key(&mut fields, THEME_KEY, origin);
        let modules = take_key(&mut fields, MODULES_KEY, origin);

        if !fields.is_empty() {
            let unknown = fields.keys().cloned().collect::<Vec<_>>().join(", ");
            warn!(
                "Store file {} carries unknown keys ({unknown}), they will be dropped on the next save",
                origin.display()
            );
        }

        Self {
            window_bounds,
            theme,
            modules,
        }
    }
}

/// Remove `key` from the loose object and decode it, defaulting on absence
/// or shape mismatch.
fn take_key<T>(fields: &mut Map<String, Value>, key: &str, origin: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match fields.remove(key) {
        None => T::default(),
        Some(value) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!(
                    "Store file {} key '{key}' has the wrong shape ({reason}), using the default",
                    origin.display()
                );
                T::default()
            }
        },
    }
}
