// Unit tests for the config store
// Tests schema defaults, per-key recovery, and read-after-write consistency

use crate::protocol::ThemeSource;
use crate::store::{ConfigStore, WindowBounds};

use serde_json::{Value, json};
use tempfile::TempDir;

const STORE_NAME: &str = "test-store";

fn store_dir() -> TempDir {
    tempfile::tempdir().expect("temp dir should be creatable")
}

fn store_file(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join(format!("{STORE_NAME}.json"))
}

async fn read_document(dir: &TempDir) -> Value {
    let raw = tokio::fs::read_to_string(store_file(dir))
        .await
        .expect("store file should exist");
    serde_json::from_str(&raw).expect("store file should hold valid JSON")
}

/// **VALUE**: Verifies a missing store file loads as the documented
/// defaults.
///
/// **WHY THIS MATTERS**: First launch has no file on disk; every schema key
/// must still answer with its compile-time default, never an absence.
#[tokio::test]
async fn given_no_file_when_opened_then_every_key_answers_its_default() {
    let dir = store_dir();
    let store = ConfigStore::open(dir.path(), STORE_NAME).await;

    assert_eq!(
        store.window_bounds().await,
        WindowBounds {
            width: 1280,
            height: 720
        }
    );
    assert_eq!(store.theme().await, ThemeSource::System);
    assert_eq!(store.module_slice("sidebar").await, None);
}

/// **VALUE**: Verifies an empty document on disk reads as defaults without
/// writing anything back.
///
/// **WHY THIS MATTERS**: §8 pins this scenario down: a `get` is a read,
/// never a disguised migration. A store that rewrites the file on read
/// would clobber a newer process's document in a downgrade scenario.
#[tokio::test]
async fn given_empty_document_when_read_then_defaults_and_no_disk_write() {
    let dir = store_dir();
    tokio::fs::write(store_file(&dir), "{}")
        .await
        .expect("seeding the store file should work");

    let store = ConfigStore::open(dir.path(), STORE_NAME).await;
    assert_eq!(
        store.window_bounds().await,
        WindowBounds {
            width: 1280,
            height: 720
        }
    );

    let raw = tokio::fs::read_to_string(store_file(&dir))
        .await
        .expect("store file should still exist");
    assert_eq!(raw, "{}", "a read must not write to disk");
}

/// **VALUE**: Verifies set-then-get returns the written value and the value
/// is on disk when the set resolves.
///
/// **WHY THIS MATTERS**: §4.2 guarantees a read issued after a resolved
/// write observes that write, durably.
#[tokio::test]
async fn given_resolved_set_when_read_back_then_value_is_durable() {
    let dir = store_dir();
    let store = ConfigStore::open(dir.path(), STORE_NAME).await;

    store
        .set_theme(Some(ThemeSource::Dark))
        .await
        .expect("set_theme should succeed");
    assert_eq!(store.theme().await, ThemeSource::Dark);

    let document = read_document(&dir).await;
    assert_eq!(document["theme"], "dark");

    store
        .set_window_bounds(Some(WindowBounds {
            width: 1600,
            height: 900,
        }))
        .await
        .expect("set_window_bounds should succeed");
    let document = read_document(&dir).await;
    assert_eq!(document["windowBounds"]["width"], 1600);
    assert_eq!(document["windowBounds"]["height"], 900);
}

/// **VALUE**: Verifies clearing a key (`None`) returns it to the schema
/// default.
#[tokio::test]
async fn given_cleared_key_when_read_then_schema_default() {
    let dir = store_dir();
    let store = ConfigStore::open(dir.path(), STORE_NAME).await;

    store
        .set_theme(Some(ThemeSource::Light))
        .await
        .expect("set_theme should succeed");
    store.set_theme(None).await.expect("clearing should succeed");

    assert_eq!(store.theme().await, ThemeSource::System);
    let document = read_document(&dir).await;
    assert_eq!(document["theme"], "system");
}

/// **VALUE**: Verifies a wrong-shaped key falls back to its default while
/// the rest of the document still loads.
///
/// **WHY THIS MATTERS**: §7 classes this as a persistence inconsistency:
/// recovered silently per key, never a hard failure. A single corrupt key
/// must not cost the user every other setting.
#[tokio::test]
async fn given_wrong_shaped_key_when_loaded_then_that_key_defaults_others_survive() {
    let dir = store_dir();
    let document = json!({
        "windowBounds": "not-an-object",
        "theme": "dark",
    });
    tokio::fs::write(store_file(&dir), document.to_string())
        .await
        .expect("seeding the store file should work");

    let store = ConfigStore::open(dir.path(), STORE_NAME).await;
    assert_eq!(store.window_bounds().await, WindowBounds::default());
    assert_eq!(store.theme().await, ThemeSource::Dark, "the intact key must survive");
}

/// **VALUE**: Verifies a file that is not valid JSON at all loads as the
/// default document.
#[tokio::test]
async fn given_unparseable_file_when_opened_then_defaults() {
    let dir = store_dir();
    tokio::fs::write(store_file(&dir), "not json {{{")
        .await
        .expect("seeding the store file should work");

    let store = ConfigStore::open(dir.path(), STORE_NAME).await;
    assert_eq!(store.window_bounds().await, WindowBounds::default());
    assert_eq!(store.theme().await, ThemeSource::System);
}

/// **VALUE**: Verifies unknown top-level keys are sanitized: ignored on
/// load and dropped by the next save.
///
/// **WHY THIS MATTERS**: §6 requires tolerating a document written by a
/// different version rather than crashing on it, and the sanitize policy
/// keeps the file converging back to the schema.
#[tokio::test]
async fn given_unknown_top_level_key_when_next_save_runs_then_key_is_dropped() {
    let dir = store_dir();
    let document = json!({
        "theme": "light",
        "legacyTelemetry": { "enabled": true },
    });
    tokio::fs::write(store_file(&dir), document.to_string())
        .await
        .expect("seeding the store file should work");

    let store = ConfigStore::open(dir.path(), STORE_NAME).await;
    assert_eq!(store.theme().await, ThemeSource::Light);

    store
        .set_theme(Some(ThemeSource::Dark))
        .await
        .expect("set_theme should succeed");

    let document = read_document(&dir).await;
    assert!(
        document.get("legacyTelemetry").is_none(),
        "unknown keys must not survive a save"
    );
    assert_eq!(document["theme"], "dark");
}

/// **VALUE**: Verifies module slices persist under the `modules` namespace
/// and clear cleanly.
#[tokio::test]
async fn given_module_slice_when_set_and_cleared_then_namespace_tracks_it() {
    let dir = store_dir();
    let store = ConfigStore::open(dir.path(), STORE_NAME).await;

    store
        .set_module_slice("sidebar", json!({ "width": 240 }))
        .await
        .expect("setting a slice should succeed");
    assert_eq!(
        store.module_slice("sidebar").await,
        Some(json!({ "width": 240 }))
    );
    let document = read_document(&dir).await;
    assert_eq!(document["modules"]["sidebar"]["width"], 240);

    store
        .clear_module_slice("sidebar")
        .await
        .expect("clearing a slice should succeed");
    assert_eq!(store.module_slice("sidebar").await, None);
}

/// **VALUE**: Verifies a save leaves no temp file behind.
///
/// **BUG THIS CATCHES**: Would catch the atomic-rename dance writing the
/// staging file and forgetting the rename, which would leave reads serving
/// stale data after a restart.
#[tokio::test]
async fn given_completed_save_when_directory_listed_then_no_staging_file() {
    let dir = store_dir();
    let store = ConfigStore::open(dir.path(), STORE_NAME).await;
    store
        .set_theme(Some(ThemeSource::Dark))
        .await
        .expect("set_theme should succeed");

    let staging = store_file(&dir).with_extension("json.tmp");
    assert!(!staging.exists(), "the staging file must be renamed away");
    assert!(store_file(&dir).exists());
}
