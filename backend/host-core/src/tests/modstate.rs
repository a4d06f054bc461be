// Unit tests for the module state synchronizer
// Tests seeding, idempotence, the two save policies, and shape recovery

use crate::modstate::{LibraryState, ModuleStates, SavePolicy, SidebarState};
use crate::store::ConfigStore;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

const STORE_NAME: &str = "modstate-test";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct CounterState {
    count: u32,
}

async fn open_store(dir: &TempDir) -> ConfigStore {
    ConfigStore::open(dir.path(), STORE_NAME).await
}

/// **VALUE**: Verifies first use of a module name seeds the default into
/// the store.
///
/// **WHY THIS MATTERS**: §4.3 says a missing slice is seeded with the
/// default on creation, so the on-disk document always reflects the module
/// set that is actually running.
#[tokio::test]
async fn given_unseen_module_when_created_then_default_is_seeded() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store.clone());

    let state = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await
        .expect("creation should succeed");

    assert_eq!(state.snapshot().await, CounterState { count: 0 });
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 0 }))
    );
}

/// **VALUE**: Verifies creation is idempotent across process lifetimes:
/// creating the same module with the same default twice yields the same
/// persisted content.
///
/// **WHY THIS MATTERS**: §8 names this property outright. A second launch
/// must pick up the stored slice, not re-seed over user changes.
#[tokio::test]
async fn given_module_created_twice_when_store_is_shared_then_persisted_content_is_stable() {
    let dir = tempfile::tempdir().expect("temp dir");

    {
        let store = open_store(&dir).await;
        let modules = ModuleStates::new(store);
        let state = modules
            .create("counter", CounterState::default(), SavePolicy::Explicit)
            .await
            .expect("first creation should succeed");
        state.modify(|s| s.count = 7).await.expect("modify");
        state.save().await.expect("save");
    }

    // A fresh factory over the same store, as a restarted process would have.
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store.clone());
    let state = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await
        .expect("second creation should succeed");

    assert_eq!(
        state.snapshot().await,
        CounterState { count: 7 },
        "the stored slice wins over the default"
    );
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 7 }))
    );
}

/// **VALUE**: Verifies `save()` twice with no intervening mutation leaves
/// the persisted slice unchanged.
#[tokio::test]
async fn given_no_mutation_when_saved_twice_then_slice_unchanged() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store.clone());

    let state = modules
        .create("counter", CounterState { count: 3 }, SavePolicy::Explicit)
        .await
        .expect("creation should succeed");

    state.save().await.expect("first save");
    let first = store.module_slice("counter").await;
    state.save().await.expect("second save");
    let second = store.module_slice("counter").await;

    assert_eq!(first, second);
    assert_eq!(first, Some(json!({ "count": 3 })));
}

/// **VALUE**: Verifies the explicit policy keeps mutations in memory until
/// `save()`.
///
/// **WHY THIS MATTERS**: The `library` module's contract documents exactly
/// this deferral; the policy must actually defer or that contract lies.
#[tokio::test]
async fn given_explicit_policy_when_modified_then_store_unchanged_until_save() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store.clone());

    let state = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await
        .expect("creation should succeed");

    state.modify(|s| s.count = 42).await.expect("modify");
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 0 })),
        "explicit policy must not persist on modify"
    );

    state.save().await.expect("save");
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 42 }))
    );
}

/// **VALUE**: Verifies the on-change policy persists before `modify`
/// resolves.
#[tokio::test]
async fn given_on_change_policy_when_modified_then_store_already_updated() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store.clone());

    let state = modules
        .create("counter", CounterState::default(), SavePolicy::OnChange)
        .await
        .expect("creation should succeed");

    state.modify(|s| s.count = 9).await.expect("modify");
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 9 }))
    );
}

/// **VALUE**: Verifies a wrong-shaped stored slice falls back to the
/// default and reseeds it, without failing the caller.
///
/// **WHY THIS MATTERS**: §4.3's failure mode: treat the bad value as if
/// absent. Surfacing a hard failure would turn one corrupt slice into a
/// broken feature module.
#[tokio::test]
async fn given_wrong_shaped_slice_when_created_then_default_reseeded() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    store
        .set_module_slice("counter", json!({ "count": "many" }))
        .await
        .expect("seeding the bad slice should work");

    let modules = ModuleStates::new(store.clone());
    let state = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await
        .expect("creation must not propagate the shape failure");

    assert_eq!(state.snapshot().await, CounterState { count: 0 });
    assert_eq!(
        store.module_slice("counter").await,
        Some(json!({ "count": 0 })),
        "the default is seeded over the corrupt value"
    );
}

/// **VALUE**: Verifies registering a module name twice on one factory
/// panics.
///
/// **WHY THIS MATTERS**: §4.3 classes a name collision as a programming
/// error, not a runtime recoverable condition. Two live handles to the same
/// slice would silently overwrite each other.
#[tokio::test]
#[should_panic(expected = "registered twice")]
async fn given_name_collision_when_created_then_panics() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store);

    let _first = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await
        .expect("first creation should succeed");
    let _second = modules
        .create("counter", CounterState::default(), SavePolicy::Explicit)
        .await;
}

/// **VALUE**: Verifies the canonical modules carry their documented
/// defaults and policies.
#[tokio::test]
async fn given_canonical_modules_when_created_then_documented_defaults_and_policies() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = open_store(&dir).await;
    let modules = ModuleStates::new(store);

    let sidebar = modules.sidebar().await.expect("sidebar");
    assert_eq!(*sidebar.read().await, SidebarState { width: 300 });
    assert_eq!(sidebar.policy(), SavePolicy::OnChange);

    let theme = modules.theme().await.expect("theme");
    assert_eq!(theme.read().await.name, "dark");
    assert_eq!(theme.policy(), SavePolicy::OnChange);

    let library = modules.library().await.expect("library");
    assert_eq!(
        *library.read().await,
        LibraryState {
            sorting: "recent".to_string()
        }
    );
    assert_eq!(library.policy(), SavePolicy::Explicit);
}
