//! End-to-end shell bootstrap tests.
//!
//! These run the real wiring: temp data directory, real store file, real
//! bridge server on an ephemeral port, typed surface as the presentation
//! side.

use rivulet::shell::{bootstrap, publish_argv_links};

use host_core::bridge::BridgeSurface;
use host_core::protocol::LinkValue;

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// **VALUE**: Verifies a bootstrapped shell serves the bridge with the
/// access pair it hands out.
///
/// **WHY THIS MATTERS**: This is the exact startup path `main` runs. If
/// bootstrap wires the port, token, or context together wrongly, every
/// presentation feature is dead on arrival.
#[tokio::test]
async fn given_bootstrapped_shell_when_surface_connects_then_bridge_serves_it() {
    let data_dir = tempfile::tempdir().expect("temp dir should be creatable");
    let shell = bootstrap(data_dir.path(), 0)
        .await
        .expect("the shell should bootstrap");

    let surface = BridgeSurface::connect(shell.access.port(), shell.access.auth_token())
        .await
        .expect("the access pair should open the bridge");

    let properties = surface
        .app_properties()
        .await
        .expect("the call should succeed");
    assert_eq!(properties.name, "rivulet");
    assert_eq!(properties.version, env!("CARGO_PKG_VERSION"));
}

/// **VALUE**: Verifies bootstrap seeds the canonical feature modules into
/// the store with their documented defaults.
#[tokio::test]
async fn given_bootstrapped_shell_when_store_read_then_canonical_modules_seeded() {
    let data_dir = tempfile::tempdir().expect("temp dir should be creatable");
    let shell = bootstrap(data_dir.path(), 0)
        .await
        .expect("the shell should bootstrap");

    assert_eq!(shell.modules.sidebar.read().await.width, 300);
    assert_eq!(shell.modules.theme.read().await.name, "dark");
    assert_eq!(shell.modules.library.read().await.sorting, "recent");

    let store = &shell.context.store;
    assert!(store.module_slice("sidebar").await.is_some());
    assert!(store.module_slice("theme").await.is_some());
    assert!(store.module_slice("library").await.is_some());
}

/// **VALUE**: Verifies an argv deep link reaches a connected subscriber
/// while foreign and non-URL arguments are dropped.
///
/// **WHY THIS MATTERS**: The OS delivers deep links to a running instance
/// through a fresh argv; this is the only path an external `rivulet://`
/// URL takes into the presentation process.
#[tokio::test]
async fn given_argv_deep_link_when_published_then_subscriber_receives_it() {
    let data_dir = tempfile::tempdir().expect("temp dir should be creatable");
    let shell = bootstrap(data_dir.path(), 0)
        .await
        .expect("the shell should bootstrap");

    let surface = BridgeSurface::connect(shell.access.port(), shell.access.auth_token())
        .await
        .expect("the surface should connect");
    // Let the server's event subscription for this connection settle.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let _subscription = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link);
    });

    let argv = [
        "--start-hidden".to_string(),
        "https://example.com/not-ours".to_string(),
        "rivulet://auth/callback?code=xyz".to_string(),
    ];
    publish_argv_links(&shell, argv.into_iter());
    tokio::time::sleep(Duration::from_millis(150)).await;

    let received = received.lock().expect("poisoned");
    assert_eq!(received.len(), 1, "only the rivulet:// url may be published");
    assert_eq!(received[0].method, "auth/callback");
    assert_eq!(
        received[0].payload.get("code"),
        Some(&LinkValue::Text("xyz".to_string()))
    );
}
