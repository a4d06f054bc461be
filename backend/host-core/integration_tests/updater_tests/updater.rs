//! Updater tests against a mock distribution feed.

use host_core::bridge::{HostIntegration, RecordingHost};
use host_core::error::update::UpdateError;
use host_core::protocol::UpdateStatus;
use host_core::updater::Updater;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUNNING_VERSION: &str = "1.0.0";
const OFFERED_VERSION: &str = "2.0.0";
const ARTIFACT_NAME: &str = "rivulet-2.0.0.bin";
const ARTIFACT_BODY: &[u8] = b"replacement build bytes";

struct Feed {
    server: MockServer,
    host: Arc<RecordingHost>,
    updater: Arc<Updater>,
    staging_root: TempDir,
}

async fn feed_with_manifest(manifest: serde_json::Value) -> Feed {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
        .mount(&server)
        .await;
    build_feed(server).await
}

async fn build_feed(server: MockServer) -> Feed {
    let staging_root = tempfile::tempdir().expect("temp dir should be creatable");
    let host = Arc::new(RecordingHost::new());
    let updater = Updater::new(
        Url::parse(&server.uri()).expect("feed url"),
        RUNNING_VERSION,
        staging_root.path(),
        Arc::clone(&host) as Arc<dyn HostIntegration>,
    )
    .expect("updater should build");
    Feed {
        server,
        host,
        updater: Arc::new(updater),
        staging_root,
    }
}

fn offered_manifest(sha256: Option<String>) -> serde_json::Value {
    let mut artifact = json!({
        "name": ARTIFACT_NAME,
        "url": ARTIFACT_NAME,
        "size": ARTIFACT_BODY.len(),
    });
    if let Some(digest) = sha256 {
        artifact["sha256"] = json!(digest);
    }
    json!({
        "version": OFFERED_VERSION,
        "notes": "Adds multi-platform chat overlays.",
        "artifacts": [artifact],
    })
}

async fn mount_artifact(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/{ARTIFACT_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARTIFACT_BODY))
        .mount(server)
        .await;
}

/// **VALUE**: Verifies the full happy path: check offers the update,
/// download stages and verifies the artifact, install hands the staged
/// paths to the host.
///
/// **WHY THIS MATTERS**: This is the §8 scenario end to end, against a real
/// HTTP feed. Every transition the bridge exposes to the presentation side
/// runs here in sequence.
#[tokio::test]
async fn given_newer_version_on_feed_when_check_download_install_then_full_flow_succeeds() {
    let digest = hex::encode(Sha256::digest(ARTIFACT_BODY));
    let feed = feed_with_manifest(offered_manifest(Some(digest))).await;
    mount_artifact(&feed.server).await;

    let offered = feed
        .updater
        .check()
        .await
        .expect("the check should succeed")
        .expect("a different version must be offered");
    assert_eq!(offered.version, OFFERED_VERSION);
    assert_eq!(feed.updater.status(), UpdateStatus::Available);

    let staged = feed
        .updater
        .download()
        .await
        .expect("the download should succeed");
    assert_eq!(feed.updater.status(), UpdateStatus::ReadyForInstall);
    assert_eq!(staged.len(), 1);
    assert_eq!(
        staged[0],
        feed.staging_root
            .path()
            .join(OFFERED_VERSION)
            .join(ARTIFACT_NAME)
    );
    let bytes = tokio::fs::read(&staged[0]).await.expect("the staged file");
    assert_eq!(bytes, ARTIFACT_BODY);

    feed.updater.install().expect("the install should succeed");
    let applied = feed.host.applied_updates.lock().expect("poisoned");
    assert_eq!(*applied, vec![staged]);
}

/// **VALUE**: Verifies a feed answering with the running version resolves
/// to `None` and `NotAvailable`.
#[tokio::test]
async fn given_current_version_on_feed_when_checked_then_not_available() {
    let manifest = json!({ "version": RUNNING_VERSION, "artifacts": [] });
    let feed = feed_with_manifest(manifest).await;

    let offered = feed.updater.check().await.expect("the check should succeed");
    assert_eq!(offered, None);
    assert_eq!(feed.updater.status(), UpdateStatus::NotAvailable);
}

/// **VALUE**: Verifies a failing feed settles the machine in `Error` with
/// the HTTP status surfaced.
#[tokio::test]
async fn given_feed_serving_500_when_checked_then_error_status_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let feed = build_feed(server).await;

    let result = feed.updater.check().await;
    assert!(matches!(
        result,
        Err(UpdateError::FeedStatus { status: 500, .. })
    ));
    assert_eq!(feed.updater.status(), UpdateStatus::Error);
}

/// **VALUE**: Verifies a digest mismatch fails the download, settles in
/// `Error`, and removes the staged files.
///
/// **WHY THIS MATTERS**: A corrupt or tampered artifact must never sit on
/// disk looking installable; `install` can only ever see verified files.
#[tokio::test]
async fn given_corrupt_artifact_when_downloaded_then_error_and_staging_removed() {
    let wrong_digest = hex::encode(Sha256::digest(b"some other bytes"));
    let feed = feed_with_manifest(offered_manifest(Some(wrong_digest))).await;
    mount_artifact(&feed.server).await;

    feed.updater
        .check()
        .await
        .expect("the check should succeed");
    let result = feed.updater.download().await;

    assert!(matches!(result, Err(UpdateError::DigestMismatch { .. })));
    assert_eq!(feed.updater.status(), UpdateStatus::Error);
    assert!(
        !feed.staging_root.path().join(OFFERED_VERSION).exists(),
        "failed downloads must not leave staged files behind"
    );
}

/// **VALUE**: Verifies the chosen concurrency policy: a `check()` issued
/// while another is in flight is rejected with `OperationInFlight`, never
/// joined.
///
/// **WHY THIS MATTERS**: §8 requires the policy to be observable and
/// consistent. The slow mock keeps the first check in `Checking` long
/// enough for the second call to hit the gate.
#[tokio::test]
async fn given_check_in_flight_when_checked_again_then_rejected_not_joined() {
    let server = MockServer::start().await;
    let manifest = json!({ "version": RUNNING_VERSION, "artifacts": [] });
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(manifest)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    let feed = build_feed(server).await;

    let updater = Arc::clone(&feed.updater);
    let in_flight = tokio::spawn(async move { updater.check().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(feed.updater.status(), UpdateStatus::Checking);

    let second = feed.updater.check().await;
    assert!(
        matches!(second, Err(UpdateError::OperationInFlight { .. })),
        "a concurrent check must be rejected, got {second:?}"
    );

    let first = in_flight
        .await
        .expect("the in-flight check should finish")
        .expect("the in-flight check should succeed");
    assert_eq!(first, None, "the rejection must not disturb the running check");
    assert_eq!(feed.updater.status(), UpdateStatus::NotAvailable);
}

/// **VALUE**: Verifies a new `check()` from `ReadyForInstall` is accepted
/// and discards the previous offer and staged artifacts.
///
/// **WHY THIS MATTERS**: Update metadata is transient by contract; once a
/// new check begins, nothing from the previous round may leak into it.
#[tokio::test]
async fn given_ready_for_install_when_checked_again_then_previous_round_discarded() {
    let digest = hex::encode(Sha256::digest(ARTIFACT_BODY));
    let feed = feed_with_manifest(offered_manifest(Some(digest))).await;
    mount_artifact(&feed.server).await;

    feed.updater.check().await.expect("first check");
    feed.updater.download().await.expect("download");
    assert_eq!(feed.updater.status(), UpdateStatus::ReadyForInstall);
    assert!(!feed.updater.staged().is_empty());

    let offered = feed
        .updater
        .check()
        .await
        .expect("a check from ReadyForInstall is legal");
    assert!(offered.is_some());
    assert_eq!(feed.updater.status(), UpdateStatus::Available);
    assert!(
        feed.updater.staged().is_empty(),
        "staged artifacts from the previous round must be discarded"
    );
}

/// **VALUE**: Verifies a staged artifact that disappeared from disk fails
/// `install` with a descriptive error instead of handing the host a dead
/// path.
#[tokio::test]
async fn given_staged_artifact_removed_when_install_then_artifact_missing_error() {
    let digest = hex::encode(Sha256::digest(ARTIFACT_BODY));
    let feed = feed_with_manifest(offered_manifest(Some(digest))).await;
    mount_artifact(&feed.server).await;

    feed.updater.check().await.expect("check");
    let staged = feed.updater.download().await.expect("download");
    tokio::fs::remove_file(&staged[0])
        .await
        .expect("removing the staged file");

    let result = feed.updater.install();
    match result {
        Err(UpdateError::ArtifactMissing { path, .. }) => {
            assert_eq!(PathBuf::from(&staged[0]), path);
        }
        other => panic!("expected an artifact-missing error, got {other:?}"),
    }
    assert!(
        feed.host.applied_updates.lock().expect("poisoned").is_empty(),
        "the host must never be asked to install missing files"
    );
}
