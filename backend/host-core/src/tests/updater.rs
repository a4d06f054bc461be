// Unit tests for the updater state machine
// Transition gates only; the feed-facing paths run in the integration suite

use crate::bridge::RecordingHost;
use crate::error::update::UpdateError;
use crate::protocol::UpdateStatus;
use crate::updater::Updater;

use std::sync::Arc;

use url::Url;

/// Feed URL nothing listens on, so a check fails fast with a network error.
const DEAD_FEED: &str = "http://127.0.0.1:9/";

fn updater(staging: &std::path::Path) -> Updater {
    Updater::new(
        Url::parse(DEAD_FEED).expect("feed url"),
        "1.0.0",
        staging,
        Arc::new(RecordingHost::new()),
    )
    .expect("updater should build")
}

/// **VALUE**: Verifies the machine starts in `NotChecked` with nothing
/// offered or staged.
#[tokio::test]
async fn given_fresh_updater_when_inspected_then_not_checked_and_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let updater = updater(dir.path());

    assert_eq!(updater.status(), UpdateStatus::NotChecked);
    assert_eq!(updater.offered(), None);
    assert!(updater.staged().is_empty());
}

/// **VALUE**: Verifies `install()` from `NotChecked` is a contract
/// violation.
///
/// **WHY THIS MATTERS**: Update application is irreversible; §4.4 forbids
/// attempting it from any state but `ReadyForInstall`. This is the exact
/// §8 property: install before check must fail fast.
#[tokio::test]
async fn given_not_checked_when_install_then_invalid_transition() {
    let dir = tempfile::tempdir().expect("temp dir");
    let updater = updater(dir.path());

    let result = updater.install();
    assert!(
        matches!(
            result,
            Err(UpdateError::InvalidTransition {
                operation: "install",
                ..
            })
        ),
        "install from NotChecked must be rejected, got {result:?}"
    );
    assert_eq!(
        updater.status(),
        UpdateStatus::NotChecked,
        "a rejected command must not move the machine"
    );
}

/// **VALUE**: Verifies `download()` without a prior `Available` resolution
/// is a contract violation.
#[tokio::test]
async fn given_not_checked_when_download_then_invalid_transition() {
    let dir = tempfile::tempdir().expect("temp dir");
    let updater = updater(dir.path());

    let result = updater.download().await;
    assert!(matches!(
        result,
        Err(UpdateError::InvalidTransition {
            operation: "download",
            ..
        })
    ));
    assert_eq!(updater.status(), UpdateStatus::NotChecked);
}

/// **VALUE**: Verifies a failed check settles in `Error` and that `Error`
/// is non-terminal: the next check is accepted again.
///
/// **WHY THIS MATTERS**: §4.4 makes `Error` recoverable only through a new
/// `check()`. If `Error` did not settle, the machine would reject every
/// retry as in-flight forever.
#[tokio::test]
async fn given_unreachable_feed_when_checked_then_error_settles_and_recheck_is_accepted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let updater = updater(dir.path());

    let first = updater.check().await;
    assert!(matches!(first, Err(UpdateError::FeedRequest { .. })));
    assert_eq!(updater.status(), UpdateStatus::Error);

    // Still no feed, but the point is the gate: the call must get past
    // OperationInFlight and fail on the network again.
    let second = updater.check().await;
    assert!(
        matches!(second, Err(UpdateError::FeedRequest { .. })),
        "a settled Error must accept the next check, got {second:?}"
    );
}

/// **VALUE**: Verifies `download()` after a failed check is rejected: the
/// offer was discarded when the check errored.
#[tokio::test]
async fn given_error_state_when_download_then_invalid_transition() {
    let dir = tempfile::tempdir().expect("temp dir");
    let updater = updater(dir.path());

    let _ = updater.check().await;
    assert_eq!(updater.status(), UpdateStatus::Error);

    let result = updater.download().await;
    assert!(matches!(
        result,
        Err(UpdateError::InvalidTransition {
            operation: "download",
            ..
        })
    ));
}
