//! Application self-update state machine.
//!
//! One [`Updater`] per process drives the check → download → install
//! sequence against the distribution feed and is the single authority over
//! [`UpdateStatus`]. Transitions:
//!
//! ```text
//! NotChecked ─ check ─▶ Checking ─▶ Available | NotAvailable | Error
//! Available ─ download ─▶ Downloading ─▶ ReadyForInstall | Error
//! ReadyForInstall ─ install ─▶ (process restarts)
//! ```
//!
//! `check` is accepted from every settled state and discards whatever the
//! previous round offered or staged. While a check or download is in
//! flight, further commands are rejected; nothing here retries on its own.
//! Update application is irreversible, so `install` refuses to run from any
//! state but `ReadyForInstall`.

mod feed;

use feed::FeedClient;

use crate::bridge::HostIntegration;
use crate::error::update::UpdateError;
use crate::protocol::{UpdateInfo, UpdateStatus};

use common::ErrorLocation;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};
use url::Url;

#[derive(Default)]
struct Machine {
    status: UpdateStatus,
    offered: Option<UpdateInfo>,
    staged: Vec<PathBuf>,
}

/// Process-wide updater. Shared by reference; all observers read status
/// through [`status`](Updater::status).
pub struct Updater {
    running_version: String,
    feed: FeedClient,
    staging_root: PathBuf,
    host: Arc<dyn HostIntegration>,
    machine: Mutex<Machine>,
}

impl Updater {
    /// Build an updater against `feed_url`, staging downloads under
    /// `staging_root/<version>`.
    pub fn new(
        feed_url: Url,
        running_version: impl Into<String>,
        staging_root: impl Into<PathBuf>,
        host: Arc<dyn HostIntegration>,
    ) -> Result<Self, UpdateError> {
        Ok(Self {
            running_version: running_version.into(),
            feed: FeedClient::new(feed_url)?,
            staging_root: staging_root.into(),
            host,
            machine: Mutex::new(Machine::default()),
        })
    }

    pub fn status(&self) -> UpdateStatus {
        self.lock().status
    }

    /// The update the last check offered, while it is still current.
    pub fn offered(&self) -> Option<UpdateInfo> {
        self.lock().offered.clone()
    }

    /// Paths staged by the last successful download.
    pub fn staged(&self) -> Vec<PathBuf> {
        self.lock().staged.clone()
    }

    /// Query the feed for a newer version.
    ///
    /// Resolves `Ok(Some(info))` and status `Available` when the feed's
    /// version differs from the running one, `Ok(None)` and `NotAvailable`
    /// when they match. A feed or manifest failure settles in `Error` and
    /// surfaces the cause. Issued while a check or download is in flight,
    /// the call is rejected with [`UpdateError::OperationInFlight`] and the
    /// running operation is left alone.
    pub async fn check(&self) -> Result<Option<UpdateInfo>, UpdateError> {
        self.begin_check()?;

        match self.feed.fetch_manifest().await {
            Ok(manifest) if manifest.version == self.running_version => {
                info!(
                    "Update check: running version {} is current",
                    self.running_version
                );
                self.settle(UpdateStatus::NotAvailable, None);
                Ok(None)
            }
            Ok(manifest) => {
                info!(
                    "Update check: version {} offered (running {})",
                    manifest.version, self.running_version
                );
                self.settle(UpdateStatus::Available, Some(manifest.clone()));
                Ok(Some(manifest))
            }
            Err(error) => {
                warn!("Update check failed: {error}");
                self.settle(UpdateStatus::Error, None);
                Err(error)
            }
        }
    }

    /// Fetch and stage the artifacts of the offered update.
    ///
    /// Only legal while the status is `Available`. On success the status is
    /// `ReadyForInstall` and the staged paths are returned; on failure the
    /// machine settles in `Error` and a fresh `check` is required before
    /// another attempt.
    pub async fn download(&self) -> Result<Vec<PathBuf>, UpdateError> {
        let manifest = self.begin_download()?;
        let staging_dir = self.staging_root.join(&manifest.version);

        match self.feed.stage_artifacts(&manifest, &staging_dir).await {
            Ok(staged) => {
                let mut machine = self.lock();
                machine.status = UpdateStatus::ReadyForInstall;
                machine.staged = staged.clone();
                Ok(staged)
            }
            Err(error) => {
                warn!("Update download failed: {error}");
                remove_staging_dir(&staging_dir).await;
                let mut machine = self.lock();
                machine.status = UpdateStatus::Error;
                machine.offered = None;
                machine.staged.clear();
                Err(error)
            }
        }
    }

    /// Hand the staged artifacts to the host for installation.
    ///
    /// Only legal from `ReadyForInstall`. In production the host does not
    /// return; the process is replaced by the restarted application.
    pub fn install(&self) -> Result<(), UpdateError> {
        let staged = {
            let machine = self.lock();
            if machine.status != UpdateStatus::ReadyForInstall {
                return Err(UpdateError::InvalidTransition {
                    operation: "install",
                    status: machine.status.to_string(),
                    location: ErrorLocation::capture(),
                });
            }
            machine.staged.clone()
        };

        for path in &staged {
            if !path.exists() {
                return Err(UpdateError::ArtifactMissing {
                    path: path.clone(),
                    location: ErrorLocation::capture(),
                });
            }
        }

        info!("Installing update with {} artifact(s)", staged.len());
        self.host
            .apply_update(&staged)
            .map_err(|reason| UpdateError::Install {
                reason: reason.to_string(),
                location: ErrorLocation::capture(),
            })
    }

    /// Gate a new check: only a settled machine accepts one, and starting
    /// it drops the previous offer and staged artifacts.
    fn begin_check(&self) -> Result<(), UpdateError> {
        let mut machine = self.lock();
        if !machine.status.is_settled() {
            return Err(UpdateError::OperationInFlight {
                status: machine.status.to_string(),
                location: ErrorLocation::capture(),
            });
        }
        machine.status = UpdateStatus::Checking;
        machine.offered = None;
        machine.staged.clear();
        Ok(())
    }

    /// Gate a download: only legal from `Available`, and the offer must
    /// still be present.
    fn begin_download(&self) -> Result<UpdateInfo, UpdateError> {
        let mut machine = self.lock();
        let offered = match (&machine.status, &machine.offered) {
            (UpdateStatus::Available, Some(offered)) => offered.clone(),
            _ => {
                return Err(UpdateError::InvalidTransition {
                    operation: "download",
                    status: machine.status.to_string(),
                    location: ErrorLocation::capture(),
                });
            }
        };
        machine.status = UpdateStatus::Downloading;
        Ok(offered)
    }

    fn settle(&self, status: UpdateStatus, offered: Option<UpdateInfo>) {
        let mut machine = self.lock();
        machine.status = status;
        machine.offered = offered;
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().expect("updater state poisoned")
    }
}

/// A failed download must not leave half-staged artifacts behind; the next
/// attempt starts from a fresh check anyway.
async fn remove_staging_dir(dir: &std::path::Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(reason) if reason.kind() == std::io::ErrorKind::NotFound => {}
        Err(reason) => warn!(
            "Could not remove staging directory {}: {reason}",
            dir.display()
        ),
    }
}
