use crate::error::update::UpdateError;
use crate::protocol::{UpdateArtifact, UpdateInfo};

use common::ErrorLocation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::Client;
use sha2::{Digest, Sha256};
use url::Url;

const MANIFEST_FILE_NAME: &str = "latest.json";
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the update distribution feed.
///
/// The feed serves `latest.json` (an [`UpdateInfo`] manifest) at its base
/// URL plus the artifacts the manifest lists. Artifact URLs may be absolute
/// or feed-relative.
pub(crate) struct FeedClient {
    base_url: Url,
    client: Client,
}

impl FeedClient {
    pub fn new(base_url: Url) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .user_agent(crate::UPDATE_USER_AGENT)
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(|source| UpdateError::FeedRequest {
                url: base_url.to_string(),
                source,
                location: ErrorLocation::capture(),
            })?;

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            client,
        })
    }

    /// Fetch and decode the feed's current manifest.
    pub async fn fetch_manifest(&self) -> Result<UpdateInfo, UpdateError> {
        let url = self.resolve(MANIFEST_FILE_NAME).map_err(|reason| {
            UpdateError::ManifestInvalid {
                reason: format!("cannot derive the manifest URL from the feed base: {reason}"),
                location: ErrorLocation::capture(),
            }
        })?;

        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| UpdateError::FeedRequest {
                    url: url.to_string(),
                    source,
                    location: ErrorLocation::capture(),
                })?;

        if !response.status().is_success() {
            return Err(UpdateError::FeedStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
                location: ErrorLocation::capture(),
            });
        }

        let manifest: UpdateInfo =
            response
                .json()
                .await
                .map_err(|reason| UpdateError::ManifestParse {
                    reason: reason.to_string(),
                    location: ErrorLocation::capture(),
                })?;

        if manifest.version.trim().is_empty() {
            return Err(UpdateError::ManifestInvalid {
                reason: "manifest carries an empty version".to_string(),
                location: ErrorLocation::capture(),
            });
        }
        // The version names the staging directory later on.
        if !is_plain_file_name(&manifest.version) {
            return Err(UpdateError::ManifestInvalid {
                reason: format!(
                    "manifest version {:?} is not usable as a directory name",
                    manifest.version
                ),
                location: ErrorLocation::capture(),
            });
        }

        debug!("Update manifest fetched from {url}: version {}", manifest.version);
        Ok(manifest)
    }

    /// Download every artifact of `manifest` into `staging_dir`.
    ///
    /// The staging directory is recreated from scratch, so leftovers from an
    /// earlier attempt never mix in. Digests are verified when the manifest
    /// carries them. Returns the staged paths in manifest order.
    pub async fn stage_artifacts(
        &self,
        manifest: &UpdateInfo,
        staging_dir: &Path,
    ) -> Result<Vec<PathBuf>, UpdateError> {
        if manifest.artifacts.is_empty() {
            return Err(UpdateError::ManifestInvalid {
                reason: format!("manifest {} lists no artifacts", manifest.version),
                location: ErrorLocation::capture(),
            });
        }

        recreate_dir(staging_dir).await?;

        let mut staged = Vec::with_capacity(manifest.artifacts.len());
        for artifact in &manifest.artifacts {
            staged.push(self.stage_one(artifact, staging_dir).await?);
        }

        info!(
            "Staged {} update artifact(s) for {} under {}",
            staged.len(),
            manifest.version,
            staging_dir.display()
        );
        Ok(staged)
    }

    async fn stage_one(
        &self,
        artifact: &UpdateArtifact,
        staging_dir: &Path,
    ) -> Result<PathBuf, UpdateError> {
        // An artifact lands as a plain file inside the staging directory;
        // names that resolve elsewhere are the manifest's fault.
        if !is_plain_file_name(&artifact.name) {
            return Err(UpdateError::ManifestInvalid {
                reason: format!("artifact name {:?} is not a plain file name", artifact.name),
                location: ErrorLocation::capture(),
            });
        }

        let url = self
            .resolve(&artifact.url)
            .map_err(|reason| UpdateError::ArtifactFetch {
                name: artifact.name.clone(),
                reason: reason.to_string(),
                location: ErrorLocation::capture(),
            })?;

        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|reason| UpdateError::ArtifactFetch {
                    name: artifact.name.clone(),
                    reason: reason.to_string(),
                    location: ErrorLocation::capture(),
                })?;

        if !response.status().is_success() {
            return Err(UpdateError::ArtifactFetch {
                name: artifact.name.clone(),
                reason: format!("{url} answered HTTP {}", response.status().as_u16()),
                location: ErrorLocation::capture(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|reason| UpdateError::ArtifactFetch {
                name: artifact.name.clone(),
                reason: reason.to_string(),
                location: ErrorLocation::capture(),
            })?;

        if let Some(expected_size) = artifact.size {
            if bytes.len() as u64 != expected_size {
                return Err(UpdateError::ArtifactFetch {
                    name: artifact.name.clone(),
                    reason: format!(
                        "size mismatch: manifest says {expected_size} bytes, feed sent {}",
                        bytes.len()
                    ),
                    location: ErrorLocation::capture(),
                });
            }
        }

        if let Some(expected) = &artifact.sha256 {
            let actual = hex::encode(Sha256::digest(&bytes));
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(UpdateError::DigestMismatch {
                    name: artifact.name.clone(),
                    expected: expected.clone(),
                    actual,
                    location: ErrorLocation::capture(),
                });
            }
        }

        let path = staging_dir.join(&artifact.name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| UpdateError::Stage {
                path: path.clone(),
                source,
                location: ErrorLocation::capture(),
            })?;

        debug!("Staged {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn resolve(&self, reference: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(reference)
    }
}

/// Remove and recreate a staging directory.
pub(crate) async fn recreate_dir(dir: &Path) -> Result<(), UpdateError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(reason) if reason.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(UpdateError::Stage {
                path: dir.to_path_buf(),
                source,
                location: ErrorLocation::capture(),
            });
        }
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| UpdateError::Stage {
            path: dir.to_path_buf(),
            source,
            location: ErrorLocation::capture(),
        })
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
