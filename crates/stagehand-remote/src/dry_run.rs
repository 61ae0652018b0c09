//! Dry-run release host
//!
//! Reads are forwarded to an optional inner host so plans reflect the real
//! remote state; every mutation is recorded and logged instead of executed.

use crate::error::Result;
use crate::traits::ReleaseHost;
use crate::types::*;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Release host that records mutations instead of performing them
pub struct DryRunHost {
    inner: Option<Arc<dyn ReleaseHost>>,
    recorded: Mutex<Vec<PlannedMutation>>,
}

impl DryRunHost {
    /// Create a dry-run host that forwards reads to `inner`
    pub fn new(inner: Arc<dyn ReleaseHost>) -> Self {
        Self {
            inner: Some(inner),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Create a dry-run host with no remote; every listing is empty
    pub fn offline() -> Self {
        Self {
            inner: None,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Mutations recorded so far, in call order
    pub fn recorded(&self) -> Vec<PlannedMutation> {
        match self.recorded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, mutation: PlannedMutation) {
        info!(planned = %mutation, "[dry-run]");
        match self.recorded.lock() {
            Ok(mut guard) => guard.push(mutation),
            Err(poisoned) => poisoned.into_inner().push(mutation),
        }
    }
}

#[async_trait::async_trait]
impl ReleaseHost for DryRunHost {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>> {
        match &self.inner {
            Some(inner) => inner.list_releases(repo).await,
            None => {
                debug!(repo = %repo, "offline dry run, no releases listed");
                Ok(Vec::new())
            }
        }
    }

    async fn create_release(
        &self,
        repo: &RepoRef,
        tag: &str,
        title: &str,
        _notes: &str,
    ) -> Result<Release> {
        self.record(PlannedMutation::CreateRelease {
            repo: repo.full_name(),
            tag: tag.to_string(),
            title: title.to_string(),
        });
        Ok(Release {
            id: 0,
            tag_name: tag.to_string(),
            name: Some(title.to_string()),
            assets: Vec::new(),
        })
    }

    async fn list_assets(&self, repo: &RepoRef, release: &Release) -> Result<Vec<ReleaseAsset>> {
        match &self.inner {
            // Releases planned in this run do not exist remotely
            Some(inner) if release.id != 0 => inner.list_assets(repo, release).await,
            _ => Ok(release.assets.clone()),
        }
    }

    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        path: &Path,
        name: &str,
    ) -> Result<ReleaseAsset> {
        self.record(PlannedMutation::UploadAsset {
            repo: repo.full_name(),
            tag: release.tag_name.clone(),
            name: name.to_string(),
            path: path.to_path_buf(),
        });
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Ok(ReleaseAsset {
            id: 0,
            name: name.to_string(),
            size,
        })
    }

    async fn download_asset(
        &self,
        _repo: &RepoRef,
        asset: &ReleaseAsset,
        dest: &Path,
    ) -> Result<()> {
        debug!(asset = %asset.name, dest = %dest.display(), "[dry-run] skipping download");
        Ok(())
    }

    async fn delete_release(&self, repo: &RepoRef, release: &Release) -> Result<()> {
        self.record(PlannedMutation::DeleteRelease {
            repo: repo.full_name(),
            tag: release.tag_name.clone(),
        });
        Ok(())
    }

    async fn delete_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<()> {
        self.record(PlannedMutation::DeleteAsset {
            repo: repo.full_name(),
            tag: release.tag_name.clone(),
            name: asset.name.clone(),
        });
        Ok(())
    }

    async fn delete_tag(&self, repo: &RepoRef, tag: &str) -> Result<()> {
        self.record(PlannedMutation::DeleteTag {
            repo: repo.full_name(),
            tag: tag.to_string(),
        });
        Ok(())
    }
}
