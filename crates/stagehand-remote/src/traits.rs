//! Remote adapter traits

use crate::error::Result;
use crate::types::*;
use std::path::Path;

/// Operations on a release hosting service
///
/// Releases are addressed by tag and assets by file name; the host is
/// treated as an opaque object store. Implementations exist for the real
/// service and for dry runs that only record what would change.
#[async_trait::async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Get the host name
    fn name(&self) -> &str;

    /// List every release of a repository, assets included
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>>;

    /// Create a release for a tag, creating the tag if needed
    async fn create_release(
        &self,
        repo: &RepoRef,
        tag: &str,
        title: &str,
        notes: &str,
    ) -> Result<Release>;

    /// List assets attached to a release
    async fn list_assets(&self, repo: &RepoRef, release: &Release) -> Result<Vec<ReleaseAsset>>;

    /// Upload a file as a release asset named `name`
    ///
    /// An existing asset with the same name is replaced.
    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        path: &Path,
        name: &str,
    ) -> Result<ReleaseAsset>;

    /// Download an asset to `dest`
    async fn download_asset(&self, repo: &RepoRef, asset: &ReleaseAsset, dest: &Path)
        -> Result<()>;

    /// Delete a release (the tag is left in place)
    async fn delete_release(&self, repo: &RepoRef, release: &Release) -> Result<()>;

    /// Delete a single asset from a release
    async fn delete_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<()>;

    /// Delete a git tag
    async fn delete_tag(&self, repo: &RepoRef, tag: &str) -> Result<()>;

    /// Find a release by exact tag
    async fn find_release(&self, repo: &RepoRef, tag: &str) -> Result<Option<Release>> {
        Ok(self
            .list_releases(repo)
            .await?
            .into_iter()
            .find(|r| r.tag_name == tag))
    }
}

/// Outgoing email delivery
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Get the mailer name
    fn name(&self) -> &str;

    /// Deliver a message
    async fn send(&self, message: &MailMessage) -> Result<()>;
}
