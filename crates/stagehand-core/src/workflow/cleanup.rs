//! Release cleanup
//!
//! Compares the releases on the host with what the catalog still
//! references. Every app sharing the repository contributes to the desired
//! state, so one app's cleanup never removes another app's builds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use stagehand_remote::{Release, ReleaseAsset, ReleaseHost, RepoRef};

use crate::asset::{asset_name_for, parse_managed_asset};
use crate::catalog::AppsConfig;
use crate::error::Result;
use crate::tag::{base_tag_of, parse_release_tag};
use crate::types::Platform;

/// Cleanup switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Delete the git tag after its release
    pub delete_tags: bool,
    /// Delete stray managed assets from surviving releases
    pub cleanup_assets: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            delete_tags: true,
            cleanup_assets: true,
        }
    }
}

/// Base tags and asset names the catalog references in one repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    /// Asset names keyed by base tag
    pub assets: BTreeMap<String, BTreeSet<String>>,
}

impl DesiredState {
    /// Collect references from every app publishing to `repo`.
    ///
    /// A record keeps both the asset name it stores and the canonical name
    /// derived from its version, so records that were never normalized do
    /// not cost the release its canonical asset.
    pub fn from_catalog(catalog: &AppsConfig, repo: &RepoRef) -> Self {
        let mut assets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for app in catalog.apps_in_repo(repo) {
            let app_id = app.id.trim();
            for (stage, record) in app.records() {
                let version = record.parsed().filter(|v| v.stage == stage);
                for platform in [Platform::Android, Platform::Ios] {
                    let Some((tag, asset)) = record.platform_asset(platform) else {
                        continue;
                    };
                    if tag.trim().is_empty() {
                        continue;
                    }
                    let names = assets.entry(base_tag_of(tag)).or_default();
                    if !asset.trim().is_empty() {
                        names.insert(asset.trim().to_string());
                    }
                    if let Some(version) = version.as_ref().filter(|_| !app_id.is_empty()) {
                        names.insert(asset_name_for(app_id, version, platform));
                    }
                }
            }
        }
        Self { assets }
    }

    /// Whether a base tag is referenced
    pub fn has_tag(&self, tag: &str) -> bool {
        self.assets.contains_key(tag)
    }

    /// Whether an asset on a base tag is referenced
    pub fn has_asset(&self, tag: &str, asset: &str) -> bool {
        self.assets.get(tag).is_some_and(|names| names.contains(asset))
    }
}

/// Why a release is going away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    /// Per-index tag from before releases were shared per stage
    LegacyIndexedTag,
    /// No catalog record points at it
    Unreferenced,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegacyIndexedTag => write!(f, "legacy indexed tag"),
            Self::Unreferenced => write!(f, "not referenced by the catalog"),
        }
    }
}

/// A release scheduled for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDeletion {
    pub release: Release,
    pub reason: DeleteReason,
}

/// A stray asset on a surviving release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDeletion {
    pub release: Release,
    pub asset: ReleaseAsset,
}

/// Everything a cleanup would delete in one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupPlan {
    pub repo: RepoRef,
    pub releases: Vec<ReleaseDeletion>,
    pub assets: Vec<AssetDeletion>,
    /// Tags that are not version-shaped and were left alone
    pub ignored: Vec<String>,
}

impl CleanupPlan {
    /// Whether there is nothing to delete
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty() && self.assets.is_empty()
    }
}

/// Diff the host's releases against the catalog
pub fn plan_cleanup(
    catalog: &AppsConfig,
    repo: &RepoRef,
    releases: &[Release],
    options: &CleanupOptions,
) -> CleanupPlan {
    let desired = DesiredState::from_catalog(catalog, repo);
    let mut plan = CleanupPlan {
        repo: repo.clone(),
        releases: Vec::new(),
        assets: Vec::new(),
        ignored: Vec::new(),
    };

    for release in releases {
        let Some(tag) = parse_release_tag(&release.tag_name) else {
            debug!(tag = %release.tag_name, "ignoring non-version release");
            plan.ignored.push(release.tag_name.clone());
            continue;
        };

        let reason = if tag.has_index() {
            Some(DeleteReason::LegacyIndexedTag)
        } else if !desired.has_tag(&release.tag_name) {
            Some(DeleteReason::Unreferenced)
        } else {
            None
        };

        if let Some(reason) = reason {
            plan.releases.push(ReleaseDeletion {
                release: release.clone(),
                reason,
            });
            continue;
        }

        if !options.cleanup_assets {
            continue;
        }
        for asset in &release.assets {
            if parse_managed_asset(&asset.name).is_some()
                && !desired.has_asset(&release.tag_name, &asset.name)
            {
                plan.assets.push(AssetDeletion {
                    release: release.clone(),
                    asset: asset.clone(),
                });
            }
        }
    }

    info!(
        repo = %repo,
        releases = plan.releases.len(),
        assets = plan.assets.len(),
        ignored = plan.ignored.len(),
        "cleanup planned"
    );
    plan
}

/// List the repository of `app` and plan its cleanup
pub async fn fetch_cleanup_plan(
    host: &dyn ReleaseHost,
    catalog: &AppsConfig,
    app: &str,
    options: &CleanupOptions,
) -> Result<CleanupPlan> {
    let repo = catalog.app(app)?.github.clone();
    let releases = host.list_releases(&repo).await?;
    Ok(plan_cleanup(catalog, &repo, &releases, options))
}

/// One deletion that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub target: String,
    pub error: String,
}

/// What a cleanup run deleted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted_releases: Vec<String>,
    pub deleted_tags: Vec<String>,
    pub deleted_assets: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Whether every deletion succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, target: String, error: impl fmt::Display) {
        warn!(target = %target, error = %error, "cleanup step failed");
        self.failures.push(CleanupFailure {
            target,
            error: error.to_string(),
        });
    }
}

/// Carry out a plan; failures are collected and the run continues
#[instrument(skip_all, fields(repo = %plan.repo))]
pub async fn execute_cleanup(
    host: &dyn ReleaseHost,
    plan: &CleanupPlan,
    options: &CleanupOptions,
) -> CleanupReport {
    let repo = &plan.repo;
    let mut report = CleanupReport::default();

    for deletion in &plan.releases {
        let tag = &deletion.release.tag_name;
        match host.delete_release(repo, &deletion.release).await {
            Ok(()) => {
                info!(tag = %tag, reason = %deletion.reason, "deleted release");
                report.deleted_releases.push(tag.clone());
            }
            Err(e) => {
                report.fail(format!("release {}", tag), e);
                continue;
            }
        }

        if options.delete_tags {
            match host.delete_tag(repo, tag).await {
                Ok(()) => {
                    info!(tag = %tag, "deleted tag");
                    report.deleted_tags.push(tag.clone());
                }
                Err(e) => report.fail(format!("tag {}", tag), e),
            }
        }
    }

    for deletion in &plan.assets {
        let target = format!("{}@{}", deletion.asset.name, deletion.release.tag_name);
        match host
            .delete_asset(repo, &deletion.release, &deletion.asset)
            .await
        {
            Ok(()) => {
                info!(asset = %target, "deleted asset");
                report.deleted_assets.push(target);
            }
            Err(e) => report.fail(format!("asset {}", target), e),
        }
    }

    report
}
