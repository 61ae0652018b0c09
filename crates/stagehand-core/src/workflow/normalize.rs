//! Bring remote asset names in line with a normalized catalog

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use stagehand_remote::{Release, ReleaseHost, RepoRef};

use crate::catalog::AssetRename;
use crate::error::Result;

/// What happened to one rename on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteRenameStatus {
    /// Copied under the new name and the old asset removed
    Renamed,
    /// Only the canonical asset exists
    AlreadyCanonical,
    /// Neither name exists on the release
    Missing,
    /// The release itself does not exist
    ReleaseMissing,
    Failed(String),
}

/// Outcome for one rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRename {
    pub rename: AssetRename,
    pub status: RemoteRenameStatus,
}

/// Apply catalog renames to release assets
///
/// Each asset is downloaded, uploaded under its canonical name and then
/// deleted. If both names are present the old one is just deleted.
/// Failures are reported per rename and do not stop the run.
#[instrument(skip_all, fields(count = renames.len()))]
pub async fn rename_remote_assets(
    host: &dyn ReleaseHost,
    renames: &[AssetRename],
) -> Result<Vec<RemoteRename>> {
    let scratch = tempfile::tempdir()?;
    let mut releases: BTreeMap<String, Vec<Release>> = BTreeMap::new();
    let mut results = Vec::with_capacity(renames.len());

    for rename in renames {
        let key = rename.repo.full_name();
        if !releases.contains_key(&key) {
            match host.list_releases(&rename.repo).await {
                Ok(list) => {
                    releases.insert(key.clone(), list);
                }
                Err(e) => {
                    warn!(repo = %rename.repo, error = %e, "cannot list releases");
                    results.push(RemoteRename {
                        rename: rename.clone(),
                        status: RemoteRenameStatus::Failed(e.to_string()),
                    });
                    continue;
                }
            }
        }

        let release = releases
            .get(&key)
            .and_then(|list| list.iter().find(|r| r.tag_name == rename.tag));
        let status = match release {
            None => RemoteRenameStatus::ReleaseMissing,
            Some(release) => {
                match rename_one(host, &rename.repo, release, rename, scratch.path()).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(from = %rename.from, to = %rename.to, error = %e, "remote rename failed");
                        RemoteRenameStatus::Failed(e.to_string())
                    }
                }
            }
        };
        debug!(from = %rename.from, to = %rename.to, status = ?status, "remote rename");
        results.push(RemoteRename {
            rename: rename.clone(),
            status,
        });
    }

    Ok(results)
}

async fn rename_one(
    host: &dyn ReleaseHost,
    repo: &RepoRef,
    release: &Release,
    rename: &AssetRename,
    scratch: &std::path::Path,
) -> Result<RemoteRenameStatus> {
    let old = release.asset(&rename.from);
    let new = release.asset(&rename.to);

    match (old, new) {
        (None, Some(_)) => Ok(RemoteRenameStatus::AlreadyCanonical),
        (None, None) => Ok(RemoteRenameStatus::Missing),
        (Some(old), Some(_)) => {
            host.delete_asset(repo, release, old).await?;
            info!(asset = %old.name, tag = %release.tag_name, "removed superseded asset");
            Ok(RemoteRenameStatus::Renamed)
        }
        (Some(old), None) => {
            let local = scratch.join(&rename.to);
            host.download_asset(repo, old, &local).await?;
            host.upload_asset(repo, release, &local, &rename.to).await?;
            host.delete_asset(repo, release, old).await?;
            info!(
                from = %rename.from,
                to = %rename.to,
                tag = %release.tag_name,
                "renamed remote asset"
            );
            Ok(RemoteRenameStatus::Renamed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Platform;
    use crate::workflow::memory::MemoryHost;

    fn repo() -> RepoRef {
        RepoRef::new("octo", "boochat")
    }

    fn rename(tag: &str, from: &str, to: &str) -> AssetRename {
        AssetRename {
            app_id: "boochat".to_string(),
            repo: repo(),
            tag: tag.to_string(),
            platform: Platform::Android,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[tokio::test]
    async fn test_rename_copies_content() {
        let host = MemoryHost::new();
        host.seed(&repo(), "v1.0.0.alpha", &["app-release.apk"]);

        let results = rename_remote_assets(
            &host,
            &[rename("v1.0.0.alpha", "app-release.apk", "boochat-alpha.1.apk")],
        )
        .await
        .unwrap();

        assert_eq!(results[0].status, RemoteRenameStatus::Renamed);
        assert_eq!(
            host.asset_names(&repo(), "v1.0.0.alpha"),
            vec!["boochat-alpha.1.apk"]
        );
        assert_eq!(
            host.content(&repo(), "v1.0.0.alpha", "boochat-alpha.1.apk"),
            Some(b"app-release.apk".to_vec())
        );
    }

    #[tokio::test]
    async fn test_statuses_for_done_missing_and_duplicate() {
        let host = MemoryHost::new();
        host.seed(&repo(), "v1.0.0.alpha", &["boochat-alpha.1.apk"]);
        host.seed(&repo(), "v1.0.0.beta", &["old.apk", "boochat-beta.1.apk"]);

        let results = rename_remote_assets(
            &host,
            &[
                rename("v1.0.0.alpha", "app.apk", "boochat-alpha.1.apk"),
                rename("v1.0.0.alpha", "gone.apk", "boochat-alpha.2.apk"),
                rename("v1.0.0.beta", "old.apk", "boochat-beta.1.apk"),
                rename("v9.0.0.rc", "x.apk", "boochat-rc.1.apk"),
            ],
        )
        .await
        .unwrap();

        let statuses: Vec<_> = results.into_iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                RemoteRenameStatus::AlreadyCanonical,
                RemoteRenameStatus::Missing,
                RemoteRenameStatus::Renamed,
                RemoteRenameStatus::ReleaseMissing,
            ]
        );
        assert_eq!(
            host.asset_names(&repo(), "v1.0.0.beta"),
            vec!["boochat-beta.1.apk"]
        );
    }
}
