//! Download links for published builds

use serde::Serialize;

use stagehand_remote::RepoRef;

use crate::types::Platform;

use super::types::{AppEntry, VersionRecord};

/// Where a build can be downloaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub platform: Platform,
    /// Primary URL: the CDN override or the GitHub release asset
    pub url: String,
    /// Gitee mirror, when the app declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<String>,
    /// iOS builds distributed through TestFlight
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub testflight: bool,
}

/// GitHub release asset URL
pub fn github_download_url(repo: &RepoRef, tag: &str, asset: &str) -> String {
    format!(
        "https://github.com/{}/{}/releases/download/{}/{}",
        repo.owner, repo.repo, tag, asset
    )
}

/// Gitee release asset URL
pub fn gitee_download_url(repo: &RepoRef, tag: &str, asset: &str) -> String {
    format!(
        "https://gitee.com/{}/{}/releases/download/{}/{}",
        repo.owner, repo.repo, tag, asset
    )
}

/// Links for every platform a record was published for
pub fn download_links(app: &AppEntry, record: &VersionRecord) -> Vec<DownloadLink> {
    let mut links = Vec::new();

    if let Some(android) = &record.android {
        let url = android
            .cdn_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| github_download_url(&app.github, &android.tag, &android.asset));
        links.push(DownloadLink {
            platform: Platform::Android,
            url,
            mirror: app
                .gitee
                .as_ref()
                .map(|g| gitee_download_url(g, &android.tag, &android.asset)),
            testflight: false,
        });
    }

    if let Some(ios) = &record.ios {
        links.push(DownloadLink {
            platform: Platform::Ios,
            url: github_download_url(&app.github, &ios.tag, &ios.asset),
            mirror: app
                .gitee
                .as_ref()
                .map(|g| gitee_download_url(g, &ios.tag, &ios.asset)),
            testflight: ios.testflight.unwrap_or(false),
        });
    }

    links
}
