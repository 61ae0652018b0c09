//! GitHub Releases integration
//!
//! Talks to the GitHub REST API to manage releases, their assets and the
//! tags behind them.
//!
//! ## Authentication
//!
//! Uses the `GITHUB_TOKEN` or `GH_TOKEN` environment variable unless a token
//! is set in [`GitHubConfig`]. Public repositories can be listed without a
//! token; every mutation requires one.

use crate::error::{RemoteError, Result};
use crate::traits::ReleaseHost;
use crate::types::*;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_UPLOADS_URL: &str = "https://uploads.github.com";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// GitHub connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// Asset upload base URL
    pub uploads_url: String,
    /// Access token; read from the environment when unset
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            uploads_url: DEFAULT_UPLOADS_URL.to_string(),
            token: None,
        }
    }
}

/// Release host backed by the GitHub REST API
pub struct GitHubReleases {
    config: GitHubConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl GitHubReleases {
    /// Create a new GitHub adapter
    pub fn new(mut config: GitHubConfig) -> Result<Self> {
        if config.token.is_none() {
            config.token = Self::load_token();
        }
        if config.token.is_none() {
            warn!("no GitHub token found; only read access to public repositories will work");
        }

        let client = Client::builder()
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    /// Load token from the environment
    fn load_token() -> Option<String> {
        for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.trim().is_empty() {
                    debug!(var, "loaded GitHub token from environment");
                    return Some(token.trim().to_string());
                }
            }
        }
        None
    }

    fn api(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.config.api_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            path
        )
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, concat!("stagehand/", env!("CARGO_PKG_VERSION")));
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn require_token(&self) -> Result<()> {
        if self.config.token.is_none() {
            return Err(RemoteError::AuthenticationFailed(
                "set GITHUB_TOKEN or GH_TOKEN to modify releases".to_string(),
            ));
        }
        Ok(())
    }

    /// Turn a non-success response into an API error
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(text);

        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::AuthenticationFailed(message));
        }

        Err(RemoteError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_paged<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .request(self.client.get(url))
                .query(&[("per_page", PAGE_SIZE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<T> = Self::check(response).await?.json().await?;
            let done = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait::async_trait]
impl ReleaseHost for GitHubReleases {
    fn name(&self) -> &str {
        "github"
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<Release>> {
        let releases: Vec<Release> = self.get_paged(&self.api(repo, "/releases")).await?;
        debug!(count = releases.len(), "listed releases");
        Ok(releases)
    }

    #[instrument(skip(self, notes), fields(repo = %repo))]
    async fn create_release(
        &self,
        repo: &RepoRef,
        tag: &str,
        title: &str,
        notes: &str,
    ) -> Result<Release> {
        self.require_token()?;
        let body = CreateReleaseBody {
            tag_name: tag,
            name: title,
            body: notes,
        };
        let response = self
            .request(self.client.post(self.api(repo, "/releases")))
            .json(&body)
            .send()
            .await?;
        let release: Release = Self::check(response).await?.json().await?;
        info!(id = release.id, tag, "created release");
        Ok(release)
    }

    #[instrument(skip(self, release), fields(repo = %repo, tag = %release.tag_name))]
    async fn list_assets(&self, repo: &RepoRef, release: &Release) -> Result<Vec<ReleaseAsset>> {
        let url = self.api(repo, &format!("/releases/{}/assets", release.id));
        self.get_paged(&url).await
    }

    #[instrument(skip(self, release), fields(repo = %repo, tag = %release.tag_name))]
    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        path: &Path,
        name: &str,
    ) -> Result<ReleaseAsset> {
        self.require_token()?;

        // The API rejects duplicate names, so clobber first
        let existing = self.list_assets(repo, release).await?;
        if let Some(old) = existing.iter().find(|a| a.name == name) {
            debug!(asset = name, "replacing existing asset");
            self.delete_asset(repo, release, old).await?;
        }

        let (body, size) = upload_body(path).await?;
        let url = format!(
            "{}/repos/{}/{}/releases/{}/assets",
            self.config.uploads_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            release.id
        );

        let response = self
            .request(self.client.post(url))
            .query(&[("name", name)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await?;
        let asset: ReleaseAsset = Self::check(response).await?.json().await?;
        info!(asset = name, size, "uploaded asset");
        Ok(asset)
    }

    #[instrument(skip(self, asset), fields(repo = %repo, asset = %asset.name))]
    async fn download_asset(
        &self,
        repo: &RepoRef,
        asset: &ReleaseAsset,
        dest: &Path,
    ) -> Result<()> {
        let url = self.api(repo, &format!("/releases/assets/{}", asset.id));
        let response = self
            .request(self.client.get(url))
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await?;
        let mut response = Self::check(response).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut size = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            size += chunk.len();
        }
        file.flush().await?;
        debug!(dest = %dest.display(), size, "downloaded asset");
        Ok(())
    }

    #[instrument(skip(self, release), fields(repo = %repo, tag = %release.tag_name))]
    async fn delete_release(&self, repo: &RepoRef, release: &Release) -> Result<()> {
        self.require_token()?;
        let url = self.api(repo, &format!("/releases/{}", release.id));
        let response = self.request(self.client.delete(url)).send().await?;
        Self::check(response).await?;
        info!("deleted release");
        Ok(())
    }

    #[instrument(skip(self, release, asset), fields(repo = %repo, tag = %release.tag_name, asset = %asset.name))]
    async fn delete_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<()> {
        self.require_token()?;
        let url = self.api(repo, &format!("/releases/assets/{}", asset.id));
        let response = self.request(self.client.delete(url)).send().await?;
        Self::check(response).await?;
        info!("deleted asset");
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn delete_tag(&self, repo: &RepoRef, tag: &str) -> Result<()> {
        self.require_token()?;
        let url = self.api(repo, &format!("/git/refs/tags/{}", tag));
        let response = self.request(self.client.delete(url)).send().await?;
        Self::check(response).await?;
        info!(tag, "deleted tag");
        Ok(())
    }
}

/// Open an artifact as a streamed request body, with its length
async fn upload_body(path: &Path) -> Result<(Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    Ok((Body::from(file), size))
}
