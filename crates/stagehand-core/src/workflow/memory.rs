//! In-memory release host for workflow tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use stagehand_remote::{Release, ReleaseAsset, ReleaseHost, RemoteError, RepoRef};

type RemoteResult<T> = stagehand_remote::Result<T>;

#[derive(Default)]
struct State {
    releases: HashMap<String, Vec<Release>>,
    tags: HashMap<String, Vec<String>>,
    contents: HashMap<u64, Vec<u8>>,
    next_id: u64,
    mutations: Vec<String>,
}

/// Release host keeping everything in memory
#[derive(Default)]
pub struct MemoryHost {
    state: Mutex<State>,
    /// Asset names whose deletion fails
    pub fail_deletes: Vec<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a release with managed assets
    pub fn seed(&self, repo: &RepoRef, tag: &str, assets: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let mut release = Release {
            id,
            tag_name: tag.to_string(),
            name: Some(tag.to_string()),
            assets: Vec::new(),
        };
        for name in assets {
            state.next_id += 1;
            let asset_id = state.next_id;
            state.contents.insert(asset_id, name.as_bytes().to_vec());
            release.assets.push(ReleaseAsset {
                id: asset_id,
                name: name.to_string(),
                size: name.len() as u64,
            });
        }
        state
            .releases
            .entry(repo.full_name())
            .or_default()
            .push(release);
        state
            .tags
            .entry(repo.full_name())
            .or_default()
            .push(tag.to_string());
    }

    /// Tags of releases currently present
    pub fn release_tags(&self, repo: &RepoRef) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<_> = state
            .releases
            .get(&repo.full_name())
            .map(|rs| rs.iter().map(|r| r.tag_name.clone()).collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }

    /// Git tags currently present
    pub fn git_tags(&self, repo: &RepoRef) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tags = state.tags.get(&repo.full_name()).cloned().unwrap_or_default();
        tags.sort();
        tags
    }

    /// Asset names on a release
    pub fn asset_names(&self, repo: &RepoRef, tag: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<_> = state
            .releases
            .get(&repo.full_name())
            .and_then(|rs| rs.iter().find(|r| r.tag_name == tag))
            .map(|r| r.assets.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Content stored for an asset
    pub fn content(&self, repo: &RepoRef, tag: &str, name: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        let id = state
            .releases
            .get(&repo.full_name())?
            .iter()
            .find(|r| r.tag_name == tag)?
            .asset(name)?
            .id;
        state.contents.get(&id).cloned()
    }

    /// Every mutation performed, in order
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    fn with_release<T>(
        &self,
        repo: &RepoRef,
        id: u64,
        f: impl FnOnce(&mut State, usize) -> T,
    ) -> RemoteResult<T> {
        let mut state = self.state.lock().unwrap();
        let pos = state
            .releases
            .get(&repo.full_name())
            .and_then(|rs| rs.iter().position(|r| r.id == id))
            .ok_or_else(|| RemoteError::ReleaseNotFound(id.to_string()))?;
        Ok(f(&mut state, pos))
    }
}

#[async_trait::async_trait]
impl ReleaseHost for MemoryHost {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_releases(&self, repo: &RepoRef) -> RemoteResult<Vec<Release>> {
        let state = self.state.lock().unwrap();
        Ok(state.releases.get(&repo.full_name()).cloned().unwrap_or_default())
    }

    async fn create_release(
        &self,
        repo: &RepoRef,
        tag: &str,
        title: &str,
        _notes: &str,
    ) -> RemoteResult<Release> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let release = Release {
            id: state.next_id,
            tag_name: tag.to_string(),
            name: Some(title.to_string()),
            assets: Vec::new(),
        };
        state
            .releases
            .entry(repo.full_name())
            .or_default()
            .push(release.clone());
        let tags = state.tags.entry(repo.full_name()).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
        state.mutations.push(format!("create {}", tag));
        Ok(release)
    }

    async fn list_assets(
        &self,
        repo: &RepoRef,
        release: &Release,
    ) -> RemoteResult<Vec<ReleaseAsset>> {
        self.with_release(repo, release.id, |state, pos| {
            state.releases[&repo.full_name()][pos].assets.clone()
        })
    }

    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        path: &Path,
        name: &str,
    ) -> RemoteResult<ReleaseAsset> {
        let bytes = std::fs::read(path)?;
        self.with_release(repo, release.id, |state, pos| {
            state.next_id += 1;
            let asset = ReleaseAsset {
                id: state.next_id,
                name: name.to_string(),
                size: bytes.len() as u64,
            };
            state.contents.insert(asset.id, bytes);
            let release = &mut state.releases.get_mut(&repo.full_name()).unwrap()[pos];
            release.assets.retain(|a| a.name != name);
            release.assets.push(asset.clone());
            state.mutations.push(format!("upload {}", name));
            asset
        })
    }

    async fn download_asset(
        &self,
        _repo: &RepoRef,
        asset: &ReleaseAsset,
        dest: &Path,
    ) -> RemoteResult<()> {
        let bytes = {
            let state = self.state.lock().unwrap();
            state
                .contents
                .get(&asset.id)
                .cloned()
                .ok_or_else(|| RemoteError::AssetNotFound(asset.name.clone()))?
        };
        std::fs::write(dest, bytes)?;
        Ok(())
    }

    async fn delete_release(&self, repo: &RepoRef, release: &Release) -> RemoteResult<()> {
        self.with_release(repo, release.id, |state, pos| {
            state.releases.get_mut(&repo.full_name()).unwrap().remove(pos);
            state.mutations.push(format!("delete release {}", release.tag_name));
        })
    }

    async fn delete_asset(
        &self,
        repo: &RepoRef,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> RemoteResult<()> {
        if self.fail_deletes.contains(&asset.name) {
            return Err(RemoteError::ApiError {
                status: 500,
                message: format!("cannot delete {}", asset.name),
            });
        }
        self.with_release(repo, release.id, |state, pos| {
            state.releases.get_mut(&repo.full_name()).unwrap()[pos]
                .assets
                .retain(|a| a.id != asset.id);
            state.mutations.push(format!("delete asset {}", asset.name));
        })
    }

    async fn delete_tag(&self, repo: &RepoRef, tag: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(tags) = state.tags.get_mut(&repo.full_name()) {
            tags.retain(|t| t != tag);
        }
        state.mutations.push(format!("delete tag {}", tag));
        Ok(())
    }
}
