//! Shared types for remote adapters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A hosted repository, addressed as `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoRef {
    /// Create a new repository reference
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A release as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Host-assigned release identifier
    pub id: u64,
    /// Tag the release is attached to
    pub tag_name: String,
    /// Release title
    #[serde(default)]
    pub name: Option<String>,
    /// Attached assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Find an attached asset by file name
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// A file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Host-assigned asset identifier
    pub id: u64,
    /// File name
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// A remote mutation captured instead of executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedMutation {
    CreateRelease {
        repo: String,
        tag: String,
        title: String,
    },
    UploadAsset {
        repo: String,
        tag: String,
        name: String,
        path: PathBuf,
    },
    DeleteRelease {
        repo: String,
        tag: String,
    },
    DeleteAsset {
        repo: String,
        tag: String,
        name: String,
    },
    DeleteTag {
        repo: String,
        tag: String,
    },
}

impl fmt::Display for PlannedMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateRelease { repo, tag, title } => {
                write!(f, "create release {} on {} (\"{}\")", tag, repo, title)
            }
            Self::UploadAsset {
                repo,
                tag,
                name,
                path,
            } => write!(
                f,
                "upload {} as {} to {}@{}",
                path.display(),
                name,
                repo,
                tag
            ),
            Self::DeleteRelease { repo, tag } => write!(f, "delete release {} on {}", tag, repo),
            Self::DeleteAsset { repo, tag, name } => {
                write!(f, "delete asset {} from {}@{}", name, repo, tag)
            }
            Self::DeleteTag { repo, tag } => write!(f, "delete tag {} on {}", tag, repo),
        }
    }
}

/// An outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// Sender, either `addr` or `Name <addr>`
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text body
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_full_name() {
        let repo = RepoRef::new("octo", "boochat");
        assert_eq!(repo.full_name(), "octo/boochat");
        assert_eq!(repo.to_string(), "octo/boochat");
    }

    #[test]
    fn test_release_asset_lookup() {
        let release = Release {
            id: 1,
            tag_name: "v1.0.0.alpha".to_string(),
            name: None,
            assets: vec![ReleaseAsset {
                id: 7,
                name: "boochat-alpha.1.apk".to_string(),
                size: 10,
            }],
        };
        assert_eq!(release.asset("boochat-alpha.1.apk").map(|a| a.id), Some(7));
        assert!(release.asset("boochat-alpha.2.apk").is_none());
    }

    #[test]
    fn test_planned_mutation_display() {
        let m = PlannedMutation::DeleteAsset {
            repo: "octo/boochat".to_string(),
            tag: "v1.0.0.alpha".to_string(),
            name: "boochat-alpha.1.apk".to_string(),
        };
        assert_eq!(
            m.to_string(),
            "delete asset boochat-alpha.1.apk from octo/boochat@v1.0.0.alpha"
        );
    }
}
