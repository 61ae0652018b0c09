//! Tool configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use stagehand_remote::{GitHubConfig, MailConfig};

use crate::types::TagStyle;

/// Settings for the release manager itself (`stagehand.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog location, relative to the working directory
    pub catalog: Option<PathBuf>,

    /// Publish defaults
    pub publish: PublishConfig,

    /// GitHub connection
    pub github: GitHubConfig,

    /// Intake notification delivery
    pub mail: MailSettings,
}

/// Defaults applied to `publish` and `cleanup`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Tag style when the repository has no version tags yet
    pub tag_style: TagStyle,

    /// Run cleanup after publishing
    pub cleanup: bool,

    /// Delete git tags together with releases
    pub cleanup_tag: bool,

    /// Remove stray assets from surviving releases
    pub cleanup_assets: bool,

    /// Normalize the whole catalog before writing it
    pub normalize_assets: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            tag_style: TagStyle::Dot,
            cleanup: true,
            cleanup_tag: true,
            cleanup_assets: true,
            normalize_assets: true,
        }
    }
}

/// Mail delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Mail API endpoint
    pub api_url: String,

    /// Deadline for one notification, in seconds
    pub timeout_secs: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        let mail = MailConfig::default();
        Self {
            api_url: mail.api_url,
            timeout_secs: 10,
        }
    }
}

impl MailSettings {
    /// Adapter configuration; the key comes from the environment
    pub fn to_mail_config(&self) -> MailConfig {
        MailConfig {
            api_url: self.api_url.clone(),
            api_key: None,
        }
    }

    /// Notification deadline
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
