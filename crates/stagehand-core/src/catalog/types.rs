//! Catalog (`apps.json`) types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use stagehand_remote::RepoRef;

use crate::types::{Platform, Stage};
use crate::version::{parse_full_version, ParsedVersion};

/// The whole catalog file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppsConfig {
    /// Apps shown on the site
    #[serde(default)]
    pub apps: Vec<AppEntry>,

    /// Operator settings
    #[serde(default, skip_serializing_if = "Settings::is_unset")]
    pub settings: Settings,

    /// Fields owned by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operator notification settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Where intake notifications go
    #[serde(default)]
    pub email: String,

    /// Sender address for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,

    /// Sender display name for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Nothing configured; such a block is left out of the file
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// One app and its published versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Unique slug, also the asset name prefix
    pub id: String,

    /// Display name
    pub name: String,

    /// Repository hosting the releases
    pub github: RepoRef,

    /// Optional mirror repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitee: Option<RepoRef>,

    /// Version records per stage, newest first
    #[serde(default)]
    pub versions: BTreeMap<Stage, Vec<VersionRecord>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppEntry {
    /// Create an app with no versions
    pub fn new(id: impl Into<String>, name: impl Into<String>, github: RepoRef) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            github,
            gitee: None,
            versions: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Records of one stage, newest first
    pub fn stage(&self, stage: Stage) -> &[VersionRecord] {
        self.versions.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over every record with its stage
    pub fn records(&self) -> impl Iterator<Item = (Stage, &VersionRecord)> {
        self.versions
            .iter()
            .flat_map(|(stage, records)| records.iter().map(move |r| (*stage, r)))
    }
}

/// One published build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// `1.0.0-alpha.2`
    pub version: String,

    /// Publication date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    /// Release notes
    #[serde(default)]
    pub changelog: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidAsset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosAsset>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionRecord {
    /// Create a record without platform assets
    pub fn new(
        version: impl Into<String>,
        date: impl Into<String>,
        changelog: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            date: date.into(),
            changelog: changelog.into(),
            android: None,
            ios: None,
            extra: Map::new(),
        }
    }

    /// Parsed version, when it is in canonical shape
    pub fn parsed(&self) -> Option<ParsedVersion> {
        parse_full_version(&self.version)
    }

    /// Publication date, when parseable
    pub fn date(&self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    /// `(tag, asset)` of a platform, if published for it
    pub fn platform_asset(&self, platform: Platform) -> Option<(&str, &str)> {
        match platform {
            Platform::Android => self
                .android
                .as_ref()
                .map(|a| (a.tag.as_str(), a.asset.as_str())),
            Platform::Ios => self.ios.as_ref().map(|a| (a.tag.as_str(), a.asset.as_str())),
        }
    }

    /// Tags referenced by this record, in platform order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.android
            .as_ref()
            .map(|a| a.tag.as_str())
            .into_iter()
            .chain(self.ios.as_ref().map(|a| a.tag.as_str()))
            .filter(|t| !t.trim().is_empty())
    }
}

/// Android build descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidAsset {
    pub tag: String,
    pub asset: String,

    /// Direct download override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// iOS build descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IosAsset {
    pub tag: String,
    pub asset: String,

    /// Whether testers join through TestFlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testflight: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "apps": [
        {
          "id": "boochat",
          "name": "BooChat",
          "icon": "/icons/boochat.png",
          "github": {"owner": "octo", "repo": "boochat"},
          "versions": {
            "alpha": [
              {
                "version": "1.0.0-alpha.2",
                "date": "2024-05-02",
                "changelog": "fixes",
                "android": {"tag": "v1.0.0.alpha", "asset": "boochat-alpha.2.apk", "cdnUrl": "https://cdn.example.com/a.apk"},
                "ios": {"tag": "v1.0.0.alpha", "asset": "boochat-alpha.2.ipa", "testflight": true}
              }
            ],
            "beta": []
          }
        }
      ],
      "settings": {"email": "ops@example.com", "senderName": "Shelf"}
    }"#;

    #[test]
    fn test_parse_sample() {
        let config: AppsConfig = serde_json::from_str(SAMPLE).unwrap();
        let app = &config.apps[0];
        assert_eq!(app.id, "boochat");
        assert_eq!(app.github.full_name(), "octo/boochat");
        assert_eq!(app.stage(Stage::Alpha).len(), 1);
        assert!(app.stage(Stage::Beta).is_empty());
        assert!(app.stage(Stage::Release).is_empty());

        let record = &app.stage(Stage::Alpha)[0];
        assert_eq!(record.parsed().map(|v| v.index), Some(2));
        assert_eq!(
            record.android.as_ref().and_then(|a| a.cdn_url.as_deref()),
            Some("https://cdn.example.com/a.apk")
        );
        assert_eq!(record.ios.as_ref().and_then(|i| i.testflight), Some(true));
        assert_eq!(config.settings.sender_name.as_deref(), Some("Shelf"));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let config: AppsConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.apps[0].extra.get("icon").and_then(|v| v.as_str()),
            Some("/icons/boochat.png")
        );

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["apps"][0]["icon"], "/icons/boochat.png");
        assert_eq!(
            json["apps"][0]["versions"]["alpha"][0]["android"]["cdnUrl"],
            "https://cdn.example.com/a.apk"
        );
        assert!(json["apps"][0].get("gitee").is_none());
    }

    #[test]
    fn test_record_tags() {
        let config: AppsConfig = serde_json::from_str(SAMPLE).unwrap();
        let record = &config.apps[0].stage(Stage::Alpha)[0];
        let tags: Vec<_> = record.tags().collect();
        assert_eq!(tags, vec!["v1.0.0.alpha", "v1.0.0.alpha"]);
        assert_eq!(
            record.platform_asset(Platform::Ios),
            Some(("v1.0.0.alpha", "boochat-alpha.2.ipa"))
        );
    }

    #[test]
    fn test_unset_settings_are_not_written() {
        let config: AppsConfig = serde_json::from_str(r#"{"apps": []}"#).unwrap();
        assert!(config.settings.is_unset());
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("settings").is_none());

        let config: AppsConfig = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["settings"]["email"], "ops@example.com");
    }
}
