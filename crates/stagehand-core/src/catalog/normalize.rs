//! Catalog normalization
//!
//! Rewrites every record to its canonical shape: version string, base tag
//! and asset names. Running it twice changes nothing the second time.

use serde::Serialize;
use tracing::{debug, info};

use stagehand_remote::RepoRef;

use crate::asset::asset_name_for;
use crate::tag::base_tag_of;
use crate::types::{Platform, Stage};

use super::types::{AppEntry, AppsConfig};

/// An asset whose catalog name changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRename {
    pub app_id: String,
    pub repo: RepoRef,
    /// Base tag of the release holding the asset
    pub tag: String,
    pub platform: Platform,
    pub from: String,
    pub to: String,
}

/// What a normalization pass changed
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeReport {
    /// Asset renames, in catalog order
    pub renames: Vec<AssetRename>,
    /// Number of tags rewritten to their base form
    pub retagged: usize,
    /// Number of version strings rewritten to canonical form
    pub reversioned: usize,
}

impl NormalizeReport {
    /// Whether anything changed
    pub fn changed(&self) -> bool {
        !self.renames.is_empty() || self.retagged > 0 || self.reversioned > 0
    }

    fn merge(&mut self, other: NormalizeReport) {
        self.renames.extend(other.renames);
        self.retagged += other.retagged;
        self.reversioned += other.reversioned;
    }
}

/// Normalize every app of the catalog
pub fn normalize_catalog(config: &mut AppsConfig) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for app in &mut config.apps {
        report.merge(normalize_app(app));
    }
    info!(
        renames = report.renames.len(),
        retagged = report.retagged,
        reversioned = report.reversioned,
        "normalized catalog"
    );
    report
}

/// Normalize the records of one app
pub fn normalize_app(app: &mut AppEntry) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let app_id = app.id.trim().to_string();
    if app_id.is_empty() {
        return report;
    }

    for (stage, records) in app.versions.iter_mut() {
        for record in records.iter_mut() {
            // Records filed under the wrong stage are left for the operator
            let Some(version) = record.parsed().filter(|v| v.stage == *stage) else {
                debug!(app = %app_id, version = %record.version, "skipping non-canonical record");
                continue;
            };

            let canonical = version.to_string();
            if record.version != canonical {
                record.version = canonical;
                report.reversioned += 1;
            }

            if let Some(android) = record.android.as_mut() {
                let want = asset_name_for(&app_id, &version, Platform::Android);
                let tag = fix_tag(&mut android.tag, &mut report);
                if android.asset.trim() != want {
                    report.renames.push(rename(
                        &app_id,
                        &app.github,
                        *stage,
                        tag,
                        Platform::Android,
                        &android.asset,
                        &want,
                    ));
                    android.asset = want;
                }
            }

            if let Some(ios) = record.ios.as_mut() {
                let want = asset_name_for(&app_id, &version, Platform::Ios);
                let tag = fix_tag(&mut ios.tag, &mut report);
                if ios.asset.trim() != want {
                    report.renames.push(rename(
                        &app_id,
                        &app.github,
                        *stage,
                        tag,
                        Platform::Ios,
                        &ios.asset,
                        &want,
                    ));
                    ios.asset = want;
                }
            }
        }
    }

    report
}

fn fix_tag(tag: &mut String, report: &mut NormalizeReport) -> String {
    if tag.trim().is_empty() {
        return String::new();
    }
    let base = base_tag_of(tag);
    if *tag != base {
        *tag = base.clone();
        report.retagged += 1;
    }
    base
}

fn rename(
    app_id: &str,
    repo: &RepoRef,
    stage: Stage,
    tag: String,
    platform: Platform,
    from: &str,
    to: &str,
) -> AssetRename {
    debug!(app = app_id, stage = %stage, from, to, "asset rename");
    AssetRename {
        app_id: app_id.to_string(),
        repo: repo.clone(),
        tag,
        platform,
        from: from.trim().to_string(),
        to: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{AndroidAsset, IosAsset, VersionRecord};
    use serde_json::Map;

    fn legacy_app() -> AppEntry {
        let mut app = AppEntry::new("boochat", "BooChat", RepoRef::new("octo", "boochat"));
        let mut record = VersionRecord::new("1.0.0.alpha.2", "2024-01-01", "");
        record.android = Some(AndroidAsset {
            tag: "v1.0.0-alpha.2".to_string(),
            asset: "app-release.apk".to_string(),
            cdn_url: None,
            extra: Map::new(),
        });
        record.ios = Some(IosAsset {
            tag: "v1.0.0-alpha".to_string(),
            asset: "boochat-alpha.2.ipa".to_string(),
            testflight: Some(false),
            extra: Map::new(),
        });
        app.upsert(Stage::Alpha, record);
        app
    }

    #[test]
    fn test_normalize_legacy_record() {
        let mut app = legacy_app();
        let report = normalize_app(&mut app);

        assert!(report.changed());
        assert_eq!(report.reversioned, 1);
        assert_eq!(report.retagged, 1);
        assert_eq!(report.renames.len(), 1);
        assert_eq!(report.renames[0].from, "app-release.apk");
        assert_eq!(report.renames[0].to, "boochat-alpha.2.apk");
        assert_eq!(report.renames[0].tag, "v1.0.0-alpha");

        let record = &app.stage(Stage::Alpha)[0];
        assert_eq!(record.version, "1.0.0-alpha.2");
        let android = record.android.as_ref().unwrap();
        assert_eq!(android.tag, "v1.0.0-alpha");
        assert_eq!(android.asset, "boochat-alpha.2.apk");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut app = legacy_app();
        normalize_app(&mut app);
        let snapshot = app.clone();

        let second = normalize_app(&mut app);
        assert!(!second.changed());
        assert_eq!(app, snapshot);
    }

    #[test]
    fn test_normalize_catalog_merges_reports() {
        let mut config = AppsConfig {
            apps: vec![legacy_app(), legacy_app()],
            ..Default::default()
        };
        config.apps[1].id = "boochat-lite".to_string();

        let report = normalize_catalog(&mut config);
        assert_eq!(report.renames.len(), 3);
        assert_eq!(
            config.apps[1].stage(Stage::Alpha)[0]
                .ios
                .as_ref()
                .unwrap()
                .asset,
            "boochat-lite-alpha.2.ipa"
        );
    }
}
