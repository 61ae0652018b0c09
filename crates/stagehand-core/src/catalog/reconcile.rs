//! Pure operations on a loaded catalog
//!
//! Stage lists are kept newest first. Every insertion goes through
//! [`AppEntry::upsert`], which places the record at its sorted position, so
//! readers can take the first element as the latest build without sorting.

use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::debug;

use stagehand_remote::RepoRef;

use crate::error::WorkflowError;
use crate::types::Stage;
use crate::version::{parse_version, ParsedVersion};

use super::types::{AppEntry, AppsConfig, VersionRecord};

impl AppsConfig {
    /// Find an app by id or name (case-insensitive, trimmed)
    pub fn find_app(&self, key: &str) -> Option<&AppEntry> {
        let key = key.trim().to_lowercase();
        self.apps.iter().find(|app| app_matches(app, &key))
    }

    /// Mutable variant of [`find_app`](Self::find_app)
    pub fn find_app_mut(&mut self, key: &str) -> Option<&mut AppEntry> {
        let key = key.trim().to_lowercase();
        self.apps.iter_mut().find(|app| app_matches(app, &key))
    }

    /// Find an app or fail with `AppNotFound`
    pub fn app(&self, key: &str) -> Result<&AppEntry, WorkflowError> {
        self.find_app(key)
            .ok_or_else(|| WorkflowError::AppNotFound(key.to_string()))
    }

    /// Mutable variant of [`app`](Self::app)
    pub fn app_mut(&mut self, key: &str) -> Result<&mut AppEntry, WorkflowError> {
        self.find_app_mut(key)
            .ok_or_else(|| WorkflowError::AppNotFound(key.to_string()))
    }

    /// Apps whose releases live in `repo`
    pub fn apps_in_repo<'a>(&'a self, repo: &'a RepoRef) -> impl Iterator<Item = &'a AppEntry> {
        self.apps.iter().filter(move |app| {
            app.github.owner.eq_ignore_ascii_case(&repo.owner)
                && app.github.repo.eq_ignore_ascii_case(&repo.repo)
        })
    }
}

fn app_matches(app: &AppEntry, key: &str) -> bool {
    app.id.trim().to_lowercase() == key || app.name.trim().to_lowercase() == key
}

impl AppEntry {
    /// Indices already used in a stage, across all release numbers
    pub fn indices(&self, stage: Stage) -> Vec<u32> {
        self.stage(stage)
            .iter()
            .filter_map(VersionRecord::parsed)
            .filter(|v| v.stage == stage)
            .map(|v| v.index)
            .collect()
    }

    /// Find a record by version string (either surface syntax)
    pub fn find_version(&self, stage: Stage, version: &str) -> Option<&VersionRecord> {
        self.stage(stage).iter().find(|r| same_version(&r.version, version))
    }

    /// Insert a record at its sorted position, replacing any record with the
    /// same version. Returns the replaced record.
    pub fn upsert(&mut self, stage: Stage, record: VersionRecord) -> Option<VersionRecord> {
        let list = self.versions.entry(stage).or_default();

        let replaced = list
            .iter()
            .position(|r| same_version(&r.version, &record.version))
            .map(|pos| list.remove(pos));

        let key = recency_key(&record);
        let pos = list
            .iter()
            .position(|r| recency_key(r) < key)
            .unwrap_or(list.len());
        debug!(
            app = %self.id,
            stage = %stage,
            version = %record.version,
            position = pos,
            replaced = replaced.is_some(),
            "upserting version record"
        );
        list.insert(pos, record);

        replaced
    }

    /// Remove a record by version string
    pub fn remove_version(&mut self, stage: Stage, version: &str) -> Option<VersionRecord> {
        let list = self.versions.get_mut(&stage)?;
        let pos = list.iter().position(|r| same_version(&r.version, version))?;
        Some(list.remove(pos))
    }

    /// Stages that have at least one record, in display order
    pub fn active_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| !self.stage(*s).is_empty())
            .collect()
    }

    /// Latest record of a stage (the first element)
    pub fn latest(&self, stage: Stage) -> Option<&VersionRecord> {
        self.stage(stage).first()
    }

    /// Latest record of every active stage
    pub fn latest_per_stage(&self) -> Vec<(Stage, &VersionRecord)> {
        self.active_stages()
            .into_iter()
            .filter_map(|s| self.latest(s).map(|r| (s, r)))
            .collect()
    }
}

/// Two version strings name the same build
fn same_version(a: &str, b: &str) -> bool {
    match (parse_version(a), parse_version(b)) {
        (Ok(va), Ok(vb)) => va == vb,
        _ => a.trim() == b.trim(),
    }
}

/// Ordering key for recency: date, then release number, then index.
/// Records with unparseable parts sort as oldest.
pub fn recency_key(record: &VersionRecord) -> (Option<NaiveDate>, Option<(semver::Version, u32)>) {
    (
        record.date(),
        record.parsed().as_ref().map(ParsedVersion::sort_key),
    )
}

/// Whether a stage list is ordered newest first
pub fn is_newest_first(records: &[VersionRecord]) -> bool {
    records
        .windows(2)
        .all(|w| recency_key(&w[0]).cmp(&recency_key(&w[1])) != Ordering::Less)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppEntry {
        AppEntry::new("boochat", "BooChat", RepoRef::new("octo", "boochat"))
    }

    fn record(version: &str, date: &str) -> VersionRecord {
        VersionRecord::new(version, date, "")
    }

    #[test]
    fn test_find_app_by_id_or_name() {
        let config = AppsConfig {
            apps: vec![app()],
            ..Default::default()
        };
        assert!(config.find_app("BOOCHAT").is_some());
        assert!(config.find_app(" BooChat ").is_some());
        assert!(matches!(
            config.app("other"),
            Err(WorkflowError::AppNotFound(_))
        ));
    }

    #[test]
    fn test_upsert_keeps_newest_first() {
        let mut app = app();
        app.upsert(Stage::Alpha, record("1.0.0-alpha.1", "2024-01-01"));
        app.upsert(Stage::Alpha, record("1.0.0-alpha.3", "2024-03-01"));
        app.upsert(Stage::Alpha, record("1.0.0-alpha.2", "2024-02-01"));

        let versions: Vec<_> = app
            .stage(Stage::Alpha)
            .iter()
            .map(|r| r.version.as_str())
            .collect();
        assert_eq!(versions, vec!["1.0.0-alpha.3", "1.0.0-alpha.2", "1.0.0-alpha.1"]);
        assert!(is_newest_first(app.stage(Stage::Alpha)));
    }

    #[test]
    fn test_upsert_same_day_orders_by_index() {
        let mut app = app();
        app.upsert(Stage::Beta, record("1.0.0-beta.1", "2024-01-01"));
        app.upsert(Stage::Beta, record("1.0.0-beta.2", "2024-01-01"));
        assert_eq!(app.latest(Stage::Beta).unwrap().version, "1.0.0-beta.2");
        assert!(is_newest_first(app.stage(Stage::Beta)));
    }

    #[test]
    fn test_upsert_replaces_same_version() {
        let mut app = app();
        app.upsert(Stage::Alpha, record("1.0.0-alpha.1", "2024-01-01"));
        app.upsert(Stage::Alpha, record("1.0.0-alpha.2", "2024-01-02"));
        let replaced = app.upsert(Stage::Alpha, record("1.0.0.alpha.1", "2024-02-01"));

        assert!(replaced.is_some());
        assert_eq!(app.stage(Stage::Alpha).len(), 2);
        assert_eq!(app.latest(Stage::Alpha).unwrap().version, "1.0.0.alpha.1");
        assert!(is_newest_first(app.stage(Stage::Alpha)));
    }

    #[test]
    fn test_indices_and_removal() {
        let mut app = app();
        for v in ["1.0.0-alpha.1", "1.0.0-alpha.2", "1.1.0-alpha.4"] {
            app.upsert(Stage::Alpha, record(v, "2024-01-01"));
        }
        let mut indices = app.indices(Stage::Alpha);
        indices.sort();
        assert_eq!(indices, vec![1, 2, 4]);

        assert!(app.remove_version(Stage::Alpha, "1.0.0.alpha.2").is_some());
        assert!(app.find_version(Stage::Alpha, "1.0.0-alpha.2").is_none());
        assert!(app.remove_version(Stage::Rc, "1.0.0-rc.1").is_none());
    }

    #[test]
    fn test_active_stages_and_latest() {
        let mut app = app();
        app.upsert(Stage::Release, record("1.0.0-release.1", "2024-05-01"));
        app.upsert(Stage::Alpha, record("1.1.0-alpha.1", "2024-06-01"));
        app.versions.insert(Stage::Beta, Vec::new());

        assert_eq!(app.active_stages(), vec![Stage::Alpha, Stage::Release]);
        let latest = app.latest_per_stage();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].1.version, "1.1.0-alpha.1");
    }

    #[test]
    fn test_apps_in_repo() {
        let other = AppEntry::new("other", "Other", RepoRef::new("octo", "other"));
        let mut twin = app();
        twin.id = "boochat-lite".to_string();
        let config = AppsConfig {
            apps: vec![app(), other, twin],
            ..Default::default()
        };
        let repo = RepoRef::new("Octo", "BooChat");
        let ids: Vec<_> = config.apps_in_repo(&repo).map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["boochat", "boochat-lite"]);
    }
}
