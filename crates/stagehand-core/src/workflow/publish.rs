//! Release publishing workflow
//!
//! Steps run in order and stop at the first failure:
//! resolve version, match files, plan renames, resolve tag style, rename
//! files, ensure release, upload assets, update the catalog. Cleanup is a
//! separate workflow the caller runs afterwards with the updated catalog.
//!
//! Everything that can be rejected (bad version, no files, name collision,
//! ambiguous tag style) is checked before the first mutation.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use stagehand_remote::{Release, ReleaseHost, RepoRef};

use crate::catalog::{
    normalize_catalog, AndroidAsset, AppsConfig, IosAsset, NormalizeReport, VersionRecord,
};
use crate::error::{Result, WorkflowError};
use crate::tag::{base_tag, resolve_tag_style};
use crate::types::{Platform, TagStyle};
use crate::version::{parse_version, ParsedVersion};

use super::files::{apply_renames, match_files, plan_renames, PlannedArtifact};

/// Publish pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    ResolveVersion,
    MatchFiles,
    RenameFiles,
    EnsureRelease,
    UploadAssets,
    UpdateConfig,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveVersion => "resolve-version",
            Self::MatchFiles => "match-files",
            Self::RenameFiles => "rename-files",
            Self::EnsureRelease => "ensure-release",
            Self::UploadAssets => "upload-assets",
            Self::UpdateConfig => "update-config",
        };
        f.write_str(name)
    }
}

/// Options for a publish
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// App id or name
    pub app: String,
    /// Version as typed, index optional
    pub version: String,
    /// File patterns
    pub files: Vec<String>,
    /// Release notes; literal `\n` becomes a newline
    pub notes: String,
    /// Publication date, defaults to today
    pub date: Option<String>,
    /// TestFlight flag for iOS builds
    pub ios_testflight: Option<bool>,
    /// Tag style chosen by the operator
    pub tag_style: Option<TagStyle>,
    /// Style for repositories without version tags
    pub default_tag_style: TagStyle,
    /// Normalize the whole catalog after the update
    pub normalize_assets: bool,
    /// Directory relative patterns are resolved against
    pub base_dir: PathBuf,
    /// Skip local renames; the host is expected to record mutations
    pub dry_run: bool,
}

impl PublishOptions {
    /// Create options for an app and version
    pub fn new(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            version: version.into(),
            normalize_assets: true,
            base_dir: PathBuf::from("."),
            ..Default::default()
        }
    }

    /// Add file patterns
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Set the base directory for patterns
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub app_id: String,
    pub repo: RepoRef,
    pub version: String,
    pub tag: String,
    pub tag_style: TagStyle,
    pub release_created: bool,
    pub artifacts: Vec<PlannedArtifact>,
    pub record: VersionRecord,
    /// Whether an existing record for this version was replaced
    pub replaced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizeReport>,
    pub dry_run: bool,
}

/// Literal `\n` sequences become newlines
pub fn unescape_notes(notes: &str) -> String {
    notes.replace("\\n", "\n")
}

/// Execute a publish against a host and an in-memory catalog
pub struct PublishWorkflow<'a> {
    host: &'a dyn ReleaseHost,
    options: PublishOptions,
}

impl<'a> PublishWorkflow<'a> {
    /// Create a new publish workflow
    pub fn new(host: &'a dyn ReleaseHost, options: PublishOptions) -> Self {
        Self { host, options }
    }

    /// Run the pipeline, updating `catalog` in place
    #[instrument(skip_all, fields(app = %self.options.app, version = %self.options.version))]
    pub async fn execute(&self, catalog: &mut AppsConfig) -> Result<PublishOutcome> {
        let opts = &self.options;
        info!(dry_run = opts.dry_run, host = self.host.name(), "executing publish workflow");

        step(PublishStep::ResolveVersion);
        let app = catalog.app(&opts.app)?;
        let app_id = app.id.trim().to_string();
        let app_name = app.name.clone();
        let repo = app.github.clone();
        let request = parse_version(&opts.version)?;
        let version = request.resolve(app.indices(request.stage));
        if request.is_auto_index() {
            info!(version = %version, "assigned next index");
        }
        let date = resolve_date(opts.date.as_deref())?;

        step(PublishStep::MatchFiles);
        let artifacts = match_files(&opts.files, &opts.base_dir)?;
        let plan = plan_renames(&app_id, &version, &artifacts)?;

        let releases = self.host.list_releases(&repo).await?;
        let tags: Vec<String> = releases.iter().map(|r| r.tag_name.clone()).collect();
        let style = resolve_tag_style(
            &repo.full_name(),
            &tags,
            &version,
            opts.tag_style,
            opts.default_tag_style,
        )?;
        let tag = base_tag(&version, style);
        debug!(tag = %tag, style = %style, "tag resolved");

        step(PublishStep::RenameFiles);
        if opts.dry_run {
            for item in plan.iter().filter(|p| p.needs_rename()) {
                info!(
                    from = %item.source.display(),
                    to = %item.target.display(),
                    "[dry-run] would rename"
                );
            }
        } else {
            apply_renames(&plan)?;
        }

        step(PublishStep::EnsureRelease);
        let notes = unescape_notes(&opts.notes);
        let (release, release_created) = self
            .ensure_release(&repo, &releases, &tag, &format!("{} {}", app_name, tag), &notes)
            .await?;

        step(PublishStep::UploadAssets);
        for item in &plan {
            // Dry runs never renamed the file
            let path = if opts.dry_run { &item.source } else { &item.target };
            self.host
                .upload_asset(&repo, &release, path, &item.asset_name)
                .await?;
            info!(asset = %item.asset_name, tag = %tag, "uploaded asset");
        }

        step(PublishStep::UpdateConfig);
        let record = build_record(
            catalog,
            &opts.app,
            &version,
            &tag,
            &date,
            &notes,
            &plan,
            opts.ios_testflight,
        )?;
        let app = catalog.app_mut(&opts.app)?;
        let replaced = app.upsert(version.stage, record.clone()).is_some();
        info!(version = %version, replaced, "catalog record updated");

        let normalized = opts.normalize_assets.then(|| normalize_catalog(catalog));

        Ok(PublishOutcome {
            app_id,
            repo,
            version: version.to_string(),
            tag,
            tag_style: style,
            release_created,
            artifacts: plan,
            record,
            replaced,
            normalized,
            dry_run: opts.dry_run,
        })
    }

    async fn ensure_release(
        &self,
        repo: &RepoRef,
        releases: &[Release],
        tag: &str,
        title: &str,
        notes: &str,
    ) -> Result<(Release, bool)> {
        if let Some(existing) = releases.iter().find(|r| r.tag_name == tag) {
            debug!(tag, id = existing.id, "reusing release");
            return Ok((existing.clone(), false));
        }
        let release = self.host.create_release(repo, tag, title, notes).await?;
        info!(tag, id = release.id, "created release");
        Ok((release, true))
    }
}

fn step(step: PublishStep) {
    debug!(step = %step, "publish step");
}

fn resolve_date(date: Option<&str>) -> Result<String> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                WorkflowError::ValidationFailed(format!("date '{}' is not YYYY-MM-DD", raw))
            })?;
            Ok(parsed.format("%Y-%m-%d").to_string())
        }
        None => Ok(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()),
    }
}

/// New record for the published build; fields other tools added to a
/// replaced record are kept, as is a platform not uploaded this time
#[allow(clippy::too_many_arguments)]
fn build_record(
    catalog: &AppsConfig,
    app_key: &str,
    version: &ParsedVersion,
    tag: &str,
    date: &str,
    notes: &str,
    plan: &[PlannedArtifact],
    ios_testflight: Option<bool>,
) -> Result<VersionRecord> {
    let app = catalog.app(app_key)?;
    let previous = app.find_version(version.stage, &version.to_string());

    let mut record = VersionRecord::new(version.to_string(), date, notes);
    if let Some(previous) = previous {
        record.extra = previous.extra.clone();
        record.android = previous.android.clone();
        record.ios = previous.ios.clone();
    }

    for item in plan {
        match item.platform {
            Platform::Android => {
                record.android = Some(AndroidAsset {
                    tag: tag.to_string(),
                    asset: item.asset_name.clone(),
                    cdn_url: None,
                    extra: record.android.take().map(|a| a.extra).unwrap_or_default(),
                });
            }
            Platform::Ios => {
                if ios_testflight.is_none() {
                    warn!("no TestFlight choice given for iOS build, recording false");
                }
                record.ios = Some(IosAsset {
                    tag: tag.to_string(),
                    asset: item.asset_name.clone(),
                    testflight: Some(ios_testflight.unwrap_or(false)),
                    extra: record.ios.take().map(|a| a.extra).unwrap_or_default(),
                });
            }
        }
    }

    Ok(record)
}
