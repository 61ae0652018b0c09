//! Local artifact discovery and renaming

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::asset::{asset_name_for, platform_of};
use crate::error::{Result, WorkflowError};
use crate::types::Platform;
use crate::version::ParsedVersion;

/// A build artifact found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub platform: Platform,
}

/// Where an artifact goes and what it will be called
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedArtifact {
    pub source: PathBuf,
    pub target: PathBuf,
    pub asset_name: String,
    pub platform: Platform,
}

impl PlannedArtifact {
    /// Whether the file has to move
    pub fn needs_rename(&self) -> bool {
        self.source != self.target
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(pattern: &str) -> String {
    if pattern == "~" || pattern.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), &pattern[1..]);
        }
    }
    pattern.to_string()
}

fn has_glob_meta(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Directory holding every possible match: the components before the first
/// one containing a wildcard
fn literal_prefix(pattern: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(part) = component {
            if has_glob_meta(&part.to_string_lossy()) {
                break;
            }
        }
        prefix.push(component);
    }
    prefix
}

fn build_matcher(patterns: &[PathBuf]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let text = pattern.to_string_lossy();
        let glob = GlobBuilder::new(&text)
            .literal_separator(true)
            .build()
            .map_err(|e| WorkflowError::InvalidPattern {
                pattern: text.to_string(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    Ok(builder.build().map_err(|e| WorkflowError::InvalidPattern {
        pattern: patterns
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        message: e.to_string(),
    })?)
}

/// Find `.apk` and `.ipa` files matching any of `patterns`
///
/// Patterns support `**`, `{a,b}` alternation and a leading `~`; relative
/// patterns are taken against `base`. Other file types are skipped.
pub fn match_files(patterns: &[String], base: &Path) -> Result<Vec<LocalArtifact>> {
    let absolute: Vec<PathBuf> = patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| base.join(expand_home(p)))
        .collect();
    let describe = || patterns.join(", ");

    if absolute.is_empty() {
        return Err(WorkflowError::NoFilesMatched(describe()).into());
    }

    let matcher = build_matcher(&absolute)?;
    let mut found = BTreeSet::new();

    for pattern in &absolute {
        let root = literal_prefix(pattern);
        debug!(pattern = %pattern.display(), root = %root.display(), "walking for artifacts");

        if root.is_file() {
            if matcher.is_match(&root) {
                found.insert(root.clone());
            }
            continue;
        }

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if entry.file_type().is_file() && matcher.is_match(entry.path()) {
                found.insert(entry.path().to_path_buf());
            }
        }
    }

    let artifacts: Vec<LocalArtifact> = found
        .into_iter()
        .filter_map(|path| match platform_of(&path) {
            Some(platform) => Some(LocalArtifact { path, platform }),
            None => {
                debug!(path = %path.display(), "ignoring non-artifact file");
                None
            }
        })
        .collect();

    if artifacts.is_empty() {
        return Err(WorkflowError::NoFilesMatched(describe()).into());
    }

    info!(count = artifacts.len(), "matched artifacts");
    Ok(artifacts)
}

/// Compute canonical names for every artifact before touching anything
///
/// Fails when two artifacts map to the same name or when a different file
/// already occupies a target.
pub fn plan_renames(
    app_id: &str,
    version: &ParsedVersion,
    artifacts: &[LocalArtifact],
) -> Result<Vec<PlannedArtifact>> {
    let mut by_name: BTreeMap<String, Vec<&LocalArtifact>> = BTreeMap::new();
    for artifact in artifacts {
        by_name
            .entry(asset_name_for(app_id, version, artifact.platform))
            .or_default()
            .push(artifact);
    }

    let mut plan = Vec::with_capacity(artifacts.len());
    for (name, sources) in by_name {
        if sources.len() > 1 {
            return Err(WorkflowError::AssetNameCollision {
                sources: sources
                    .iter()
                    .map(|a| a.path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                name,
            }
            .into());
        }

        let artifact = sources[0];
        let target = artifact
            .path
            .parent()
            .map(|dir| dir.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name));

        if target != artifact.path && target.exists() {
            return Err(WorkflowError::AssetNameCollision {
                sources: format!(
                    "{} would replace existing {}",
                    artifact.path.display(),
                    target.display()
                ),
                name,
            }
            .into());
        }

        plan.push(PlannedArtifact {
            source: artifact.path.clone(),
            target,
            asset_name: name,
            platform: artifact.platform,
        });
    }

    plan.sort_by_key(|p| p.platform.as_str());
    Ok(plan)
}

/// Move files to their canonical names
pub fn apply_renames(plan: &[PlannedArtifact]) -> Result<()> {
    for item in plan.iter().filter(|p| p.needs_rename()) {
        std::fs::rename(&item.source, &item.target)?;
        info!(
            from = %item.source.display(),
            to = %item.target.display(),
            "renamed artifact"
        );
    }
    Ok(())
}
