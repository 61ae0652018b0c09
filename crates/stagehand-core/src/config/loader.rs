//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, DEFAULT_CATALOG_PATH};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: Config = toml::from_str(&content).map_err(ConfigError::TomlError)?;

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `stagehand.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/stagehand.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.is_file() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A missing file falls back to defaults; a file that exists but does not
/// parse or validate is still an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

/// Resolve the catalog path.
///
/// Precedence: explicit argument (flag or `STAGEHAND_APPS`), then the
/// `catalog` key of the tool config, then `app/config/apps.json`. Relative
/// paths are taken against `base`.
pub fn resolve_catalog_path(explicit: Option<&Path>, config: &Config, base: &Path) -> PathBuf {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.catalog.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));

    let resolved = if chosen.is_absolute() {
        chosen
    } else {
        base.join(chosen)
    };
    if !resolved.exists() {
        warn!(path = %resolved.display(), "catalog file does not exist");
    }
    resolved
}
