//! Catalog file loading and saving

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::layout::align_to;
use super::types::AppsConfig;

/// Load the catalog from a JSON file
pub fn load_catalog(path: &Path) -> Result<AppsConfig> {
    info!(path = %path.display(), "loading catalog");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AppsConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(apps = config.apps.len(), "catalog loaded");
    Ok(config)
}

/// Render the catalog the way it is stored: 2-space JSON, trailing newline
pub fn render_catalog(config: &AppsConfig) -> Result<String> {
    render_catalog_over(config, None)
}

/// Render the catalog with the key order of the document it replaces
pub fn render_catalog_over(config: &AppsConfig, previous: Option<&Value>) -> Result<String> {
    let invalid = |e: serde_json::Error| ConfigError::InvalidValue {
        field: "apps".to_string(),
        message: e.to_string(),
    };

    let mut value = serde_json::to_value(config).map_err(invalid)?;
    if let Some(previous) = previous {
        align_to(&mut value, previous);
    }

    let mut content = serde_json::to_string_pretty(&value).map_err(invalid)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    Ok(content)
}

/// Write the catalog, replacing the file only once the new content is on disk
pub fn save_catalog(path: &Path, config: &AppsConfig) -> Result<()> {
    let previous = read_previous(path);
    let content = render_catalog_over(config, previous.as_ref())?;
    let write_failed = |source: std::io::Error| ConfigError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(content.as_bytes()).map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    info!(path = %path.display(), bytes = content.len(), "catalog written");
    Ok(())
}

/// The document currently at `path`, if there is a readable one
fn read_previous(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "previous catalog unreadable, using default layout");
            None
        }
    }
}
