//! Error types for Stagehand

use std::path::PathBuf;
use thiserror::Error;

pub use stagehand_remote::RemoteError;

/// Result type alias using StagehandError
pub type Result<T> = std::result::Result<T, StagehandError>;

/// Main error type for Stagehand operations
#[derive(Debug, Error)]
pub enum StagehandError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Workflow-related errors
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Release host or mail errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// The catalog could not be persisted
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Invalid version format
    #[error(
        "Invalid version format '{0}'. Expected e.g. 1.0.0-alpha.2, 1.0.0.beta.2 or 1.0.0-alpha"
    )]
    InvalidFormat(String),

    /// Unknown stage name
    #[error("Unknown stage '{0}'. Expected one of: alpha, beta, rc, pre, release")]
    UnknownStage(String),
}

/// Workflow-related errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// App not present in the catalog
    #[error("App not found: {0} (matched by id or name)")]
    AppNotFound(String),

    /// The file pattern matched nothing usable
    #[error("No .apk or .ipa files matched: {0}")]
    NoFilesMatched(String),

    /// Invalid file pattern
    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Two artifacts map to one canonical name, or the target is taken
    #[error("Asset name collision on {name}: {sources}")]
    AssetNameCollision { name: String, sources: String },

    /// The repository's tag style cannot be decided automatically
    #[error("Ambiguous tag style for {repo}: {message}. Pass --tag-style dot|dash")]
    TagStyleAmbiguous { repo: String, message: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Step failed
    #[error("Workflow step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    /// User cancelled
    #[error("Operation cancelled by user")]
    Cancelled,
}

impl StagehandError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
