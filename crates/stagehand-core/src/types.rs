//! Core types for Stagehand

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Lifecycle phase of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Alpha,
    Beta,
    Rc,
    Pre,
    Release,
}

impl Stage {
    /// All stages in display order
    pub const ALL: [Stage; 5] = [
        Stage::Alpha,
        Stage::Beta,
        Stage::Rc,
        Stage::Pre,
        Stage::Release,
    ];

    /// Returns the string representation of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Rc => "rc",
            Self::Pre => "pre",
            Self::Release => "release",
        }
    }

    /// Display group the stage belongs to
    pub fn group(&self) -> StageGroup {
        match self {
            Self::Alpha | Self::Beta => StageGroup::Internal,
            Self::Rc | Self::Pre => StageGroup::Public,
            Self::Release => StageGroup::Release,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            "rc" => Ok(Self::Rc),
            "pre" => Ok(Self::Pre),
            "release" => Ok(Self::Release),
            _ => Err(VersionError::UnknownStage(s.to_string())),
        }
    }
}

/// Grouping of stages used when listing apps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageGroup {
    Internal,
    Public,
    Release,
}

impl StageGroup {
    /// Returns the string representation of the group
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Public => "public",
            Self::Release => "release",
        }
    }
}

impl std::fmt::Display for StageGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Separator used between version and stage in a base tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    /// `v1.0.0.alpha`
    #[default]
    Dot,
    /// `v1.0.0-alpha`
    Dash,
}

impl TagStyle {
    /// The separator character
    pub fn separator(&self) -> char {
        match self {
            Self::Dot => '.',
            Self::Dash => '-',
        }
    }

    /// The other style
    pub fn opposite(&self) -> Self {
        match self {
            Self::Dot => Self::Dash,
            Self::Dash => Self::Dot,
        }
    }

    /// Returns the string representation of the style
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Dash => "dash",
        }
    }
}

impl std::fmt::Display for TagStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TagStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "dash" => Ok(Self::Dash),
            _ => Err(format!("Unknown tag style: {}", s)),
        }
    }
}

/// Mobile platform of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Artifact file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Android => "apk",
            Self::Ios => "ipa",
        }
    }

    /// Platform for an artifact extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "apk" => Some(Self::Android),
            "ipa" => Some(Self::Ios),
            _ => None,
        }
    }

    /// Returns the string representation of the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
