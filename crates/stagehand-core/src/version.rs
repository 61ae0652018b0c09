//! Version identifier parsing
//!
//! Accepts `MAJOR.MINOR.PATCH-STAGE[.INDEX]` and `MAJOR.MINOR.PATCH.STAGE[.INDEX]`
//! (a leading `v` and `-` before the index are tolerated). An omitted index is
//! reported as auto-index and resolved against the catalog by the caller.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::VersionError;
use crate::types::Stage;

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)[.-](?P<stage>alpha|beta|rc|pre|release)(?:[.-](?P<index>\d+))?$",
    )
    .expect("Invalid regex")
});

/// A version as typed by the operator; the index may be left to the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRequest {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub stage: Stage,
    /// `None` means "next free index"
    pub index: Option<u32>,
}

impl VersionRequest {
    /// Resolve the index: explicit wins, otherwise `max(existing) + 1`, or 1
    pub fn resolve(self, existing: impl IntoIterator<Item = u32>) -> ParsedVersion {
        let index = match self.index {
            Some(index) => index,
            None => next_index(existing),
        };
        ParsedVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            stage: self.stage,
            index,
        }
    }

    /// Whether the index must be assigned automatically
    pub fn is_auto_index(&self) -> bool {
        self.index.is_none()
    }
}

/// A fully resolved version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub stage: Stage,
    pub index: u32,
}

impl ParsedVersion {
    /// Create a resolved version
    pub fn new(major: u64, minor: u64, patch: u64, stage: Stage, index: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            stage,
            index,
        }
    }

    /// `MAJOR.MINOR.PATCH`
    pub fn semver(&self) -> semver::Version {
        semver::Version::new(self.major, self.minor, self.patch)
    }

    /// Recency ordering key: release number, then index
    pub fn sort_key(&self) -> (semver::Version, u32) {
        (self.semver(), self.index)
    }
}

/// Canonical form written to the catalog: `1.0.0-alpha.2`
impl std::fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}.{}",
            self.major, self.minor, self.patch, self.stage, self.index
        )
    }
}

/// Parse an operator-supplied version string
pub fn parse_version(raw: &str) -> Result<VersionRequest, VersionError> {
    let text = raw.trim();
    let invalid = || VersionError::InvalidFormat(text.to_string());

    let caps = VERSION_REGEX.captures(text).ok_or_else(invalid)?;
    let number = |name: &str| -> Result<u64, VersionError> {
        caps.name(name)
            .ok_or_else(invalid)?
            .as_str()
            .parse()
            .map_err(|_| invalid())
    };

    let stage = caps.name("stage").ok_or_else(invalid)?.as_str().parse()?;
    let index = match caps.name("index") {
        Some(m) => Some(m.as_str().parse::<u32>().map_err(|_| invalid())?),
        None => None,
    };

    Ok(VersionRequest {
        major: number("major")?,
        minor: number("minor")?,
        patch: number("patch")?,
        stage,
        index,
    })
}

/// Parse a version that must carry an explicit index (catalog records)
pub fn parse_full_version(raw: &str) -> Option<ParsedVersion> {
    let request = parse_version(raw).ok()?;
    let index = request.index?;
    Some(request.resolve([index]))
}

/// Next auto-index: one past the highest existing index; gaps are never filled
pub fn next_index(existing: impl IntoIterator<Item = u32>) -> u32 {
    existing
        .into_iter()
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dash_form() {
        let v = parse_version("1.0.0-alpha.2").unwrap();
        assert_eq!(
            v.resolve([]),
            ParsedVersion::new(1, 0, 0, Stage::Alpha, 2)
        );
    }

    #[test]
    fn test_both_forms_are_equivalent() {
        for (dash, dot) in [
            ("1.0.0-alpha.2", "1.0.0.alpha.2"),
            ("2.13.7-rc.10", "2.13.7.rc.10"),
            ("0.0.1-release.0", "0.0.1.release.0"),
        ] {
            assert_eq!(parse_version(dash).unwrap(), parse_version(dot).unwrap());
        }
    }

    #[test]
    fn test_stage_is_case_insensitive() {
        let v = parse_version("1.2.3-BETA.4").unwrap();
        assert_eq!(v.stage, Stage::Beta);
        assert_eq!(v.index, Some(4));
    }

    #[test]
    fn test_missing_index_is_auto() {
        let v = parse_version("1.0.0.beta").unwrap();
        assert!(v.is_auto_index());
        assert_eq!(v.resolve([1, 2]).index, 3);
    }

    #[test]
    fn test_auto_index_never_fills_gaps() {
        assert_eq!(next_index([1, 2, 4]), 5);
        assert_eq!(next_index([]), 1);
    }

    #[test]
    fn test_explicit_index_wins() {
        let v = parse_version("1.0.0-alpha.7").unwrap();
        assert_eq!(v.resolve([1, 2, 3]).index, 7);
    }

    #[test]
    fn test_tolerated_prefix_and_separator() {
        assert_eq!(
            parse_version("v1.0.0-alpha-3").unwrap(),
            parse_version("1.0.0.alpha.3").unwrap()
        );
    }

    #[test]
    fn test_invalid_versions() {
        for raw in [
            "",
            "1.0",
            "1.0.0",
            "1.0.0-gamma.1",
            "a.b.c-alpha.1",
            "1.0.0.0-alpha",
            "1.0.0-alpha.x",
            "1.0.0-alpha.99999999999",
        ] {
            assert!(
                matches!(parse_version(raw), Err(VersionError::InvalidFormat(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let v = parse_version("1.0.0.beta.2").unwrap().resolve([]);
        assert_eq!(v.to_string(), "1.0.0-beta.2");
    }

    #[test]
    fn test_parse_full_version_requires_index() {
        assert!(parse_full_version("1.0.0-alpha").is_none());
        assert_eq!(parse_full_version("1.0.0-alpha.1").map(|v| v.index), Some(1));
    }
}
