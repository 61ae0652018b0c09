//! Release tag derivation
//!
//! All indices of one app stage share a release, addressed by a base tag
//! such as `v1.0.0.alpha` (dot style) or `v1.0.0-alpha` (dash style).

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::WorkflowError;
use crate::types::{Stage, TagStyle};
use crate::version::ParsedVersion;

static RELEASE_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^v(?P<semver>\d+\.\d+\.\d+)(?P<sep>[.-])(?P<stage>alpha|beta|rc|pre|release)(?:[.-](?P<index>\d+))?$",
    )
    .expect("Invalid regex")
});

/// Base tag for a version under a style
pub fn base_tag(version: &ParsedVersion, style: TagStyle) -> String {
    format!(
        "v{}.{}.{}{}{}",
        version.major,
        version.minor,
        version.patch,
        style.separator(),
        version.stage
    )
}

/// A version-shaped release tag found on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    /// `MAJOR.MINOR.PATCH`
    pub semver: String,
    pub stage: Stage,
    pub style: TagStyle,
    /// Legacy tags carried the build index
    pub index: Option<u32>,
}

impl ReleaseTag {
    /// Whether this is a legacy per-index tag rather than a base tag
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// The base tag this tag belongs to, keeping its separator
    pub fn base(&self) -> String {
        format!("v{}{}{}", self.semver, self.style.separator(), self.stage)
    }
}

/// Recognize a version-shaped tag; anything else is not managed by us
pub fn parse_release_tag(tag: &str) -> Option<ReleaseTag> {
    let caps = RELEASE_TAG_REGEX.captures(tag.trim())?;
    let style = match caps.name("sep")?.as_str() {
        "-" => TagStyle::Dash,
        _ => TagStyle::Dot,
    };
    let index = match caps.name("index") {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };

    Some(ReleaseTag {
        semver: caps.name("semver")?.as_str().to_string(),
        stage: caps.name("stage")?.as_str().parse().ok()?,
        style,
        index,
    })
}

/// Normalize any tag form (`1.0.0-alpha`, `v1.0.0.alpha.2`, ...) to its base tag
///
/// Tags that are not version-shaped are returned trimmed and unchanged.
pub fn base_tag_of(tag: &str) -> String {
    let trimmed = tag.trim();
    let prefixed = if trimmed.starts_with('v') {
        trimmed.to_string()
    } else {
        format!("v{}", trimmed)
    };

    match parse_release_tag(&prefixed) {
        Some(parsed) => parsed.base(),
        None => trimmed.to_string(),
    }
}

/// Outcome of looking at a repository's existing tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleSurvey {
    pub dot: bool,
    pub dash: bool,
}

impl StyleSurvey {
    /// Record which styles appear among `tags`
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut survey = Self::default();
        for tag in tags {
            if let Some(parsed) = parse_release_tag(tag) {
                match parsed.style {
                    TagStyle::Dot => survey.dot = true,
                    TagStyle::Dash => survey.dash = true,
                }
            }
        }
        survey
    }
}

/// Decide which style to use for `version` in a repository
///
/// - a single style in use is adopted;
/// - no version tags at all falls back to `explicit`, then `default`;
/// - both styles in use require an explicit choice;
/// - an explicit choice is refused when the same version and stage already
///   exists under the other style.
pub fn resolve_tag_style(
    repo: &str,
    existing_tags: &[String],
    version: &ParsedVersion,
    explicit: Option<TagStyle>,
    default: TagStyle,
) -> Result<TagStyle, WorkflowError> {
    let survey = StyleSurvey::from_tags(existing_tags.iter().map(String::as_str));
    debug!(repo, dot = survey.dot, dash = survey.dash, explicit = ?explicit, "surveyed tag styles");

    if let Some(style) = explicit {
        let clash = base_tag(version, style.opposite());
        if existing_tags.iter().any(|t| t == &clash) {
            return Err(WorkflowError::TagStyleAmbiguous {
                repo: repo.to_string(),
                message: format!(
                    "{} style requested but release {} already exists",
                    style, clash
                ),
            });
        }
    }

    match (survey.dot, survey.dash) {
        (true, true) => explicit.ok_or_else(|| WorkflowError::TagStyleAmbiguous {
            repo: repo.to_string(),
            message: "both dot-style and dash-style release tags exist".to_string(),
        }),
        (true, false) => Ok(TagStyle::Dot),
        (false, true) => Ok(TagStyle::Dash),
        (false, false) => Ok(explicit.unwrap_or(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(stage: Stage, index: u32) -> ParsedVersion {
        ParsedVersion::new(1, 0, 0, stage, index)
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_base_tag_styles() {
        assert_eq!(base_tag(&v(Stage::Alpha, 2), TagStyle::Dot), "v1.0.0.alpha");
        assert_eq!(base_tag(&v(Stage::Alpha, 2), TagStyle::Dash), "v1.0.0-alpha");
    }

    #[test]
    fn test_base_tag_shared_by_indices() {
        assert_eq!(
            base_tag(&v(Stage::Beta, 1), TagStyle::Dot),
            base_tag(&v(Stage::Beta, 9), TagStyle::Dot)
        );
    }

    #[test]
    fn test_parse_release_tag() {
        let tag = parse_release_tag("v1.2.3-rc").unwrap();
        assert_eq!(tag.semver, "1.2.3");
        assert_eq!(tag.stage, Stage::Rc);
        assert_eq!(tag.style, TagStyle::Dash);
        assert!(!tag.has_index());

        let legacy = parse_release_tag("v1.2.3.rc.4").unwrap();
        assert_eq!(legacy.index, Some(4));
        assert_eq!(legacy.base(), "v1.2.3.rc");

        assert!(parse_release_tag("v1.2.3").is_none());
        assert!(parse_release_tag("nightly").is_none());
    }

    #[test]
    fn test_base_tag_of_keeps_separator() {
        assert_eq!(base_tag_of("v1.0.0.alpha"), "v1.0.0.alpha");
        assert_eq!(base_tag_of("v1.0.0-alpha"), "v1.0.0-alpha");
        assert_eq!(base_tag_of("1.0.0-alpha.2"), "v1.0.0-alpha");
        assert_eq!(base_tag_of(" v1.0.0.alpha.2 "), "v1.0.0.alpha");
        assert_eq!(base_tag_of("nightly"), "nightly");
    }

    #[test]
    fn test_style_adopted_from_repository() {
        let existing = tags(&["v0.9.0-beta", "nightly"]);
        let style =
            resolve_tag_style("o/r", &existing, &v(Stage::Alpha, 1), None, TagStyle::Dot).unwrap();
        assert_eq!(style, TagStyle::Dash);
    }

    #[test]
    fn test_style_default_when_no_tags() {
        let style = resolve_tag_style("o/r", &[], &v(Stage::Alpha, 1), None, TagStyle::Dot).unwrap();
        assert_eq!(style, TagStyle::Dot);
        let style = resolve_tag_style(
            "o/r",
            &[],
            &v(Stage::Alpha, 1),
            Some(TagStyle::Dash),
            TagStyle::Dot,
        )
        .unwrap();
        assert_eq!(style, TagStyle::Dash);
    }

    #[test]
    fn test_both_styles_need_explicit_choice() {
        let existing = tags(&["v0.9.0-beta", "v0.9.1.beta"]);
        let err =
            resolve_tag_style("o/r", &existing, &v(Stage::Alpha, 1), None, TagStyle::Dot).unwrap_err();
        assert!(matches!(err, WorkflowError::TagStyleAmbiguous { .. }));

        let style = resolve_tag_style(
            "o/r",
            &existing,
            &v(Stage::Alpha, 1),
            Some(TagStyle::Dot),
            TagStyle::Dot,
        )
        .unwrap();
        assert_eq!(style, TagStyle::Dot);
    }

    #[test]
    fn test_explicit_style_clashing_with_existing_release() {
        let existing = tags(&["v1.0.0-alpha"]);
        let err = resolve_tag_style(
            "o/r",
            &existing,
            &v(Stage::Alpha, 3),
            Some(TagStyle::Dot),
            TagStyle::Dot,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::TagStyleAmbiguous { .. }));
    }
}
