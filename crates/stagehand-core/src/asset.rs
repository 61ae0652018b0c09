//! Canonical artifact names: `{appId}-{stage}.{index}.{ext}`

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::types::{Platform, Stage};
use crate::version::ParsedVersion;

static MANAGED_ASSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<app>.+)-(?P<stage>alpha|beta|rc|pre|release)\.(?P<index>\d+)\.(?P<ext>apk|ipa)$",
    )
    .expect("Invalid regex")
});

/// Canonical asset name for an app build
pub fn asset_name(app_id: &str, stage: Stage, index: u32, platform: Platform) -> String {
    format!("{}-{}.{}.{}", app_id, stage, index, platform.extension())
}

/// Canonical asset name for a resolved version
pub fn asset_name_for(app_id: &str, version: &ParsedVersion, platform: Platform) -> String {
    asset_name(app_id, version.stage, version.index, platform)
}

/// Platform of a local artifact, from its extension
pub fn platform_of(path: &Path) -> Option<Platform> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Platform::from_extension)
}

/// An asset name in the canonical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedAsset {
    pub app_id: String,
    pub stage: Stage,
    pub index: u32,
    pub platform: Platform,
}

impl ManagedAsset {
    /// Rebuild the canonical name
    pub fn name(&self) -> String {
        asset_name(&self.app_id, self.stage, self.index, self.platform)
    }
}

/// Recognize names produced by this tool; other attachments are left alone
pub fn parse_managed_asset(name: &str) -> Option<ManagedAsset> {
    let caps = MANAGED_ASSET_REGEX.captures(name)?;
    Some(ManagedAsset {
        app_id: caps.name("app")?.as_str().to_string(),
        stage: caps.name("stage")?.as_str().parse().ok()?,
        index: caps.name("index")?.as_str().parse().ok()?,
        platform: Platform::from_extension(caps.name("ext")?.as_str())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_name() {
        assert_eq!(
            asset_name("boochat", Stage::Alpha, 2, Platform::Android),
            "boochat-alpha.2.apk"
        );
        assert_eq!(
            asset_name("boochat", Stage::Release, 1, Platform::Ios),
            "boochat-release.1.ipa"
        );
    }

    #[test]
    fn test_platform_of() {
        assert_eq!(platform_of(Path::new("out/app-release.APK")), Some(Platform::Android));
        assert_eq!(platform_of(Path::new("Runner.ipa")), Some(Platform::Ios));
        assert_eq!(platform_of(Path::new("mapping.txt")), None);
        assert_eq!(platform_of(Path::new("noext")), None);
    }

    #[test]
    fn test_managed_asset_roundtrip_is_stable() {
        for name in ["boochat-alpha.2.apk", "my-app-rc.10.ipa"] {
            let parsed = parse_managed_asset(name).unwrap();
            assert_eq!(parsed.name(), name);
            let again = parse_managed_asset(&parsed.name()).unwrap();
            assert_eq!(again, parsed);
        }
    }

    #[test]
    fn test_unmanaged_names() {
        assert!(parse_managed_asset("app-release.apk").is_none());
        assert!(parse_managed_asset("boochat-alpha.2.aab").is_none());
        assert!(parse_managed_asset("checksums.txt").is_none());
    }

    #[test]
    fn test_app_id_with_dashes() {
        let parsed = parse_managed_asset("my-app-beta.3.apk").unwrap();
        assert_eq!(parsed.app_id, "my-app");
        assert_eq!(parsed.stage, Stage::Beta);
        assert_eq!(parsed.index, 3);
    }
}
