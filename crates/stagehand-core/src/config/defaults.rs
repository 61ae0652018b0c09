//! Default configuration values

/// Default configuration file name
pub const DEFAULT_CONFIG_TOML: &str = "stagehand.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".stagehand.toml";

/// Default catalog location
pub const DEFAULT_CATALOG_PATH: &str = "app/config/apps.json";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![DEFAULT_CONFIG_TOML, ALT_CONFIG_FILE]
}
