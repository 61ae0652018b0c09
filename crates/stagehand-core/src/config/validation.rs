//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_github(config)?;
    validate_mail(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_github(config: &Config) -> Result<()> {
    for (field, url) in [
        ("github.api_url", &config.github.api_url),
        ("github.uploads_url", &config.github.uploads_url),
    ] {
        if !is_http_url(url) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "must be an http(s) URL".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_mail(config: &Config) -> Result<()> {
    if !is_http_url(&config.mail.api_url) {
        return Err(ConfigError::InvalidValue {
            field: "mail.api_url".to_string(),
            message: "must be an http(s) URL".to_string(),
        }
        .into());
    }

    if config.mail.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "mail.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
