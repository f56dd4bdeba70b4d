//! Configuration loading and API base URL resolution

use crate::{Error, Location, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Compiled default for the backend API root
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the API root
pub const API_BASE_ENV_VAR: &str = "SYNCOPATE_API_BASE";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<Location>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default config file path for the platform
///
/// `~/.config/syncopate/config.toml` on Linux, the platform config
/// directory elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("syncopate").join("config.toml"))
}

/// Load the TOML config at `path`
///
/// A missing file yields defaults. An unreadable or malformed file also
/// yields defaults, with a warning, so a bad config never stops startup.
pub fn load_toml_config(path: &Path) -> TomlConfig {
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return TomlConfig::default();
    }

    match read_toml_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Strict variant of [`load_toml_config`]
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write the config atomically (temp file in the same directory, then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// API base URL resolution, highest priority first:
/// 1. Command-line argument
/// 2. `SYNCOPATE_API_BASE` environment variable
/// 3. TOML `api_base_url`
/// 4. Compiled default
pub fn resolve_api_base_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_value = std::env::var(API_BASE_ENV_VAR).ok();

    let (source, raw) = if let Some(url) = cli_arg {
        ("command line", url.to_string())
    } else if let Some(url) = env_value {
        ("environment", url)
    } else if let Some(url) = &toml_config.api_base_url {
        ("TOML", url.clone())
    } else {
        ("default", DEFAULT_API_BASE_URL.to_string())
    };

    let url = normalize_base_url(&raw)?;
    info!("API base URL from {}: {}", source, url);
    Ok(url)
}

/// Trim whitespace and trailing slashes; require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("API base URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https://: {}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(" http://localhost:8000/api/ ").unwrap(),
            "http://localhost:8000/api"
        );
        assert!(normalize_base_url("localhost:8000").is_err());
        assert!(normalize_base_url("").is_err());
    }

    #[test]
    fn test_default_logging_level() {
        assert_eq!(TomlConfig::default().logging.level, "info");
    }
}
