use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::error::{Result, SkiffError};

/// Application configuration
///
/// Loaded once at startup and passed by reference to whoever needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote mail service configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Remote mail service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the mail API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://api.domain.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // XDG config path
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("skiff").join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".config").join("skiff").join("config.toml"));
        paths.push(home_dir.join(".skiffrc"));
    }

    paths
}

/// Load configuration from the first default path that exists
pub fn load() -> Result<AppConfig> {
    info!("Loading configuration from default paths");

    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return load_from_path(&path);
        }
    }

    // No config found, fall back to defaults
    info!("No config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load configuration from a specific path
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| SkiffError::Config(format!("Failed to read config: {}", e)))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SkiffError::Config(format!("Failed to parse config: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "https://api.domain.com");
    }

    #[test]
    fn test_parse_base_url() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://mail.example.net"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://mail.example.net");
    }
}
