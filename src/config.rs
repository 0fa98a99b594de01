//! Client configuration loaded from a JSON file

use crate::locale::Language;
use crate::model::StoreUrl;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

const DEFAULT_SERVER: &str = "http://localhost:8080/";
const DEFAULT_COLLECTION: &str = "Default";

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub language: Language,
    /// Store used when the registry has no default collection yet
    pub default_server_url: StoreUrl,
    pub default_collection_title: String,
    /// Where the collection registry is kept
    pub registry_path: PathBuf,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            default_server_url: default_server_url(),
            default_collection_title: DEFAULT_COLLECTION.to_string(),
            registry_path: default_registry_path(),
        }
    }
}

impl FolioConfig {
    /// Load settings from `path`; a missing or empty file yields defaults
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_default_server(mut self, url: StoreUrl) -> Self {
        self.default_server_url = url;
        self
    }

    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }
}

fn default_server_url() -> StoreUrl {
    StoreUrl::from_normalised(DEFAULT_SERVER)
}

/// Default registry location (~/.config/folio/collections.json)
pub fn default_registry_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("folio").join("collections.json")
}

/// Default config file location (~/.config/folio/config.json)
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("folio").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FolioConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.default_collection_title, "Default");
        assert_eq!(config.default_server_url.as_str(), "http://localhost:8080/");
        assert!(config.registry_path.ends_with("folio/collections.json"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "language": "dutch" }"#).unwrap();

        let config = FolioConfig::load(&path).unwrap();
        assert_eq!(config.language, Language::Dutch);
        assert_eq!(config.default_collection_title, "Default");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = FolioConfig::default()
            .with_language(Language::Romanian)
            .with_registry_path(dir.path().join("reg.json"));
        config.save(&path).unwrap();
        assert_eq!(FolioConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn invalid_store_url_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "default_server_url": "ftp://nope" }"#).unwrap();
        assert!(matches!(FolioConfig::load(&path), Err(ConfigError::Serialization(_))));
    }
}
