//! Runtime configuration
//!
//! Every field has a default so a partial JSON file (or none at all) is valid.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Number of grid slots created on startup and after a full reset.
pub const DEFAULT_SLOT_COUNT: usize = 6;

/// Name of the cache subdirectory holding fetched images.
pub const RESOURCES_DIR_NAME: &str = "Resources";

/// Settings key under which the manifest is persisted.
pub const MANIFEST_KEY: &str = "resource_list";

/// Remote image endpoint, assembled as `{base_url}{size}/?{category}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub size: String,
    pub category: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "https://source.unsplash.com/".to_string(),
            size: "800x600".to_string(),
            category: "cars".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Full request URL for this endpoint
    pub fn url(&self) -> String {
        format!("{}{}/?{}", self.base_url, self.size, self.category)
    }
}

/// Top-level configuration for the grid backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub endpoint: EndpointConfig,
    /// Number of entries the grid is (re)initialised with.
    pub slot_count: usize,
    /// Platform cache root; the resources directory is created inside it.
    pub cache_root: PathBuf,
    pub resources_dir_name: String,
    /// JSON file backing the settings store.
    pub settings_path: PathBuf,
    pub manifest_key: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            slot_count: DEFAULT_SLOT_COUNT,
            cache_root: dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")),
            resources_dir_name: RESOURCES_DIR_NAME.to_string(),
            settings_path: default_settings_path(),
            manifest_key: MANIFEST_KEY.to_string(),
        }
    }
}

impl GridConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject endpoints reqwest could never request
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.endpoint.url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Endpoint(url));
        }
        Ok(())
    }

    /// Directory holding cached image files
    pub fn resources_dir(&self) -> PathBuf {
        self.cache_root.join(&self.resources_dir_name)
    }
}

/// Returns the default settings path: ~/.config/grid_cache/settings.json
fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grid_cache")
        .join("settings.json")
}
