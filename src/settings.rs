//! Key/value settings storage
//!
//! Small process-wide preferences (currently only the manifest) live behind
//! the [`SettingsStore`] trait so callers inject the backend explicitly.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Storage for named lists of strings
pub trait SettingsStore: Send {
    /// Get the list stored under `key`, if any
    fn get(&self, key: &str) -> Option<Vec<String>>;

    /// Replace the list stored under `key` and persist it
    fn set(&mut self, key: &str, values: &[String]) -> Result<(), SettingsError>;
}

/// Settings persisted as a JSON object in a single file
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    values: SettingsFile,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct SettingsFile {
    entries: HashMap<String, Vec<String>>,
}

impl JsonSettings {
    /// Load settings from `path`, or start empty if it is missing or unreadable
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(values) => values,
                    Err(e) => {
                        log::warn!("Failed to parse settings file, starting fresh: {}", e);
                        SettingsFile::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read settings file, starting fresh: {}", e);
                    SettingsFile::default()
                }
            }
        } else {
            SettingsFile::default()
        };
        log::debug!(
            "Loaded {} settings keys from {:?}",
            values.entries.len(),
            path
        );
        Self { path, values }
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettings {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.values.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, values: &[String]) -> Result<(), SettingsError> {
        self.values
            .entries
            .insert(key.to_string(), values.to_vec());
        self.save()
    }
}

/// In-memory settings. Clones share the same storage, so a handle kept by a
/// test observes writes made through the copy owned by the manifest.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    entries: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&mut self, key: &str, values: &[String]) -> Result<(), SettingsError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), values.to_vec());
        Ok(())
    }
}
