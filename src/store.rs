//! Durable store for fetched image bytes
//!
//! One file per resource, named by its generated resource name, inside a
//! cache directory that is created on first write. Every call touches disk.

use crate::error::StoreError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a fresh resource name, unrelated to the content it will name
pub fn generate_resource_name() -> String {
    format!("{}.jpeg", uuid::Uuid::new_v4())
}

/// Key-addressed byte storage on local disk
pub struct ResourceStore {
    cache_dir: PathBuf,
}

impl ResourceStore {
    /// Create a store rooted at `cache_dir`; the directory is not touched yet
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        log::info!("Resource cache directory: {:?}", cache_dir);
        Self { cache_dir }
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the full path for a stored resource
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Check if a resource is stored
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Create the cache directory if absent. Only the last path component is
    /// created; a missing cache root is an error.
    fn ensure_dir(&self) -> std::io::Result<()> {
        if self.cache_dir.is_dir() {
            return Ok(());
        }
        match std::fs::create_dir(&self.cache_dir) {
            Ok(()) => {
                log::debug!("Created resource directory {:?}", self.cache_dir);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Write bytes atomically under `name`, returning the final path
    pub fn save(&self, bytes: &[u8], name: &str) -> Result<PathBuf, StoreError> {
        let io_err = |source| StoreError::Io {
            name: name.to_string(),
            source,
        };

        let result = self.ensure_dir().and_then(|()| {
            let path = self.path_for(name);
            let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
            tmp.write_all(bytes)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(path)
        });

        match result {
            Ok(path) => {
                log::debug!("Saved resource {} ({} bytes)", name, bytes.len());
                Ok(path)
            }
            Err(e) => {
                log::warn!("Failed to save file with name {}: {}", name, e);
                Err(io_err(e))
            }
        }
    }

    /// Read the bytes stored under `name`
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            log::debug!("Failed to load file with name {}: file does not exist", name);
            return Err(StoreError::NotFound(name.to_string()));
        }
        std::fs::read(&path).map_err(|source| {
            log::warn!("Failed to load file with name {}: {}", name, source);
            StoreError::Io {
                name: name.to_string(),
                source,
            }
        })
    }

    /// Delete the file stored under `name`. Failures are logged, never returned.
    pub fn remove(&self, name: &str) {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed resource {}", name),
            Err(e) => log::warn!("Failed to remove file at path {:?}: {}", path, e),
        }
    }
}
