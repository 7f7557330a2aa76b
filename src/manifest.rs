//! Persisted slot → resource name mapping
//!
//! The in-memory list is written back to the settings store after every
//! mutation, so the persisted copy always matches what callers just observed.

use crate::settings::SettingsStore;

/// Ordered list of generated resource names, indexed by slot
pub struct Manifest {
    names: Vec<String>,
    settings: Box<dyn SettingsStore>,
    key: String,
}

impl Manifest {
    /// Load the manifest stored under `key`, empty if absent
    pub fn load(settings: Box<dyn SettingsStore>, key: &str) -> Self {
        let names = settings.get(key).unwrap_or_default();
        log::info!("Loaded manifest with {} entries", names.len());
        Self {
            names,
            settings,
            key: key.to_string(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name recorded for `index`, if in bounds
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Record `name` for `index`: overwrite in bounds, append otherwise.
    /// A name already present anywhere leaves the manifest untouched.
    pub fn set(&mut self, index: usize, name: &str) {
        if self.names.iter().any(|n| n == name) {
            log::debug!("Manifest already contains {}, ignoring", name);
            return;
        }
        match self.names.get_mut(index) {
            Some(slot) => *slot = name.to_string(),
            None => self.names.push(name.to_string()),
        }
        self.persist();
    }

    /// Delete the entry at `index`, shifting later entries down. Out of
    /// bounds is a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        if index >= self.names.len() {
            return None;
        }
        let removed = self.names.remove(index);
        self.persist();
        Some(removed)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.names.clear();
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.settings.set(&self.key, &self.names) {
            log::warn!("Failed to persist manifest: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
