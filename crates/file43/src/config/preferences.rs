//! User preferences persisted as a small JSON blob.
//!
//! Reads never fail: a missing or unreadable file yields the defaults, and
//! keys absent from the file keep their default values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PreferencesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: Theme,
    pub default_format: String,
    pub auto_open_output: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            default_format: "mp3".to_string(),
            auto_open_output: false,
        }
    }
}

/// Loads and saves [`Preferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/file43/preferences.json`, if the platform has a config dir.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|p| Self::new(p.join("file43").join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Preferences::default();
            }
            Err(e) => {
                log::warn!(
                    "Failed to read preferences {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                return Preferences::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "Ignoring corrupt preferences {}: {}",
                self.path.display(),
                e
            );
            Preferences::default()
        })
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PreferencesError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json).map_err(|e| PreferencesError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        log::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let store = PreferencesStore::new(temp.path().join("preferences.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        std::fs::write(&path, r#"{ "theme": "light" }"#).unwrap();

        let prefs = PreferencesStore::new(&path).load();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.default_format, "mp3");
        assert!(!prefs.auto_open_output);
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        std::fs::write(&path, "{{{").unwrap();
        assert_eq!(PreferencesStore::new(&path).load(), Preferences::default());
    }

    #[test]
    fn test_save_creates_parent_and_persists() {
        let temp = TempDir::new().unwrap();
        let store = PreferencesStore::new(temp.path().join("nested").join("preferences.json"));
        let prefs = Preferences {
            theme: Theme::Light,
            default_format: "flac".to_string(),
            auto_open_output: true,
        };

        store.save(&prefs).unwrap();

        assert_eq!(store.load(), prefs);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"autoOpenOutput\": true"));
    }
}
