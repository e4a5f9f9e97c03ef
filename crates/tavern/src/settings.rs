//! # Persisted Settings Blob
//!
//! A flat `key -> JSON record` store. Loaded once at startup and written back
//! on every mutation (write to a temp file, then rename over the original).
//!
//! Absent files, malformed files and records that do not decode into the
//! requested type all degrade to defaults; they are never errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GameError, GameResult};

/// Key of the [`AudioSettings`] record.
pub const AUDIO_KEY: &str = "audio";

/// Key/record store with optional file backing.
#[derive(Debug, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    records: BTreeMap<String, Value>,
}

impl SettingsStore {
    /// Creates a store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store backed by `path`, loading whatever it holds.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::read(&path);
        tracing::debug!("settings: {} record(s) from {}", records.len(), path.display());
        Self { path: Some(path), records }
    }

    fn read(path: &Path) -> BTreeMap<String, Value> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("settings: {} unreadable ({}); using defaults", path.display(), e);
                return BTreeMap::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!("settings: {} malformed ({}); using defaults", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decodes the record under `key`, or `None` if absent or undecodable.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.records.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("settings: record `{}` does not decode ({}); using default", key, e);
                None
            }
        }
    }

    /// Decodes the record under `key`, falling back to `T::default()`.
    #[must_use]
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Stores a record and saves.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Settings`] if the record cannot be encoded and
    /// [`GameError::Io`] if the file cannot be written.
    pub fn set<T: Serialize>(&mut self, key: &str, record: &T) -> GameResult<()> {
        let value = serde_json::to_value(record)?;
        self.records.insert(key.to_owned(), value);
        self.save()
    }

    /// Removes a record and saves. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Io`] if the file cannot be written.
    pub fn remove(&mut self, key: &str) -> GameResult<bool> {
        if self.records.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Returns true if a record is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Stored keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    fn save(&self) -> GameResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.records)?;
        let temp = path.with_extension("tmp");
        std::fs::write(&temp, json).map_err(|e| GameError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| GameError::io(path, e))?;
        Ok(())
    }

    /// Audio levels, or defaults.
    #[must_use]
    pub fn audio(&self) -> AudioSettings {
        self.get_or_default(AUDIO_KEY)
    }

    /// Replaces the audio levels and saves.
    ///
    /// # Errors
    ///
    /// See [`SettingsStore::set`].
    pub fn set_audio(&mut self, audio: &AudioSettings) -> GameResult<()> {
        self.set(AUDIO_KEY, audio)
    }
}

/// Audio levels kept across runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Music volume, `0.0..=1.0`.
    pub music_volume: f32,
    /// Effects volume, `0.0..=1.0`.
    pub effects_volume: f32,
    /// Silence everything.
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { music_volume: 0.8, effects_volume: 1.0, muted: false }
    }
}
