//! Pool manager settings
//!
//! Flat, read-only configuration consumed by the registry. Supports loading and
//! saving in RON (Rusty Object Notation) and JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Archetype;

/// Default limit of objects constructed per tick
const DEFAULT_OBJECTS_PER_TICK: i32 = 5;

fn default_objects_per_tick() -> i32 {
    DEFAULT_OBJECTS_PER_TICK
}

/// Binds a factory from the catalog to an archetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryBinding {
    /// Archetype served by the factory, including its descendants
    pub archetype: Archetype,
    /// Name of the factory in the catalog
    pub factory: String,
}

impl FactoryBinding {
    /// Create a new binding
    #[must_use]
    pub fn new(archetype: Archetype, factory: impl Into<String>) -> Self {
        Self {
            archetype,
            factory: factory.into(),
        }
    }
}

/// Settings of the pool manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// How many queued objects each factory may construct per tick.
    ///
    /// Stored as configured; read through [`PoolSettings::objects_per_tick`].
    #[serde(default = "default_objects_per_tick")]
    pub spawn_objects_per_tick: i32,
    /// Factories to bind on startup
    #[serde(default)]
    pub factories: Vec<FactoryBinding>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            spawn_objects_per_tick: DEFAULT_OBJECTS_PER_TICK,
            factories: Vec::new(),
        }
    }
}

impl PoolSettings {
    /// Set the per-tick construction limit
    #[must_use]
    pub fn with_objects_per_tick(mut self, objects_per_tick: i32) -> Self {
        self.spawn_objects_per_tick = objects_per_tick;
        self
    }

    /// Add a factory binding
    #[must_use]
    pub fn with_factory(mut self, archetype: Archetype, factory: impl Into<String>) -> Self {
        self.factories.push(FactoryBinding::new(archetype, factory));
        self
    }

    /// Per-tick construction limit, never less than one.
    #[must_use]
    pub fn objects_per_tick(&self) -> usize {
        if self.spawn_objects_per_tick < 1 {
            log::warn!(
                "'spawn_objects_per_tick' is {}, falling back to 1",
                self.spawn_objects_per_tick
            );
            return 1;
        }
        self.spawn_objects_per_tick as usize
    }

    /// Parse settings from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid settings RON
    pub fn from_ron_str(source: &str) -> Result<Self, SettingsError> {
        ron::from_str(source).map_err(|e| SettingsError::Deserialize(e.to_string()))
    }

    /// Save the settings to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Load settings from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save the settings to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load settings from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Deserialize(e.to_string()))
    }
}

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
