//! Source loader trait.

use crate::core::{Settings, SettingsMap};
use crate::error::{ConfigError, Result};
use serde_json::Value;

/// Trait for settings sources.
///
/// Implement this trait to create custom sources (e.g., remote APIs, databases,
/// key-value stores). Loaders write directly into a [`Settings`] object so that
/// every value carries the loader's provenance.
pub trait SourceLoader: Send + Sync {
    /// Load settings from this source into `settings`.
    ///
    /// With `key`, only that setting is loaded and its value returned (`None` when
    /// the source has no such setting). Without `key`, everything the source holds
    /// is merged and `None` is returned. A source with no data is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or parsed.
    fn load(&self, settings: &mut Settings, key: Option<&str>) -> Result<Option<Value>>;

    /// Persist `data` into this source.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` unless the source is writable.
    fn write(&self, settings: &Settings, data: Option<&SettingsMap>) -> Result<()> {
        let _ = (settings, data);
        Err(ConfigError::unsupported(self.name(), "write"))
    }

    /// Remove `key` (or everything, without a key) from this source.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` unless the source supports deletion.
    fn delete(&self, settings: &Settings, key: Option<&str>) -> Result<()> {
        let _ = (settings, key);
        Err(ConfigError::unsupported(self.name(), "delete"))
    }

    /// Get a human-readable name for this source (for logging and provenance).
    fn name(&self) -> String;

    /// Get the priority of this source (higher = takes precedence).
    ///
    /// Default priorities:
    /// - Environment variables: 300
    /// - Key/value stores: 250
    /// - Files: 100 and up, in the order they were added
    fn priority(&self) -> i32 {
        100
    }
}

/// Keep only `key` (case-insensitively) from a freshly read map.
pub(crate) fn select_key(map: SettingsMap, key: &str) -> Option<(String, Value)> {
    map.into_iter().find(|(name, _)| name.eq_ignore_ascii_case(key.trim()))
}
