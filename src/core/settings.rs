//! The merged settings container and its provenance history.

use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// A mapping of setting names to values, as accepted by loaders' `write`.
pub type SettingsMap = BTreeMap<String, Value>;

/// Environment identity used when none is configured.
pub const DEFAULT_ENV: &str = "DEVELOPMENT";

/// Identifies the loader performing a write into [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTag {
    /// Loader name (see `SourceLoader::name`)
    pub loader: String,
    /// Environment namespace the value came from, if the loader has one
    pub env: Option<String>,
}

impl SourceTag {
    /// Tag for a loader without environment namespaces.
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            env: None,
        }
    }

    /// Attach the environment namespace the value was read from.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

/// Where a setting value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Loader name
    pub loader: String,
    /// Environment namespace, if any
    pub env: Option<String>,
    /// Position of the write within this settings object's history
    pub order: u64,
}

/// One entry of the write history.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRecord {
    /// Canonical (uppercase) setting name
    pub key: String,
    /// Who wrote it
    pub provenance: Provenance,
}

/// Merged configuration values.
///
/// Top-level keys are stored in uppercase; lookups are case-insensitive on the
/// top-level key and accept dotted paths into nested objects:
///
/// ```rust
/// use lazy_settings::core::{Settings, SourceTag};
/// use serde_json::json;
///
/// let mut settings = Settings::new("development");
/// settings.set("database", json!({"url": "postgres://localhost/db"}), &SourceTag::new("docs"));
///
/// assert_eq!(settings.get("DATABASE.url"), Some(&json!("postgres://localhost/db")));
/// assert_eq!(settings.env(), "DEVELOPMENT");
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    env: String,
    values: BTreeMap<String, Value>,
    history: Vec<LoadRecord>,
}

/// Canonical form of a setting name.
pub fn canonical_key(key: &str) -> String {
    key.trim().to_uppercase()
}

impl Settings {
    /// Create an empty settings object for the given environment.
    pub fn new(env: impl AsRef<str>) -> Self {
        Self {
            env: canonical_key(env.as_ref()),
            values: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// The environment identity (uppercase).
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Set a value, recording who wrote it.
    pub fn set(&mut self, key: &str, value: Value, tag: &SourceTag) {
        let key = canonical_key(key);
        let provenance = Provenance {
            loader: tag.loader.clone(),
            env: tag.env.clone(),
            order: self.history.len() as u64,
        };
        tracing::trace!(key = %key, loader = %tag.loader, "setting value");
        self.history.push(LoadRecord {
            key: key.clone(),
            provenance,
        });
        self.values.insert(key, value);
    }

    /// Set every entry of `data`, in map order.
    pub fn update(&mut self, data: SettingsMap, tag: &SourceTag) {
        for (key, value) in data {
            self.set(&key, value, tag);
        }
    }

    /// Remove a value. The history keeps earlier writes.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.values.remove(&canonical_key(key))
    }

    /// Look up a value by name or dotted path.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let canonical = canonical_key(key);
        if let Some(value) = self.values.get(&canonical) {
            return Some(value);
        }

        let mut parts = key.trim().split('.');
        let head = canonical_key(parts.next()?);
        let mut current = self.values.get(&head)?;
        for part in parts {
            let object = current.as_object()?;
            current = match object.get(part) {
                Some(value) => value,
                None => object
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(part))
                    .map(|(_, value)| value)?,
            };
        }
        Some(current)
    }

    /// Look up a value and deserialize it into `T`.
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` if the value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    ConfigError::DeserializationError(format!("Setting '{}': {}", key, e))
                })
            })
            .transpose()
    }

    /// Whether a value exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Setting names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no settings are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Who last wrote `key`.
    pub fn provenance(&self, key: &str) -> Option<&Provenance> {
        let key = canonical_key(key);
        if !self.values.contains_key(&key) {
            return None;
        }
        self.history
            .iter()
            .rev()
            .find(|record| record.key == key)
            .map(|record| &record.provenance)
    }

    /// Every write ever applied, oldest first.
    pub fn history(&self) -> &[LoadRecord] {
        &self.history
    }

    /// Writes applied to one key, oldest first.
    pub fn history_for(&self, key: &str) -> Vec<&LoadRecord> {
        let key = canonical_key(key);
        self.history.iter().filter(|r| r.key == key).collect()
    }

    /// Deserialize all settings into a typed struct.
    ///
    /// Top-level names are lowercased so that ordinary snake_case fields match.
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` if the settings do not fit `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T> {
        let object: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_ENV)
    }
}
