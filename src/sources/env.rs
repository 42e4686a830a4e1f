//! Environment variable settings source.

use super::SourceLoader;
use super::source_loader::select_key;
use crate::core::{Settings, SettingsMap, SourceTag};
use crate::error::{ConfigError, Result};
use config::Environment;
use serde_json::Value;

/// Environment variable settings source.
///
/// Loads settings from environment variables with a specified prefix
/// and separator for nested keys. Values are parsed into numbers and booleans
/// where possible.
///
/// # Examples
///
/// ```rust
/// use lazy_settings::sources::EnvSource;
///
/// // APP_SERVER__PORT=8080 -> SERVER = {"port": 8080}
/// let source = EnvSource::new("APP", "__");
/// ```
pub struct EnvSource {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvSource {
    /// Create a new environment variable source.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn read(&self) -> Result<SettingsMap> {
        let env_source = Environment::with_prefix(&self.prefix)
            .prefix_separator("_")
            .separator(&self.separator)
            .try_parsing(true);

        let config = config::Config::builder()
            .add_source(env_source)
            .build()
            .map_err(|e| {
                ConfigError::LoadError(format!("Failed to load environment variables: {}", e))
            })?;

        config.try_deserialize::<SettingsMap>().map_err(|e| {
            ConfigError::DeserializationError(format!(
                "Failed to parse environment variables: {}",
                e
            ))
        })
    }
}

impl SourceLoader for EnvSource {
    fn load(&self, settings: &mut Settings, key: Option<&str>) -> Result<Option<Value>> {
        let values = self.read()?;
        let tag = SourceTag::new(self.name());

        match key {
            Some(key) => Ok(select_key(values, key).map(|(name, value)| {
                settings.set(&name, value.clone(), &tag);
                value
            })),
            None => {
                tracing::debug!(source = %self.name(), count = values.len(), "loaded environment");
                settings.update(values, &tag);
                Ok(None)
            }
        }
    }

    fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
