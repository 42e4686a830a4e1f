//! Builder for constructing LazySettings instances.

use crate::core::lazy::Validator;
use crate::core::settings::DEFAULT_ENV;
use crate::core::{LazySettings, MergeEngine, Settings};
use crate::error::ValidationError;
use crate::sources::{EnvSource, FileSource, SourceLoader};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;
#[cfg(feature = "validation")]
use serde::de::DeserializeOwned;

/// Builder for constructing a `LazySettings` instance.
///
/// Provides a fluent interface for describing the source pipeline. Building
/// performs no IO; sources run on first access.
///
/// # Examples
///
/// ```rust,no_run
/// use lazy_settings::prelude::*;
///
/// let settings = LazySettings::builder()
///     .with_file("config/default.yaml")
///     .with_file("config/production.yaml")
///     .with_env_overrides("APP", "__")
///     .with_environment("production")
///     .build();
/// ```
pub struct LazySettingsBuilder {
    file_paths: Vec<(PathBuf, bool)>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    custom_sources: Vec<Box<dyn SourceLoader>>,
    environment: Option<String>,
    validators: Vec<Validator>,
}

impl LazySettingsBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
            custom_sources: Vec::new(),
            environment: None,
            validators: Vec::new(),
        }
    }

    /// Add a file source with automatic format detection.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    ///
    /// Files are added in the order they are specified. Later files have higher
    /// priority and will override earlier files.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push((path.into(), false));
        self
    }

    /// Add a file source that is skipped when the file does not exist.
    pub fn with_optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push((path.into(), true));
        self
    }

    /// Add environment variable source with custom prefix.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    ///
    /// Environment variables have the highest priority by default (300).
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Add a custom settings source, such as a [`StoreLoader`](crate::sources::StoreLoader).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_settings::prelude::*;
    /// use lazy_settings::sources::{StoreConfig, StoreLoader};
    /// use lazy_settings::store::MemoryStore;
    ///
    /// let settings = LazySettings::builder()
    ///     .with_source(StoreLoader::new(StoreConfig::enabled(), MemoryStore::new()))
    ///     .build();
    /// ```
    pub fn with_source<S: SourceLoader + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Set the environment identity used to namespace store keys.
    ///
    /// Default is `DEVELOPMENT`.
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }

    /// Take the environment identity from `<PREFIX>_ENV`, if set.
    pub fn environment_from_env(mut self, prefix: &str) -> Self {
        if let Ok(env) = std::env::var(format!("{}_ENV", prefix.to_uppercase())) {
            self.environment = Some(env);
        }
        self
    }

    /// Add a validation function that must pass after every full load.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_settings::prelude::*;
    ///
    /// let settings = LazySettings::builder()
    ///     .with_validation(|settings: &Settings| {
    ///         if !settings.contains("DATABASE_URL") {
    ///             return Err(ValidationError::missing("DATABASE_URL"));
    ///         }
    ///         Ok(())
    ///     })
    ///     .build();
    ///
    /// assert!(settings.setup().is_err());
    /// ```
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Settings) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Validate a typed view of the settings with its [`Validate`] impl.
    ///
    /// Settings that cannot be extracted into `T` fail validation too.
    #[cfg(feature = "validation")]
    pub fn with_typed_validation<T>(self) -> Self
    where
        T: DeserializeOwned + Validate + 'static,
    {
        self.with_validation(|settings: &Settings| {
            let typed: T = settings
                .extract()
                .map_err(|e| ValidationError::custom(e.to_string()))?;
            typed.validate()
        })
    }

    /// Build the settings handle.
    ///
    /// Sources are registered as: files (priority 100, 110, 120, ...), custom
    /// sources (their own priority), environment variables (300).
    pub fn build(self) -> LazySettings {
        let mut engine = MergeEngine::new();

        // Add file sources with increasing priority
        for (index, (path, optional)) in self.file_paths.into_iter().enumerate() {
            let priority = 100 + (index as i32 * 10);
            let source = FileSource::new(path)
                .with_priority(priority)
                .optional(optional);
            engine.add_source(Box::new(source));
        }

        for source in self.custom_sources {
            engine.add_source(source);
        }

        if let (Some(prefix), Some(separator)) = (self.env_prefix, self.env_separator) {
            engine.add_source(Box::new(EnvSource::new(prefix, separator)));
        }

        let env = self
            .environment
            .map(|env| env.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_ENV.to_string());

        LazySettings::from_parts(engine, env, self.validators)
    }
}

impl Default for LazySettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Create a new builder for constructing a settings handle.
    pub fn builder() -> LazySettingsBuilder {
        LazySettingsBuilder::new()
    }
}
