//! The lazily-initialized settings handle.

use crate::core::{MergeEngine, Settings, SettingsMap, SourceTag};
use crate::error::{ConfigError, Result, ValidationError};
use crate::sources::SourceLoader;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Type alias for validator functions.
pub(crate) type Validator =
    Arc<dyn Fn(&Settings) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Loader name recorded for values set through [`LazySettings::set`].
pub const PROGRAMMATIC: &str = "programmatic";

/// Settings that are merged from their sources on first use.
///
/// A `LazySettings` starts *uninitialized*: building it performs no IO. The first
/// read (or an explicit [`setup`](Self::setup)) runs every source in priority
/// order and stores the merged result. Later reads return that snapshot without
/// touching the sources again until [`reload`](Self::reload) or
/// [`reset`](Self::reset).
///
/// Snapshots are swapped atomically, so readers never observe a half-merged state.
/// Writers (setup, reload, `set` and the `*_from`/`*_to` loader calls) are
/// serialized internally.
///
/// # Examples
///
/// ```rust,no_run
/// use lazy_settings::prelude::*;
///
/// # fn example() -> Result<()> {
/// let settings = LazySettings::builder()
///     .with_file("config/default.yaml")
///     .with_env_overrides("APP", "__")
///     .with_environment("production")
///     .build();
///
/// assert!(!settings.is_configured());
/// let port: Option<u16> = settings.get_as("server.port")?;
/// assert!(settings.is_configured());
/// # Ok(())
/// # }
/// ```
pub struct LazySettings {
    /// Merged settings, `None` until setup
    current: Arc<ArcSwapOption<Settings>>,
    /// Sources in registration order
    engine: Arc<MergeEngine>,
    /// Environment identity handed to every fresh `Settings`
    env: Arc<str>,
    /// Validators run after every full load
    validators: Arc<[Validator]>,
    /// Serializes writers
    write_lock: Arc<Mutex<()>>,
}

impl LazySettings {
    /// Create settings with no sources in the default environment.
    ///
    /// Values can still be loaded explicitly with [`load_from`](Self::load_from)
    /// or set with [`set`](Self::set).
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn from_parts(engine: MergeEngine, env: String, validators: Vec<Validator>) -> Self {
        Self {
            current: Arc::new(ArcSwapOption::empty()),
            engine: Arc::new(engine),
            env: Arc::from(env.as_str()),
            validators: validators.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The environment identity (uppercase). Does not trigger setup.
    pub fn current_env(&self) -> &str {
        &self.env
    }

    /// Whether setup has run since creation or the last [`reset`](Self::reset).
    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    /// Source names in the order they are applied.
    pub fn source_names(&self) -> Vec<String> {
        self.engine.source_names()
    }

    /// Run every source and store the merged settings, unless already done.
    ///
    /// Concurrent callers wait for a single setup pass.
    ///
    /// # Errors
    ///
    /// Returns the first source error or a validation error; the settings then
    /// stay uninitialized and the next access retries.
    pub fn setup(&self) -> Result<()> {
        if self.is_configured() {
            return Ok(());
        }

        let _guard = self.write_lock.lock();
        if self.is_configured() {
            return Ok(());
        }

        let settings = self.build_settings()?;
        tracing::info!(
            env = %self.env,
            sources = self.engine.len(),
            settings = settings.len(),
            "settings initialized"
        );
        self.current.store(Some(Arc::new(settings)));
        Ok(())
    }

    /// Run the full pipeline again and swap in the result.
    ///
    /// If loading or validation fails, the previous settings are retained.
    ///
    /// # Errors
    ///
    /// Returns the first source error or a validation error.
    pub fn reload(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let settings = self.build_settings()?;
        tracing::info!(env = %self.env, settings = settings.len(), "settings reloaded");
        self.current.store(Some(Arc::new(settings)));
        Ok(())
    }

    /// Drop the merged settings. The next access runs setup again.
    pub fn reset(&self) {
        let _guard = self.write_lock.lock();
        self.current.store(None);
        tracing::debug!(env = %self.env, "settings reset");
    }

    /// Get a reference-counted handle to the current settings, running setup first.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub fn snapshot(&self) -> Result<Arc<Settings>> {
        self.setup()?;
        match self.current.load_full() {
            Some(settings) => Ok(settings),
            // reset() raced with this call; set up again
            None => {
                self.setup()?;
                self.current
                    .load_full()
                    .ok_or_else(|| ConfigError::Other("Settings were reset during setup".to_string()))
            }
        }
    }

    /// Look up a value by name or dotted path.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.snapshot()?.get(key).cloned())
    }

    /// Look up a value and deserialize it into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.snapshot()?.get_as(key)
    }

    /// Whether a value exists for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.snapshot()?.contains(key))
    }

    /// Deserialize all settings into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the settings do not fit `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T> {
        self.snapshot()?.extract()
    }

    /// Override a value in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.modify(|settings| {
            settings.set(key, value, &SourceTag::new(PROGRAMMATIC));
            Ok(())
        })
    }

    /// Apply `f` to a copy of the current settings and swap the copy in.
    ///
    /// Nothing is swapped when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or `f` fails.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Settings) -> Result<R>) -> Result<R> {
        self.setup()?;

        let _guard = self.write_lock.lock();
        let mut next = match self.current.load_full() {
            Some(current) => (*current).clone(),
            None => self.build_settings()?,
        };
        let result = f(&mut next)?;
        self.current.store(Some(Arc::new(next)));
        Ok(result)
    }

    /// Load from `loader` into these settings; see [`SourceLoader::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the loader fails.
    pub fn load_from<L>(&self, loader: &L, key: Option<&str>) -> Result<Option<Value>>
    where
        L: SourceLoader + ?Sized,
    {
        self.modify(|settings| loader.load(settings, key))
    }

    /// Write `data` through `loader`; see [`SourceLoader::write`].
    ///
    /// Once the loader accepts the write, the written values are merged into
    /// these settings as well, attributed to `loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the loader rejects the write. Nothing
    /// is merged in that case.
    pub fn write_to<L>(&self, loader: &L, data: Option<&SettingsMap>) -> Result<()>
    where
        L: SourceLoader + ?Sized,
    {
        self.modify(|settings| {
            loader.write(settings, data)?;

            let tag = SourceTag::new(loader.name()).with_env(settings.env());
            for (key, value) in data.into_iter().flatten() {
                settings.set(key, value.clone(), &tag);
            }
            Ok(())
        })
    }

    /// Delete `key` (or everything) through `loader`; see [`SourceLoader::delete`].
    ///
    /// The deleted values are removed from these settings too. An unkeyed delete
    /// removes every value whose last writer was `loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the loader rejects the delete.
    pub fn delete_from<L>(&self, loader: &L, key: Option<&str>) -> Result<()>
    where
        L: SourceLoader + ?Sized,
    {
        self.modify(|settings| {
            loader.delete(settings, key)?;

            match key {
                Some(key) => {
                    settings.unset(key);
                }
                None => {
                    let name = loader.name();
                    let current: &Settings = settings;
                    let owned: Vec<String> = current
                        .keys()
                        .filter(|k| current.provenance(k).is_some_and(|p| p.loader == name))
                        .map(str::to_string)
                        .collect();
                    for key in owned {
                        settings.unset(&key);
                    }
                }
            }
            Ok(())
        })
    }

    fn build_settings(&self) -> Result<Settings> {
        let mut settings = Settings::new(&*self.env);
        self.engine.load_into(&mut settings)?;

        let mut errors: Vec<ValidationError> = self
            .validators
            .iter()
            .filter_map(|validator| validator(&settings).err())
            .collect();
        match errors.len() {
            0 => Ok(settings),
            1 => Err(errors.remove(0).into()),
            _ => Err(ValidationError::Multiple(errors).into()),
        }
    }
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LazySettings {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            engine: Arc::clone(&self.engine),
            env: Arc::clone(&self.env),
            validators: Arc::clone(&self.validators),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}
