//! Key/value store settings source (Redis and friends).

use super::SourceLoader;
use crate::core::{Settings, SettingsMap, SourceTag, canonical_key};
use crate::error::{ConfigError, Result};
use crate::store::KeyValueStore;
use config::Environment;
use serde::Deserialize;
use serde_json::Value;

/// Environment namespace shared by every environment.
///
/// Unkeyed loads merge it before the current environment; keyed loads fall back
/// to it when the current environment has no value.
pub const GLOBAL_ENV: &str = "GLOBAL";

/// What a disabled store does on `load` and `delete`.
///
/// `write` always fails on a disabled store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisabledPolicy {
    /// Every operation fails with `NotConfigured`.
    #[default]
    FailClosed,
    /// Only writes fail; loads find nothing and deletes do nothing.
    FailWritesOnly,
}

/// Connection and namespacing parameters for a store loader.
///
/// Build it explicitly, or read it once from the process environment with
/// [`StoreConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Gate for every operation (default `false`)
    pub enabled: bool,
    /// Server host (default `localhost`)
    pub host: String,
    /// Server port (default `6379`)
    pub port: u16,
    /// Database index (default `0`)
    pub db: i64,
    /// Optional ACL username
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Namespace prefix and environment variable prefix (default `SETTINGS`)
    #[serde(skip)]
    pub prefix: String,
    /// Behavior of `load`/`delete` while disabled
    #[serde(skip)]
    pub disabled_policy: DisabledPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            username: None,
            password: None,
            prefix: "SETTINGS".to_string(),
            disabled_policy: DisabledPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// An enabled configuration with default connection parameters.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Read `<PREFIX>_REDIS_ENABLED`, `_HOST`, `_PORT`, `_DB`, `_USERNAME` and
    /// `_PASSWORD` from the process environment.
    ///
    /// Unset variables keep their defaults. `ENABLED` accepts `true`/`1`/`yes`/`on`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong type.
    pub fn from_env(prefix: impl Into<String>) -> Result<Self> {
        let prefix = canonical_key(&prefix.into());
        let source = Environment::with_prefix(&format!("{}_REDIS", prefix)).try_parsing(true);

        let mut config = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize::<StoreConfig>())
            .map_err(|e| {
                ConfigError::LoadError(format!("Failed to read {}_REDIS_* variables: {}", prefix, e))
            })?;
        config.prefix = prefix;
        Ok(config)
    }

    /// Set the namespace prefix.
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.prefix = canonical_key(prefix.as_ref());
        self
    }

    /// Set the disabled-store policy.
    pub fn with_disabled_policy(mut self, policy: DisabledPolicy) -> Self {
        self.disabled_policy = policy;
        self
    }

    /// Connection URL (`redis://[user][:password@]host:port/db`).
    pub fn url(&self) -> String {
        let auth = match (&self.username, &self.password) {
            (Some(user), Some(password)) => format!("{}:{}@", user, password),
            (None, Some(password)) => format!(":{}@", password),
            (Some(user), None) => format!("{}@", user),
            (None, None) => String::new(),
        };
        format!("redis://{}{}:{}/{}", auth, self.host, self.port, self.db)
    }

    /// Store namespace for an environment: `<PREFIX>:<ENV>`.
    pub fn namespace(&self, env: &str) -> String {
        format!("{}:{}", self.prefix, canonical_key(env))
    }

    fn not_enabled(&self, backend: &str) -> ConfigError {
        ConfigError::NotConfigured(format!(
            "The {backend} store is not enabled. Enable it with\n\
             \texport {prefix}_REDIS_ENABLED=true\n\
             and set {prefix}_REDIS_HOST / {prefix}_REDIS_PORT if not {host}:{port}",
            backend = backend,
            prefix = self.prefix,
            host = self.host,
            port = self.port,
        ))
    }
}

/// Settings source backed by a [`KeyValueStore`].
///
/// Settings live under the namespace `<PREFIX>:<ENV>`, one field per uppercased
/// setting name, each value serialized as JSON. Text that is not valid JSON is
/// read back as a plain string.
///
/// # Examples
///
/// ```rust
/// use lazy_settings::prelude::*;
/// use lazy_settings::sources::{StoreConfig, StoreLoader};
/// use lazy_settings::store::MemoryStore;
/// use serde_json::json;
///
/// # fn example() -> Result<()> {
/// let settings = LazySettings::new();
/// let loader = StoreLoader::new(StoreConfig::enabled(), MemoryStore::new());
///
/// let data = SettingsMap::from([("SECRET".to_string(), json!("s3cr3t"))]);
/// settings.write_to(&loader, Some(&data))?;
/// settings.load_from(&loader, Some("SECRET"))?;
///
/// assert_eq!(settings.get("SECRET")?, Some(json!("s3cr3t")));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct StoreLoader<S> {
    config: StoreConfig,
    store: S,
    priority: i32,
}

impl<S: KeyValueStore> StoreLoader<S> {
    /// Create a loader over `store`.
    pub fn new(config: StoreConfig, store: S) -> Self {
        Self {
            config,
            store,
            priority: 250,
        }
    }

    /// Set the priority for this source.
    ///
    /// Default is 250 (higher than files, lower than environment variables).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The loader's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying store client.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write `data` into the namespace of `env` rather than the current one.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` if the store is disabled
    /// - `MissingArgument` if `data` is absent or empty
    /// - any store error
    pub fn write_env(&self, env: &str, data: Option<&SettingsMap>) -> Result<()> {
        if !self.config.enabled {
            return Err(self.config.not_enabled(self.store.backend_name()));
        }
        let data = match data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(ConfigError::MissingArgument("Data must be provided")),
        };

        let namespace = self.config.namespace(env);
        for (key, value) in data {
            let encoded = serde_json::to_string(value)?;
            self.store.set(&namespace, &canonical_key(key), &encoded)?;
        }

        tracing::debug!(
            backend = self.store.backend_name(),
            namespace = %namespace,
            count = data.len(),
            "wrote settings to store"
        );
        Ok(())
    }

    /// `Ok(true)` when operations may proceed, `Ok(false)` when a disabled store
    /// should quietly do nothing.
    fn check_enabled(&self, operation: &'static str) -> Result<bool> {
        if self.config.enabled {
            return Ok(true);
        }
        match self.config.disabled_policy {
            DisabledPolicy::FailClosed => {
                Err(self.config.not_enabled(self.store.backend_name()))
            }
            DisabledPolicy::FailWritesOnly => {
                tracing::debug!(
                    backend = self.store.backend_name(),
                    operation,
                    "store disabled, skipping"
                );
                Ok(false)
            }
        }
    }

    fn tag(&self, env: &str) -> SourceTag {
        SourceTag::new(self.name()).with_env(env)
    }
}

/// Parse a stored value; anything that is not JSON is a plain string.
fn decode(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Environments consulted for `current`, lowest precedence first.
fn env_chain(current: &str) -> Vec<String> {
    if current == GLOBAL_ENV {
        vec![GLOBAL_ENV.to_string()]
    } else {
        vec![GLOBAL_ENV.to_string(), current.to_string()]
    }
}

impl<S: KeyValueStore> SourceLoader for StoreLoader<S> {
    fn load(&self, settings: &mut Settings, key: Option<&str>) -> Result<Option<Value>> {
        if !self.check_enabled("load")? {
            return Ok(None);
        }
        let chain = env_chain(settings.env());

        if let Some(key) = key {
            let key = canonical_key(key);
            for env in chain.iter().rev() {
                let namespace = self.config.namespace(env);
                if let Some(raw) = self.store.get(&namespace, &key)? {
                    let value = decode(&raw);
                    settings.set(&key, value.clone(), &self.tag(env));
                    return Ok(Some(value));
                }
            }
            tracing::debug!(key = %key, "setting not found in store");
            return Ok(None);
        }

        for env in &chain {
            let namespace = self.config.namespace(env);
            let mut fields = self.store.scan(&namespace)?;
            fields.sort();
            tracing::debug!(
                namespace = %namespace,
                count = fields.len(),
                "loading settings from store"
            );

            let tag = self.tag(env);
            for (field, raw) in fields {
                settings.set(&field, decode(&raw), &tag);
            }
        }
        Ok(None)
    }

    fn write(&self, settings: &Settings, data: Option<&SettingsMap>) -> Result<()> {
        self.write_env(settings.env(), data)
    }

    fn delete(&self, settings: &Settings, key: Option<&str>) -> Result<()> {
        if !self.check_enabled("delete")? {
            return Ok(());
        }
        let namespace = self.config.namespace(settings.env());

        match key {
            Some(key) => {
                let key = canonical_key(key);
                tracing::debug!(namespace = %namespace, key = %key, "deleting setting from store");
                self.store.delete(&namespace, &key)
            }
            None => {
                tracing::debug!(namespace = %namespace, "flushing store namespace");
                self.store.flush(&namespace)
            }
        }
    }

    fn name(&self) -> String {
        format!("{}:{}", self.store.backend_name(), self.config.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
