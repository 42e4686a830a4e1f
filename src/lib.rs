//! # lazy-settings
//!
//! Layered, lazily-initialized settings merged from files, environment variables
//! and key/value stores such as Redis.
//!
//! ## Overview
//!
//! `lazy-settings` provides a settings library that combines:
//! - Standard precedence (files → key/value stores → env vars)
//! - Lazy initialization: nothing is read until the first access
//! - Provenance: every value remembers which source set it
//! - Writable stores: write, load and delete settings per environment namespace
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lazy_settings::prelude::*;
//! use lazy_settings::sources::{StoreConfig, StoreLoader};
//! use lazy_settings::store::MemoryStore;
//! use serde_json::json;
//!
//! # fn example() -> lazy_settings::error::Result<()> {
//! let store = StoreLoader::new(StoreConfig::from_env("SETTINGS")?, MemoryStore::new());
//!
//! let settings = LazySettings::builder()
//!     .with_file("config/default.yaml")
//!     .with_env_overrides("APP", "__")
//!     .with_environment("production")
//!     .build();
//!
//! // Persist a secret for the production namespace, then pull it in
//! let data = SettingsMap::from([("SECRET".to_string(), json!("s3cr3t"))]);
//! settings.write_to(&store, Some(&data))?;
//! settings.load_from(&store, Some("SECRET"))?;
//!
//! println!("Server port: {:?}", settings.get("server.port")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `validation` (default): typed validation through [`core::Validate`]
//! - `yaml`, `toml` (default via `all-formats`): writing YAML/TOML files
//! - `redis`: the Redis store client [`store::RedisStore`]
//!
//! ```toml
//! [dependencies]
//! lazy-settings = { version = "0.1", features = ["redis"] }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod sources;
pub mod store;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{LazySettings, LazySettingsBuilder, Settings, SettingsMap};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::sources::SourceLoader;

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
