//! Key/value store clients used by [`StoreLoader`](crate::sources::StoreLoader).
//!
//! A store is partitioned into namespaces (one per environment); each namespace
//! holds string fields. Backends:
//! - **Memory**: process-local, shared between clones - always available
//! - **Redis**: one hash per namespace - requires the `redis` feature

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use crate::error::Result;

/// Trait for key/value store backends.
pub trait KeyValueStore: Send + Sync {
    /// Read one field.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Write one field, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Remove one field. Removing an absent field succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    /// All fields of a namespace. Order is backend-defined.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn scan(&self, namespace: &str) -> Result<Vec<(String, String)>>;

    /// Remove the whole namespace. Flushing an empty namespace succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn flush(&self, namespace: &str) -> Result<()>;

    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;
}
