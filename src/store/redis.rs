//! Redis key/value store.

use super::KeyValueStore;
use crate::error::Result;
use crate::sources::StoreConfig;
use parking_lot::Mutex;
use redis::{Client, Commands, Connection};
use std::collections::HashMap;

/// Redis-backed store. Each namespace is one Redis hash.
///
/// The client is created up front, but no connection is opened until the first
/// operation. The connection is then cached and dropped after any failure so
/// that the next operation reconnects.
///
/// # Examples
///
/// ```rust,no_run
/// use lazy_settings::sources::{StoreConfig, StoreLoader};
/// use lazy_settings::store::RedisStore;
///
/// # fn example() -> lazy_settings::error::Result<()> {
/// let config = StoreConfig::from_env("SETTINGS")?;
/// let loader = StoreLoader::new(config.clone(), RedisStore::connect(&config)?);
/// # Ok(())
/// # }
/// ```
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<Connection>>,
}

impl RedisStore {
    /// Create a client for the host, port, database and credentials in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection parameters are invalid.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::open(config.url().as_str())?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut guard = self.connection.lock();
        let mut connection = match guard.take() {
            Some(connection) => connection,
            None => self.client.get_connection()?,
        };

        let result = op(&mut connection)?;
        *guard = Some(connection);
        Ok(result)
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        self.with_connection(|con| con.hget(namespace, key))
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.with_connection(|con| con.hset::<_, _, _, ()>(namespace, key, value))
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        self.with_connection(|con| con.hdel::<_, _, ()>(namespace, key))
    }

    fn scan(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        let fields: HashMap<String, String> =
            self.with_connection(|con| con.hgetall(namespace))?;
        Ok(fields.into_iter().collect())
    }

    fn flush(&self, namespace: &str) -> Result<()> {
        self.with_connection(|con| con.del::<_, ()>(namespace))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
