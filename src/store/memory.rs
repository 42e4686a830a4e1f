//! In-memory key/value store

use super::KeyValueStore;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// In-memory store (not persisted).
///
/// Clones share the same data, so a clone handed to a loader and one kept by the
/// caller observe each other's writes. Scans return fields in sorted order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Namespaces>>,
}

impl MemoryStore {
    /// Create a new, empty memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the namespaces currently holding at least one field.
    pub fn namespaces(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .data
            .read()
            .get(namespace)
            .and_then(|fields| fields.get(key).cloned()))
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let mut data = self.data.write();
        if let Some(fields) = data.get_mut(namespace) {
            fields.remove(key);
            if fields.is_empty() {
                data.remove(namespace);
            }
        }
        Ok(())
    }

    fn scan(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .data
            .read()
            .get(namespace)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn flush(&self, namespace: &str) -> Result<()> {
        self.data.write().remove(namespace);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
