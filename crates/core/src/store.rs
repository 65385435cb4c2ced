use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("stored value under `{key}` could not be decoded: {message}")]
    Decode { key: String, message: String },
}

/// Key-value contract for state that must survive a restart.
///
/// Values are JSON blobs; each consumer owns one fixed key.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PersistentStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{InMemoryStore, PersistentStore};

    #[tokio::test]
    async fn in_memory_store_overwrites_under_same_key() {
        let store = InMemoryStore::default();
        assert!(store.is_empty().await);

        store.set("footprint.wizard", json!({"currentStep": "select"})).await.expect("first set");
        store.set("footprint.wizard", json!({"currentStep": "edit"})).await.expect("second set");

        let value = store.get("footprint.wizard").await.expect("get");
        assert_eq!(value, Some(json!({"currentStep": "edit"})));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = InMemoryStore::default();
        assert_eq!(store.get("absent").await.expect("get"), None);
    }
}
