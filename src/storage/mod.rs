mod error;
mod memory;
mod redis_store;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Key-value document store. Values are JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn del(&self, key: &str) -> Result<(), StorageError>;
    /// Supports redis-style patterns ending in `*`, or exact keys.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StorageError>;
}

pub async fn get_json<T: DeserializeOwned>(store: &dyn DocumentStore, key: &str) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + Sync>(store: &dyn DocumentStore, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}

pub(crate) fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}

pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new(config.memory_capacity)))
        }
        StorageBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| StorageError::Other("REDIS_URL is required for the redis backend".to_string()))?;
            Ok(Arc::new(RedisStore::new(url).await?))
        }
    }
}
