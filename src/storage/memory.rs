use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::{matches_pattern, DocumentStore, StorageError};

/// Process-local document store, lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            documents: Arc::new(DashMap::with_capacity(capacity)),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.get(key).map(|value| value.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.documents.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        self.documents.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| matches_pattern(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{get_json, set_json};

    #[tokio::test]
    async fn test_keys_by_prefix() {
        let store = MemoryStore::new(4);
        store.set("order:1", "{}".into()).await.unwrap();
        store.set("order:2", "{}".into()).await.unwrap();
        store.set("user:1", "{}".into()).await.unwrap();

        let mut keys = store.keys("order:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["order:1", "order:2"]);
        assert_eq!(store.keys("user:1").await.unwrap(), vec!["user:1"]);
        assert_eq!(store.keys("*").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new(1);
        set_json(&store, "numbers", &vec![1, 2, 3]).await.unwrap();

        let numbers: Option<Vec<i32>> = get_json(&store, "numbers").await.unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        store.del("numbers").await.unwrap();
        let numbers: Option<Vec<i32>> = get_json(&store, "numbers").await.unwrap();
        assert!(numbers.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_serde_error() {
        let store = MemoryStore::new(1);
        store.set("broken", "{not json".into()).await.unwrap();

        let result: Result<Option<Vec<i32>>, _> = get_json(&store, "broken").await;
        assert!(matches!(result, Err(StorageError::Serde(_))));
    }
}
