use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};

use std::sync::Arc;

use crate::storage::StorageError;

use super::DocumentStore;

#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<redis::Client>,
}

impl RedisStore {
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        info!("Initializing RedisStore...");
        let redis = Arc::new(Client::open(url)?);

        let mut conn = redis.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(StorageError::Redis("Redis connection test failed".to_string()));
        }
        info!("Redis connection test successful");
        info!("RedisStore initialized");
        Ok(Self { inner: redis })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, StorageError> {
        let conn = self.inner.get_multiplexed_async_connection().await?;
        Ok(conn)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        conn.del::<_, i32>(key).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}
