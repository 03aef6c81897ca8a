use std::sync::Arc;

use model::DialogueState;
use teloxide::dispatching::dialogue::{serializer::Json, ErasedStorage, InMemStorage, RedisStorage, Storage};

use crate::{config::DialogueConfig, storage::StorageError};

use super::ServiceError;

pub mod model;

pub type DialogueStorage = ErasedStorage<DialogueState>;

pub struct DialogueService;

impl DialogueService {
    pub async fn get_dialogue_storage(config: &DialogueConfig) -> Result<Arc<DialogueStorage>, ServiceError> {
        if !config.use_redis {
            info!("Using in-memory dialogue storage");
            return Ok(InMemStorage::<DialogueState>::new().erase());
        }

        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| StorageError::Other("REDIS_URL is required for redis dialogues".to_string()))?;

        info!("Using redis dialogue storage");
        let storage = RedisStorage::open(url, Json)
            .await
            .map_err(|e| StorageError::Redis(e.to_string()))?
            .erase();

        Ok(storage)
    }
}
