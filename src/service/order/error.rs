use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),
}
