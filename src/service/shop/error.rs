use crate::service::order::OrderError;

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Selection is no longer available")]
    StaleSelection,
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("No wallet configured for {0}")]
    NoWalletConfigured(String),
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => ShopError::NotFound(format!("order {}", id)),
            OrderError::Persistence(e) => ShopError::PersistenceFailure(e.to_string()),
        }
    }
}
