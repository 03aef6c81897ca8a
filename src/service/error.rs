use crate::{catalog::CatalogError, storage::StorageError};

use super::{order::OrderError, rates::RateError, shop::ShopError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Order error: {0}")]
    Order(#[from] OrderError),
    #[error("Shop error: {0}")]
    Shop(#[from] ShopError),
    #[error("Rate error: {0}")]
    Rate(#[from] RateError),
}
