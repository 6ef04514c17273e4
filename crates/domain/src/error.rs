//! Domain error types.

use store::{ProductId, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request is malformed or violates a field rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Stock cannot cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The write collides with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed for infrastructure reasons.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => DomainError::InsufficientStock {
                product_id,
                requested: u64::from(requested),
                available,
            },
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
            StoreError::Invalid(msg) => DomainError::Validation(msg),
            other => DomainError::Store(other),
        }
    }
}
