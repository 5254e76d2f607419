use uuid::Uuid;

use crate::store::StoreError;

/// The single error type returned by every engine operation.
///
/// `NotFound` and `InsufficientInventory` are recoverable by the caller;
/// `CyclicRecipe` signals corrupt master data and aborts the whole
/// computation rather than returning a partial number.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Cyclic recipe reference involving {0}")]
    CyclicRecipe(Uuid),

    #[error("Insufficient inventory: {0}")]
    InsufficientInventory(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} {} not found", what, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }
}
