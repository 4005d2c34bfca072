use thiserror::Error;

/// Failures reported by a `PaymentStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another row already holds this reference.
    #[error("duplicate payment reference: {0}")]
    DuplicateKey(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("store inconsistency: {0}")]
    Inconsistent(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}

/// Failures surfaced by the payment coordinator to the transport layer.
///
/// `StoreError::DuplicateKey` never reaches this type from `create`; it is
/// resolved into a replay instead.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid payment payload: {0}")]
    InvalidPayload(String),

    #[error("payment {0} not found")]
    NotFound(i32),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl PaymentError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PaymentError::InvalidPayload(message.into())
    }
}
