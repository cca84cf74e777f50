//! Error types for tally storage.

use tally_core::ValidationError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A constraint on the input failed (bad quantity, unknown reference,
    /// conflicting replay). Distinct from engine failures; not retryable.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Customer id already taken.
    #[error("customer already exists: {customer_id}")]
    CustomerExists {
        /// The duplicate id.
        customer_id: String,
    },

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// The id that missed.
        id: String,
    },

    /// The storage engine failed. Surfaced to the caller unretried;
    /// retries are the caller's responsibility.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded (bad metadata JSON, bad id).
    #[error("serialization error: {0}")]
    Serialization(String),
}
