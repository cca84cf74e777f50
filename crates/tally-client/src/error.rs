//! Client error types.

/// Errors that can occur when using the tally client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed for a non-transient reason.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The server rejected a request field. Replaying the call cannot
    /// succeed, so this is never retried.
    #[error("validation failed on {field}: {message}")]
    Validation {
        /// The failing request field.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// Query target absent.
    #[error("not found: {message}")]
    NotFound {
        /// Server-provided detail.
        message: String,
    },

    /// Resource already exists (customer creation).
    #[error("conflict: {message}")]
    Conflict {
        /// Server-provided detail.
        message: String,
    },

    /// The bounded retry budget ran out on transient failures.
    ///
    /// The event was never acknowledged; with a caller-supplied
    /// `record_id` the whole call is safe to repeat later.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// How many attempts were made.
        attempts: u32,
        /// The final failure, for diagnostics.
        last: String,
    },
}

impl ClientError {
    /// Whether repeating the call might succeed.
    ///
    /// Validation failures, misses, and conflicts are deterministic;
    /// transient exhaustion and server-side errors are worth another
    /// attempt later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RetriesExhausted { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(_) | Self::Validation { .. } | Self::NotFound { .. } | Self::Conflict { .. } => {
                false
            }
        }
    }
}
