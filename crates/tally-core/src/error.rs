//! Validation errors for tally.

use crate::ids::IdError;

/// A rejected write or query input.
///
/// Each variant names the field or constraint that failed so API responses
/// can report it precisely. Validation failures are never retried by
/// clients: replaying the same input cannot succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The record id is malformed.
    #[error("invalid record_id: {0}")]
    RecordId(#[source] IdError),

    /// The customer id is malformed.
    #[error("invalid customer_id: {0}")]
    CustomerId(#[source] IdError),

    /// The service name is empty.
    #[error("service_name must not be empty")]
    EmptyServiceName,

    /// The customer display name is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// Negative usage quantities are meaningless.
    #[error("quantity must be non-negative, got {quantity}")]
    NegativeQuantity {
        /// The rejected value.
        quantity: f64,
    },

    /// NaN or infinite quantity.
    #[error("quantity must be a finite number")]
    NonFiniteQuantity,

    /// The referenced customer does not exist.
    #[error("unknown customer: {customer_id}")]
    UnknownCustomer {
        /// The id that failed the referential check.
        customer_id: String,
    },

    /// The referenced service is not in the catalog.
    #[error("unknown service: {service_name}")]
    UnknownService {
        /// The name that failed the referential check.
        service_name: String,
    },

    /// A record with this id exists but its payload differs.
    ///
    /// Idempotency only masks byte-identical retries; reusing a record id
    /// for different usage is a data-integrity violation.
    #[error("record {record_id} already exists with a different payload")]
    RecordMismatch {
        /// The conflicting record id.
        record_id: String,
    },
}

impl ValidationError {
    /// Name of the request field this error applies to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::RecordId(_) | Self::RecordMismatch { .. } => "record_id",
            Self::CustomerId(_) | Self::UnknownCustomer { .. } => "customer_id",
            Self::EmptyServiceName | Self::UnknownService { .. } => "service_name",
            Self::EmptyName => "name",
            Self::NegativeQuantity { .. } | Self::NonFiniteQuantity => "quantity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_variants() {
        assert_eq!(
            ValidationError::NegativeQuantity { quantity: -1.0 }.field(),
            "quantity"
        );
        assert_eq!(
            ValidationError::UnknownCustomer {
                customer_id: "c1".into()
            }
            .field(),
            "customer_id"
        );
        assert_eq!(
            ValidationError::RecordMismatch {
                record_id: "r1".into()
            }
            .field(),
            "record_id"
        );
    }
}
