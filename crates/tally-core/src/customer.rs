//! Customer types for tally.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::CustomerId;

/// A customer that consumes metered services.
///
/// Customers are created at seed time or through the API and are
/// read-mostly afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer id.
    pub customer_id: CustomerId,

    /// Display name.
    pub name: String,
}

impl Customer {
    /// Build a customer with an explicit id.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the display name is empty.
    pub fn new(customer_id: CustomerId, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self { customer_id, name })
    }

    /// Build a customer with a generated `cust_<uuid>` id.
    ///
    /// Seed files list bare display names; ids are minted here.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the display name is empty.
    pub fn with_generated_id(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(CustomerId::generate(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_rejected() {
        let id = CustomerId::new("c1").unwrap();
        assert_eq!(Customer::new(id, "  "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn generated_ids_carry_prefix() {
        let customer = Customer::with_generated_id("Alice").unwrap();
        assert!(customer.customer_id.as_str().starts_with("cust_"));
        assert_eq!(customer.name, "Alice");
    }
}
