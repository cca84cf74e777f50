//! SQLite storage layer for tally.
//!
//! This crate persists customers, the service catalog, and usage records in
//! a single embedded SQLite database via `sqlx`.
//!
//! # Idempotent writes
//!
//! `usage_records.record_id` is the primary key, and
//! [`Store::create_usage_record`] inserts with `ON CONFLICT DO NOTHING`
//! inside one transaction. The constraint, not an application-level
//! existence check, arbitrates concurrent identical submissions: the
//! losing writer reads the winner's row and reports
//! [`CreateOutcome::AlreadyExists`] instead of failing.
//!
//! # Example
//!
//! ```no_run
//! use tally_core::{Customer, CustomerId, UsageDraft};
//! use tally_store::{SqliteStore, Store};
//!
//! # async fn example() -> Result<(), tally_store::StoreError> {
//! let store = SqliteStore::open("/tmp/tally.db").await?;
//!
//! let customer_id = CustomerId::new("cust_1").unwrap();
//! let customer = Customer::new(customer_id.clone(), "Alice").unwrap();
//! store.create_customer(&customer).await?;
//!
//! let draft = UsageDraft::new(None, customer_id, "compute", 5.0, None, None)?;
//! let outcome = store.create_usage_record(&draft).await?;
//! assert!(outcome.created());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use tally_core::{
    Customer, CustomerId, CustomerUsageTotals, RecordId, ServiceEntry, UsageAggregate, UsageDraft,
    UsageFilter, UsageRecord,
};

/// Outcome of an idempotent usage write.
///
/// Both variants are success: the caller's event is durably stored exactly
/// once either way.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The record was inserted by this call.
    Created(UsageRecord),

    /// An identical record with this id already existed; it is returned
    /// unchanged.
    AlreadyExists(UsageRecord),
}

impl CreateOutcome {
    /// The stored record, whichever way it got there.
    #[must_use]
    pub fn record(&self) -> &UsageRecord {
        match self {
            Self::Created(record) | Self::AlreadyExists(record) => record,
        }
    }

    /// Whether this call performed the insert.
    #[must_use]
    pub fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// The storage trait defining all database operations.
///
/// This abstracts the storage layer so the service and tests depend on the
/// contract rather than on SQLite directly.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Usage Record Operations
    // =========================================================================

    /// Insert a usage record iff its `record_id` is absent.
    ///
    /// The referential checks and the conflict-handling insert run in a
    /// single transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` for a negative/non-finite quantity, an
    ///   unknown customer or service, or a conflicting record whose payload
    ///   differs from the draft.
    /// - `StoreError::Database` if the engine fails; never retried here.
    async fn create_usage_record(&self, draft: &UsageDraft) -> Result<CreateOutcome>;

    /// Get a usage record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_usage_record(&self, record_id: &RecordId) -> Result<Option<UsageRecord>>;

    /// List records matching the filter, ordered by timestamp ascending.
    ///
    /// An unknown customer yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_usage_records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>>;

    /// Sum quantities over matching records.
    ///
    /// An empty result set yields the zero aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn aggregate_usage(&self, filter: &UsageFilter) -> Result<UsageAggregate>;

    /// Administrative purge. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn delete_usage_record(&self, record_id: &RecordId) -> Result<bool>;

    // =========================================================================
    // Customer Operations
    // =========================================================================

    /// Insert a customer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CustomerExists` if the id is taken.
    async fn create_customer(&self, customer: &Customer) -> Result<()>;

    /// Insert a customer if absent. Returns whether a row was inserted.
    ///
    /// Used by idempotent seeding; re-running a seed file is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn upsert_customer(&self, customer: &Customer) -> Result<bool>;

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<Customer>>;

    /// List all customers, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    // =========================================================================
    // Service Catalog Operations
    // =========================================================================

    /// Insert or update a catalog entry. Returns whether a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn upsert_service(&self, entry: &ServiceEntry) -> Result<bool>;

    /// List the loaded catalog, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_services(&self) -> Result<Vec<ServiceEntry>>;

    // =========================================================================
    // Summary Operations
    // =========================================================================

    /// Per-customer usage totals with quantities priced at catalog rates.
    ///
    /// Customers without usage appear with zero totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn customer_usage_totals(&self) -> Result<Vec<CustomerUsageTotals>>;
}
