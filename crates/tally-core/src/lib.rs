//! Core types and utilities for tally.
//!
//! This crate provides the foundational types used throughout the tally
//! usage-metering platform:
//!
//! - **Identifiers**: `CustomerId`, `RecordId`
//! - **Customers**: `Customer`
//! - **Usage**: `UsageRecord`, `UsageDraft`, `UsageFilter`, `UsageAggregate`
//! - **Catalog**: `ServiceEntry`, the fixed list of meterable services
//! - **Summaries**: `UsageBand`, per-customer usage factors
//!
//! # Idempotency key
//!
//! Every usage record carries a `record_id` that doubles as its idempotency
//! key. Submitting the same `record_id` twice never creates a second row:
//! the stored record is returned unchanged. A resubmission whose payload
//! differs from the stored row is rejected as a validation error, so the
//! key only ever masks identical retries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod customer;
pub mod error;
pub mod ids;
pub mod record;
pub mod summary;

pub use catalog::{default_catalog, ServiceEntry};
pub use customer::Customer;
pub use error::ValidationError;
pub use ids::{CustomerId, IdError, RecordId};
pub use record::{Metadata, UsageAggregate, UsageDraft, UsageFilter, UsageRecord};
pub use summary::{
    classify, usage_factor, CustomerUsageTotals, UsageBand, UsageSummaryRow,
    LOW_ACTIVITY_THRESHOLD, MEDIUM_ACTIVITY_THRESHOLD,
};
