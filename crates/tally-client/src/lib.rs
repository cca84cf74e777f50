//! Tally Client SDK.
//!
//! This crate provides a client library for callers that report usage to
//! the tally service.
//!
//! Transient failures (connection errors, timeouts, 5xx) are retried with
//! exponential backoff up to a bounded attempt budget. Because ingestion
//! is idempotent server-side, a retry after an ambiguous failure is safe
//! as long as the caller supplies its own `record_id`. Validation
//! failures are never retried: they cannot succeed on replay.
//!
//! # Example
//!
//! ```no_run
//! use tally_client::{RecordUsageRequest, TallyClient};
//!
//! # async fn example() -> Result<(), tally_client::ClientError> {
//! let client = TallyClient::new("http://tally.metering.svc:8080");
//!
//! let response = client
//!     .record_usage(
//!         RecordUsageRequest::new("c1", "compute", 5.0).with_record_id("r1"),
//!     )
//!     .await?;
//!
//! println!(
//!     "stored record {} (created: {})",
//!     response.record.record_id, response.created
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, TallyClient};
pub use error::ClientError;
pub use types::*;

// Domain types callers receive back from queries.
pub use tally_core::{Metadata, UsageAggregate, UsageRecord};
