//! Usage record types for tally.
//!
//! A usage record is an immutable fact: one unit of service consumption by
//! a customer. Records enter the system as a [`UsageDraft`] (validated,
//! possibly missing server-assigned fields) and are stored as a
//! [`UsageRecord`]. Queries filter with [`UsageFilter`] and aggregate into
//! [`UsageAggregate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::{CustomerId, RecordId};

/// Free-form key/value annotations attached to a usage record.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored usage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique record id, doubling as the idempotency key.
    pub record_id: RecordId,

    /// The customer the usage is attributed to.
    pub customer_id: CustomerId,

    /// Which catalog service was consumed.
    pub service_name: String,

    /// Units consumed. Non-negative and finite.
    pub quantity: f64,

    /// Event time: caller-supplied, or assigned by the service at ingestion.
    pub timestamp: DateTime<Utc>,

    /// Optional annotations (`session_id`, `region`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A validated usage event awaiting insertion.
///
/// Drafts carry the caller's view of the event. `timestamp` stays `None`
/// when the caller left event time to the server; in that case a retry of
/// the same draft matches the stored record whatever time was assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageDraft {
    /// Record id, generated when the caller supplied none.
    pub record_id: RecordId,

    /// The customer being metered.
    pub customer_id: CustomerId,

    /// Which catalog service was consumed.
    pub service_name: String,

    /// Units consumed.
    pub quantity: f64,

    /// Caller-supplied event time, if any.
    pub timestamp: Option<DateTime<Utc>>,

    /// Optional annotations.
    pub metadata: Option<Metadata>,
}

impl UsageDraft {
    /// Build a validated draft.
    ///
    /// A missing `record_id` gets a generated UUID, which makes the write
    /// non-replayable; callers that retry must pass their own key.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty service name or a
    /// negative or non-finite quantity.
    pub fn new(
        record_id: Option<RecordId>,
        customer_id: CustomerId,
        service_name: impl Into<String>,
        quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        metadata: Option<Metadata>,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            record_id: record_id.unwrap_or_else(RecordId::generate),
            customer_id,
            service_name: service_name.into(),
            quantity,
            timestamp,
            metadata,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Re-check the draft's field constraints.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_name.trim().is_empty() {
            return Err(ValidationError::EmptyServiceName);
        }
        if !self.quantity.is_finite() {
            return Err(ValidationError::NonFiniteQuantity);
        }
        if self.quantity < 0.0 {
            return Err(ValidationError::NegativeQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }

    /// Materialize the draft into a record, filling in event time where the
    /// caller left it to the server.
    #[must_use]
    pub fn into_record(self, assigned_at: DateTime<Utc>) -> UsageRecord {
        UsageRecord {
            record_id: self.record_id,
            customer_id: self.customer_id,
            service_name: self.service_name,
            quantity: self.quantity,
            timestamp: self.timestamp.unwrap_or(assigned_at),
            metadata: self.metadata,
        }
    }

    /// Whether a stored record is an identical replay of this draft.
    ///
    /// All caller-supplied fields must match; the timestamp is only
    /// compared when the draft carries one, since a server-assigned time
    /// is not part of the caller's payload.
    #[must_use]
    pub fn matches_record(&self, record: &UsageRecord) -> bool {
        self.customer_id == record.customer_id
            && self.service_name == record.service_name
            && self.quantity.to_bits() == record.quantity.to_bits()
            && self.metadata == record.metadata
            && self.timestamp.map_or(true, |t| t == record.timestamp)
    }
}

/// Query filter over stored usage records.
///
/// The time window is inclusive at `since` and exclusive at `until`, so
/// adjacent windows never double-count a record on the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageFilter {
    /// The customer whose usage is queried.
    pub customer_id: CustomerId,

    /// Restrict to a single service, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Window start (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,

    /// Window end (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl UsageFilter {
    /// Filter for all of a customer's usage.
    #[must_use]
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            service_name: None,
            since: None,
            until: None,
        }
    }
}

/// A derived sum over usage records. Never stored; recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAggregate {
    /// The customer aggregated over.
    pub customer_id: CustomerId,

    /// The service restriction, if the query had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Window start (inclusive), echoed from the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,

    /// Window end (exclusive), echoed from the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,

    /// Sum of `quantity` over matching records.
    pub total_quantity: f64,

    /// Number of matching records.
    pub record_count: u64,
}

impl UsageAggregate {
    /// The zero aggregate for a filter that matched nothing.
    #[must_use]
    pub fn empty(filter: &UsageFilter) -> Self {
        Self {
            customer_id: filter.customer_id.clone(),
            service_name: filter.service_name.clone(),
            since: filter.since,
            until: filter.until,
            total_quantity: 0.0,
            record_count: 0,
        }
    }
}
