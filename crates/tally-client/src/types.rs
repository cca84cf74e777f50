//! Request and response types for the tally client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{Metadata, UsageRecord};

/// Usage event submission.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUsageRequest {
    /// Idempotency key. Supply a stable value to make retries safe; the
    /// server generates one otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Customer being metered.
    pub customer_id: String,
    /// Catalog service consumed.
    pub service_name: String,
    /// Units consumed.
    pub quantity: f64,
    /// Event time; the server assigns ingestion time when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Additional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl RecordUsageRequest {
    /// Build a minimal submission.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        service_name: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            record_id: None,
            customer_id: customer_id.into(),
            service_name: service_name.into(),
            quantity,
            timestamp: None,
            metadata: None,
        }
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Set an explicit event time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Usage response from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// Whether this call created the record (`false` for an idempotent
    /// replay; both are success).
    pub created: bool,
    /// The stored record.
    pub record: UsageRecord,
}

/// Query for list and aggregate endpoints.
#[derive(Debug, Clone)]
pub struct UsageQuery {
    /// Customer to query.
    pub customer_id: String,
    /// Restrict to one service.
    pub service_name: Option<String>,
    /// Window start, inclusive.
    pub since: Option<DateTime<Utc>>,
    /// Window end, exclusive.
    pub until: Option<DateTime<Utc>>,
}

impl UsageQuery {
    /// Query all usage for a customer.
    #[must_use]
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            service_name: None,
            since: None,
            until: None,
        }
    }

    /// Restrict to one service.
    #[must_use]
    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Restrict to a `[since, until)` window.
    #[must_use]
    pub fn with_window(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("customer_id", self.customer_id.clone())];
        if let Some(service_name) = &self.service_name {
            pairs.push(("service_name", service_name.clone()));
        }
        if let Some(since) = self.since {
            pairs.push(("since", since.to_rfc3339()));
        }
        if let Some(until) = self.until {
            pairs.push(("until", until.to_rfc3339()));
        }
        pairs
    }
}

/// List usage response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsageResponse {
    /// Matching records, ordered by timestamp ascending.
    pub records: Vec<UsageRecord>,
    /// Number of records returned.
    pub count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy).
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

impl HealthResponse {
    /// Whether the service reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Error response body from the API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
