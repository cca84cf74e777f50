//! Usage event handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{
    CustomerId, Metadata, RecordId, UsageAggregate, UsageDraft, UsageFilter, UsageRecord,
    UsageSummaryRow, ValidationError,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Usage event submission.
///
/// Unknown fields are rejected at the boundary rather than silently
/// dropped, so a caller typo cannot turn into missing data.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordUsageRequest {
    /// Idempotency key. Generated when absent, which makes the write
    /// non-replayable.
    pub record_id: Option<String>,
    /// Customer being metered.
    pub customer_id: String,
    /// Catalog service consumed.
    pub service_name: String,
    /// Units consumed.
    pub quantity: f64,
    /// Event time; assigned by the server when absent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Optional annotations.
    pub metadata: Option<Metadata>,
}

/// Usage response.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Whether this call performed the insert (`false` for an idempotent
    /// replay; both are success).
    pub created: bool,
    /// The stored record.
    pub record: UsageRecord,
}

/// Record a usage event.
///
/// Returns 201 for a fresh record and 200 when an identical submission was
/// already stored; callers retrying over an unreliable network see success
/// either way.
pub async fn record_usage(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordUsageRequest>,
) -> Result<(StatusCode, Json<UsageResponse>), ApiError> {
    let record_id = body
        .record_id
        .map(|raw| raw.parse::<RecordId>())
        .transpose()
        .map_err(ValidationError::RecordId)?;
    let customer_id = body
        .customer_id
        .parse::<CustomerId>()
        .map_err(ValidationError::CustomerId)?;

    let draft = UsageDraft::new(
        record_id,
        customer_id,
        body.service_name,
        body.quantity,
        body.timestamp,
        body.metadata,
    )?;

    tracing::debug!(
        record_id = %draft.record_id,
        customer_id = %draft.customer_id,
        service_name = %draft.service_name,
        "processing usage event"
    );

    let outcome = state.store.create_usage_record(&draft).await?;

    tracing::info!(
        record_id = %outcome.record().record_id,
        customer_id = %outcome.record().customer_id,
        created = outcome.created(),
        "usage recorded"
    );

    let status = if outcome.created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(UsageResponse {
            created: outcome.created(),
            record: outcome.record().clone(),
        }),
    ))
}

/// Fetch a single usage record.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
) -> Result<Json<UsageRecord>, ApiError> {
    let record_id = record_id
        .parse::<RecordId>()
        .map_err(ValidationError::RecordId)?;

    let record = state
        .store
        .get_usage_record(&record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("usage record not found: {record_id}")))?;

    Ok(Json(record))
}

/// Query parameters for list and aggregate endpoints.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Customer to query.
    pub customer_id: String,
    /// Restrict to one service.
    pub service_name: Option<String>,
    /// Window start, inclusive (RFC 3339).
    pub since: Option<DateTime<Utc>>,
    /// Window end, exclusive (RFC 3339).
    pub until: Option<DateTime<Utc>>,
}

impl UsageQuery {
    fn into_filter(self) -> Result<UsageFilter, ApiError> {
        Ok(UsageFilter {
            customer_id: self
                .customer_id
                .parse()
                .map_err(ValidationError::CustomerId)?,
            service_name: self.service_name,
            since: self.since,
            until: self.until,
        })
    }
}

/// List usage response.
#[derive(Debug, Serialize)]
pub struct ListUsageResponse {
    /// Matching records, ordered by timestamp ascending.
    pub records: Vec<UsageRecord>,
    /// Number of records returned.
    pub count: usize,
}

/// List usage records for a customer.
///
/// An unknown customer yields an empty list; the read contract stays
/// forgiving for reporting callers.
pub async fn list_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<ListUsageResponse>, ApiError> {
    let filter = query.into_filter()?;
    let records = state.store.list_usage_records(&filter).await?;
    let count = records.len();

    Ok(Json(ListUsageResponse { records, count }))
}

/// Aggregate usage for a customer over a time window.
///
/// An empty result set yields the zero aggregate, never an error.
pub async fn aggregate_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageAggregate>, ApiError> {
    let filter = query.into_filter()?;
    let aggregate = state.store.aggregate_usage(&filter).await?;

    Ok(Json(aggregate))
}

/// Usage summary response.
#[derive(Debug, Serialize)]
pub struct UsageSummaryResponse {
    /// One row per customer, including customers without usage.
    pub customers: Vec<UsageSummaryRow>,
}

/// Per-customer usage factors and bands across all customers.
pub async fn usage_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsageSummaryResponse>, ApiError> {
    let totals = state.store.customer_usage_totals().await?;
    let customers = totals.iter().map(UsageSummaryRow::from).collect();

    Ok(Json(UsageSummaryResponse { customers }))
}

/// Purge response.
#[derive(Debug, Serialize)]
pub struct PurgeUsageResponse {
    /// The purged record id.
    pub record_id: String,
    /// Whether a row was removed.
    pub deleted: bool,
}

/// Administrative purge of a usage record.
///
/// Usage records are otherwise immutable facts; this is not a normal-path
/// operation.
pub async fn purge_usage(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
) -> Result<Json<PurgeUsageResponse>, ApiError> {
    let record_id = record_id
        .parse::<RecordId>()
        .map_err(ValidationError::RecordId)?;

    let deleted = state.store.delete_usage_record(&record_id).await?;

    Ok(Json(PurgeUsageResponse {
        record_id: record_id.to_string(),
        deleted,
    }))
}
