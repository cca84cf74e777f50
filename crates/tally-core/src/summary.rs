//! Per-customer usage summaries.
//!
//! A customer's usage factor condenses their records into one number:
//! `total_quantity * total_cost / record_count`, where each record's cost
//! prices its quantity at the service's catalog rate. The factor maps onto
//! a coarse band for reporting.

use serde::{Deserialize, Serialize};

use crate::ids::CustomerId;

/// Factors below this are `Low` usage.
///
/// The thresholds are placeholder calibrations; tune them against real
/// usage distributions per deployment.
pub const LOW_ACTIVITY_THRESHOLD: f64 = 50.0;

/// Factors below this are `Medium` usage; at or above, `High`.
pub const MEDIUM_ACTIVITY_THRESHOLD: f64 = 200.0;

/// Coarse usage classification for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageBand {
    /// No recorded usage.
    Inactive,
    /// Factor below [`LOW_ACTIVITY_THRESHOLD`].
    Low,
    /// Factor below [`MEDIUM_ACTIVITY_THRESHOLD`].
    Medium,
    /// Everything above.
    High,
}

impl UsageBand {
    /// The band name as a string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Compute a customer's usage factor.
///
/// Returns `0.0` when there are no records, so customers without usage
/// classify as [`UsageBand::Inactive`] rather than erroring.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn usage_factor(total_quantity: f64, total_cost: f64, record_count: u64) -> f64 {
    if record_count == 0 {
        return 0.0;
    }
    (total_quantity * total_cost) / record_count as f64
}

/// Map a usage factor onto its band.
#[must_use]
pub fn classify(factor: f64) -> UsageBand {
    if factor == 0.0 {
        UsageBand::Inactive
    } else if factor < LOW_ACTIVITY_THRESHOLD {
        UsageBand::Low
    } else if factor < MEDIUM_ACTIVITY_THRESHOLD {
        UsageBand::Medium
    } else {
        UsageBand::High
    }
}

/// Raw per-customer totals as computed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerUsageTotals {
    /// The customer.
    pub customer_id: CustomerId,

    /// Display name.
    pub name: String,

    /// Sum of record quantities.
    pub total_quantity: f64,

    /// Sum of quantities priced at catalog rates.
    pub total_cost: f64,

    /// Number of usage records.
    pub record_count: u64,
}

/// One row of the usage summary report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummaryRow {
    /// The customer.
    pub customer_id: CustomerId,

    /// Display name.
    pub name: String,

    /// The computed usage factor.
    pub usage_factor: f64,

    /// The factor's band.
    pub band: UsageBand,
}

impl From<&CustomerUsageTotals> for UsageSummaryRow {
    fn from(totals: &CustomerUsageTotals) -> Self {
        let factor = usage_factor(totals.total_quantity, totals.total_cost, totals.record_count);
        Self {
            customer_id: totals.customer_id.clone(),
            name: totals.name.clone(),
            usage_factor: factor,
            band: classify(factor),
        }
    }
}
