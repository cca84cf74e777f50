//! Database schema for the tally store.
//!
//! All statements are idempotent (`IF NOT EXISTS`) and applied in order at
//! open, so a fresh database file and an existing one take the same path.

/// Customers keyed by opaque `customer_id`.
pub const CREATE_CUSTOMERS: &str = "\
CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL
)";

/// The service catalog with per-unit rates.
pub const CREATE_SERVICES: &str = "\
CREATE TABLE IF NOT EXISTS services (
    service_name TEXT PRIMARY KEY,
    unit_rate    REAL NOT NULL DEFAULT 0
)";

/// Usage records. The `record_id` primary key is the idempotency
/// constraint that arbitrates duplicate submissions.
pub const CREATE_USAGE_RECORDS: &str = "\
CREATE TABLE IF NOT EXISTS usage_records (
    record_id    TEXT PRIMARY KEY,
    customer_id  TEXT NOT NULL REFERENCES customers(customer_id),
    service_name TEXT NOT NULL REFERENCES services(service_name),
    quantity     REAL NOT NULL,
    timestamp    TEXT NOT NULL,
    metadata     TEXT
)";

/// Index backing per-customer list and aggregate queries.
pub const CREATE_USAGE_BY_CUSTOMER_IDX: &str = "\
CREATE INDEX IF NOT EXISTS usage_records_by_customer_time
    ON usage_records (customer_id, timestamp)";

/// All schema statements in application order.
#[must_use]
pub fn statements() -> [&'static str; 4] {
    [
        CREATE_CUSTOMERS,
        CREATE_SERVICES,
        CREATE_USAGE_RECORDS,
        CREATE_USAGE_BY_CUSTOMER_IDX,
    ]
}
