//! SQLite storage implementation.
//!
//! This module provides the [`SqliteStore`] implementation of the
//! [`Store`](crate::Store) trait.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use tally_core::{
    Customer, CustomerId, CustomerUsageTotals, IdError, RecordId, ServiceEntry, UsageAggregate,
    UsageDraft, UsageFilter, UsageRecord, ValidationError,
};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::{CreateOutcome, Store};

/// SQLite-backed storage implementation.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Raw usage row shape shared by every usage query.
type UsageRow = (String, String, String, f64, DateTime<Utc>, Option<String>);

const USAGE_COLUMNS: &str =
    "record_id, customer_id, service_name, quantity, timestamp, metadata";

impl SqliteStore {
    /// Open or create a SQLite database at the given path and apply the
    /// schema.
    ///
    /// Foreign keys are enabled on every connection; WAL keeps readers
    /// from blocking the single writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        for statement in schema::statements() {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn customer_exists(&self, customer_id: &CustomerId) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = ?)")
                .bind(customer_id.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

fn row_to_record(row: UsageRow) -> Result<UsageRecord> {
    let (record_id, customer_id, service_name, quantity, timestamp, metadata) = row;
    let bad_id = |e: IdError| StoreError::Serialization(e.to_string());
    Ok(UsageRecord {
        record_id: record_id.parse().map_err(bad_id)?,
        customer_id: customer_id.parse().map_err(bad_id)?,
        service_name,
        quantity,
        timestamp,
        metadata: metadata
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
    })
}

fn metadata_to_json(record: &UsageRecord) -> Result<Option<String>> {
    record
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(dbe) if dbe.is_foreign_key_violation())
}

#[async_trait]
impl Store for SqliteStore {
    // =========================================================================
    // Usage Record Operations
    // =========================================================================

    async fn create_usage_record(&self, draft: &UsageDraft) -> Result<CreateOutcome> {
        draft.validate()?;

        let record = draft.clone().into_record(Utc::now());
        let metadata_json = metadata_to_json(&record)?;

        // A single conflict-handling insert: the primary key, not a
        // check-then-insert, arbitrates concurrent identical submissions.
        let inserted = sqlx::query(
            "INSERT INTO usage_records \
                 (record_id, customer_id, service_name, quantity, timestamp, metadata) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(record_id) DO NOTHING",
        )
        .bind(record.record_id.as_str())
        .bind(record.customer_id.as_str())
        .bind(&record.service_name)
        .bind(record.quantity)
        .bind(record.timestamp)
        .bind(metadata_json.as_deref())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(done) if done.rows_affected() > 0 => {
                tracing::debug!(
                    record_id = %record.record_id,
                    customer_id = %record.customer_id,
                    service_name = %record.service_name,
                    "usage record created"
                );
                Ok(CreateOutcome::Created(record))
            }
            Ok(_) => {
                // Lost the conflict: fetch the winner and decide whether
                // this was an identical replay.
                let existing = self
                    .get_usage_record(&record.record_id)
                    .await?
                    .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

                if draft.matches_record(&existing) {
                    tracing::debug!(
                        record_id = %record.record_id,
                        "duplicate submission, returning stored record"
                    );
                    Ok(CreateOutcome::AlreadyExists(existing))
                } else {
                    Err(ValidationError::RecordMismatch {
                        record_id: record.record_id.to_string(),
                    }
                    .into())
                }
            }
            Err(err) if is_foreign_key_violation(&err) => {
                // Work out which reference is missing so the error can
                // name the field.
                if self.customer_exists(&draft.customer_id).await? {
                    Err(ValidationError::UnknownService {
                        service_name: draft.service_name.clone(),
                    }
                    .into())
                } else {
                    Err(ValidationError::UnknownCustomer {
                        customer_id: draft.customer_id.to_string(),
                    }
                    .into())
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_usage_record(&self, record_id: &RecordId) -> Result<Option<UsageRecord>> {
        let sql = format!("SELECT {USAGE_COLUMNS} FROM usage_records WHERE record_id = ?");
        sqlx::query_as::<_, UsageRow>(&sql)
            .bind(record_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_record)
            .transpose()
    }

    async fn list_usage_records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>> {
        let mut sql =
            format!("SELECT {USAGE_COLUMNS} FROM usage_records WHERE customer_id = ?");
        if filter.service_name.is_some() {
            sql.push_str(" AND service_name = ?");
        }
        if filter.since.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        if filter.until.is_some() {
            sql.push_str(" AND timestamp < ?");
        }
        sql.push_str(" ORDER BY timestamp ASC");

        let mut query = sqlx::query_as::<_, UsageRow>(&sql).bind(filter.customer_id.as_str());
        if let Some(service_name) = &filter.service_name {
            query = query.bind(service_name);
        }
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(until) = filter.until {
            query = query.bind(until);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn aggregate_usage(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(quantity), 0.0), COUNT(*) \
             FROM usage_records WHERE customer_id = ?",
        );
        if filter.service_name.is_some() {
            sql.push_str(" AND service_name = ?");
        }
        if filter.since.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        if filter.until.is_some() {
            sql.push_str(" AND timestamp < ?");
        }

        let mut query = sqlx::query_as::<_, (f64, i64)>(&sql).bind(filter.customer_id.as_str());
        if let Some(service_name) = &filter.service_name {
            query = query.bind(service_name);
        }
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(until) = filter.until {
            query = query.bind(until);
        }

        let (total_quantity, record_count) = query.fetch_one(&self.pool).await?;

        let mut aggregate = UsageAggregate::empty(filter);
        aggregate.total_quantity = total_quantity;
        aggregate.record_count = u64::try_from(record_count).unwrap_or(0);
        Ok(aggregate)
    }

    async fn delete_usage_record(&self, record_id: &RecordId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM usage_records WHERE record_id = ?")
            .bind(record_id.as_str())
            .execute(&self.pool)
            .await?;

        let deleted = done.rows_affected() > 0;
        if deleted {
            tracing::info!(record_id = %record_id, "usage record purged");
        }
        Ok(deleted)
    }

    // =========================================================================
    // Customer Operations
    // =========================================================================

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        if self.upsert_customer(customer).await? {
            Ok(())
        } else {
            Err(StoreError::CustomerExists {
                customer_id: customer.customer_id.to_string(),
            })
        }
    }

    async fn upsert_customer(&self, customer: &Customer) -> Result<bool> {
        let done = sqlx::query(
            "INSERT INTO customers (customer_id, name) VALUES (?, ?) \
             ON CONFLICT(customer_id) DO NOTHING",
        )
        .bind(customer.customer_id.as_str())
        .bind(&customer.name)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT customer_id, name FROM customers WHERE customer_id = ?",
        )
        .bind(customer_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, name)| {
            Ok(Customer {
                customer_id: id
                    .parse()
                    .map_err(|e: IdError| StoreError::Serialization(e.to_string()))?,
                name,
            })
        })
        .transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT customer_id, name FROM customers ORDER BY customer_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, name)| {
                Ok(Customer {
                    customer_id: id
                        .parse()
                        .map_err(|e: IdError| StoreError::Serialization(e.to_string()))?,
                    name,
                })
            })
            .collect()
    }

    // =========================================================================
    // Service Catalog Operations
    // =========================================================================

    async fn upsert_service(&self, entry: &ServiceEntry) -> Result<bool> {
        let done = sqlx::query(
            "INSERT INTO services (service_name, unit_rate) VALUES (?, ?) \
             ON CONFLICT(service_name) DO NOTHING",
        )
        .bind(&entry.name)
        .bind(entry.rate)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() > 0 {
            return Ok(true);
        }

        // Existing entry: refresh the rate so reseeding picks up catalog
        // changes.
        sqlx::query("UPDATE services SET unit_rate = ? WHERE service_name = ?")
            .bind(entry.rate)
            .bind(&entry.name)
            .execute(&self.pool)
            .await?;
        Ok(false)
    }

    async fn list_services(&self) -> Result<Vec<ServiceEntry>> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT service_name, unit_rate FROM services ORDER BY service_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, rate)| ServiceEntry { name, rate })
            .collect())
    }

    // =========================================================================
    // Summary Operations
    // =========================================================================

    async fn customer_usage_totals(&self) -> Result<Vec<CustomerUsageTotals>> {
        let rows = sqlx::query_as::<_, (String, String, f64, f64, i64)>(
            "SELECT c.customer_id, c.name, \
                    COALESCE(SUM(u.quantity), 0.0), \
                    COALESCE(SUM(u.quantity * s.unit_rate), 0.0), \
                    COUNT(u.record_id) \
             FROM customers c \
             LEFT JOIN usage_records u ON u.customer_id = c.customer_id \
             LEFT JOIN services s ON s.service_name = u.service_name \
             GROUP BY c.customer_id, c.name \
             ORDER BY c.customer_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, name, total_quantity, total_cost, record_count)| {
                Ok(CustomerUsageTotals {
                    customer_id: id
                        .parse()
                        .map_err(|e: IdError| StoreError::Serialization(e.to_string()))?,
                    name,
                    total_quantity,
                    total_cost,
                    record_count: u64::try_from(record_count).unwrap_or(0),
                })
            })
            .collect()
    }
}
