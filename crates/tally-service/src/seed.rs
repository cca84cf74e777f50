//! Seed data loading.
//!
//! At startup the service loads the customer list and service catalog from
//! JSON files named in the configuration. Seeding goes through the same
//! idempotent upserts the store exposes, so restarting the service (or
//! pointing two processes at one database) never duplicates rows and no
//! external "already initialized" marker is needed.

use serde::Deserialize;

use tally_core::{default_catalog, Customer, CustomerId, ServiceEntry, ValidationError};
use tally_store::Store;

use crate::config::ServiceConfig;

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// A seed file could not be read.
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// A seed file is not valid JSON of the expected shape.
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A seed entry failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store rejected a seed write.
    #[error(transparent)]
    Store(#[from] tally_store::StoreError),
}

/// One customer entry in the seed file.
#[derive(Debug, Deserialize)]
struct CustomerSeed {
    /// Explicit id; generated when omitted.
    #[serde(default)]
    customer_id: Option<String>,
    name: String,
}

/// Apply seed data to the store.
///
/// The service catalog always gets seeded: from the configured file when
/// present, otherwise from the built-in defaults, so referential checks
/// have a live catalog from the first request.
///
/// # Errors
///
/// Returns a [`SeedError`] if a configured file is missing or malformed,
/// or if the store rejects a write.
pub async fn seed_store(store: &dyn Store, config: &ServiceConfig) -> Result<(), SeedError> {
    seed_services(store, config.service_catalog_path.as_deref()).await?;

    if let Some(path) = config.customer_seed_path.as_deref() {
        seed_customers(store, path).await?;
    } else {
        tracing::debug!("no customer seed file configured, skipping");
    }

    Ok(())
}

async fn seed_services(store: &dyn Store, path: Option<&str>) -> Result<(), SeedError> {
    let (entries, source) = match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            let entries: Vec<ServiceEntry> = serde_json::from_str(&raw)?;
            (entries, path.to_string())
        }
        None => (default_catalog(), "built-in defaults".to_string()),
    };

    let mut inserted = 0usize;
    let total = entries.len();
    for entry in &entries {
        if store.upsert_service(entry).await? {
            inserted += 1;
        }
    }

    tracing::info!(source = %source, total, inserted, "service catalog seeded");
    Ok(())
}

async fn seed_customers(store: &dyn Store, path: &str) -> Result<(), SeedError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let seeds: Vec<CustomerSeed> = serde_json::from_str(&raw)?;

    let mut inserted = 0usize;
    let total = seeds.len();
    for seed in seeds {
        let customer = match seed.customer_id {
            Some(raw_id) => {
                let id = raw_id
                    .parse::<CustomerId>()
                    .map_err(ValidationError::CustomerId)?;
                Customer::new(id, seed.name)?
            }
            None => Customer::with_generated_id(seed.name)?,
        };
        if store.upsert_customer(&customer).await? {
            inserted += 1;
        }
    }

    tracing::info!(path = %path, total, inserted, "customer seed applied");
    Ok(())
}
