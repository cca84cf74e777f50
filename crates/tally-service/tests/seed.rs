//! Seed loading integration tests.

use std::sync::Arc;

use tempfile::TempDir;

use tally_service::seed::seed_store;
use tally_service::ServiceConfig;
use tally_store::{SqliteStore, Store};

async fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::open(dir.path().join("tally.db"))
            .await
            .expect("Failed to open store"),
    )
}

#[tokio::test]
async fn seeds_customers_and_catalog_from_files() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let customers_path = dir.path().join("customers.json");
    std::fs::write(
        &customers_path,
        r#"[
            {"customer_id": "c1", "name": "Alice"},
            {"name": "Bob"}
        ]"#,
    )
    .unwrap();

    let catalog_path = dir.path().join("services.json");
    std::fs::write(
        &catalog_path,
        r#"[
            {"name": "compute", "rate": 2.0},
            {"name": "storage", "rate": 0.5}
        ]"#,
    )
    .unwrap();

    let config = ServiceConfig {
        customer_seed_path: Some(customers_path.to_string_lossy().to_string()),
        service_catalog_path: Some(catalog_path.to_string_lossy().to_string()),
        ..ServiceConfig::default()
    };

    seed_store(store.as_ref(), &config).await.unwrap();

    let customers = store.list_customers().await.unwrap();
    assert_eq!(customers.len(), 2);
    assert!(customers.iter().any(|c| c.customer_id.as_str() == "c1"));
    // The id-less entry got a generated id.
    assert!(customers
        .iter()
        .any(|c| c.name == "Bob" && c.customer_id.as_str().starts_with("cust_")));

    let services = store.list_services().await.unwrap();
    assert_eq!(services.len(), 2);
}

#[tokio::test]
async fn reseeding_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let customers_path = dir.path().join("customers.json");
    std::fs::write(
        &customers_path,
        r#"[{"customer_id": "c1", "name": "Alice"}]"#,
    )
    .unwrap();

    let config = ServiceConfig {
        customer_seed_path: Some(customers_path.to_string_lossy().to_string()),
        ..ServiceConfig::default()
    };

    seed_store(store.as_ref(), &config).await.unwrap();
    seed_store(store.as_ref(), &config).await.unwrap();

    assert_eq!(store.list_customers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_catalog_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let config = ServiceConfig::default();
    seed_store(store.as_ref(), &config).await.unwrap();

    let services = store.list_services().await.unwrap();
    assert!(services.iter().any(|s| s.name == "compute"));
    assert!(!services.is_empty());
}

#[tokio::test]
async fn malformed_seed_file_errors() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let customers_path = dir.path().join("customers.json");
    std::fs::write(&customers_path, "not json").unwrap();

    let config = ServiceConfig {
        customer_seed_path: Some(customers_path.to_string_lossy().to_string()),
        ..ServiceConfig::default()
    };

    assert!(seed_store(store.as_ref(), &config).await.is_err());
}
