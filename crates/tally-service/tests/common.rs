//! Common test utilities for tally integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use tally_core::{Customer, CustomerId, ServiceEntry};
use tally_service::{create_router, AppState, ServiceConfig};
use tally_store::{SqliteStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh seeded database.
    ///
    /// Seeds customers `c1` (Alice) and `c2` (Bob), and services
    /// `compute` (rate 2.0) and `storage` (rate 0.5).
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SqliteStore::open(temp_dir.path().join("tally.db"))
            .await
            .expect("Failed to open store");

        for (id, name) in [("c1", "Alice"), ("c2", "Bob")] {
            let customer = Customer::new(CustomerId::new(id).unwrap(), name).unwrap();
            store.upsert_customer(&customer).await.unwrap();
        }
        store
            .upsert_service(&ServiceEntry::new("compute", 2.0))
            .await
            .unwrap();
        store
            .upsert_service(&ServiceEntry::new("storage", 0.5))
            .await
            .unwrap();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            database_path: temp_dir
                .path()
                .join("tally.db")
                .to_string_lossy()
                .to_string(),
            customer_seed_path: None,
            service_catalog_path: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
        }
    }
}
