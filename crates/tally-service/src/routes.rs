//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{customers, health, usage};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Health
/// - `GET /health` - Liveness probe
///
/// ## Usage
/// - `POST /usage` - Record a usage event (idempotent on `record_id`)
/// - `GET /usage` - List usage records for a customer
/// - `GET /usage/aggregate` - Aggregate usage over a time window
/// - `GET /usage/summary` - Per-customer usage factors and bands
/// - `GET /usage/{record_id}` - Fetch one record
/// - `DELETE /usage/{record_id}` - Administrative purge
///
/// ## Customers & catalog
/// - `POST /customers` - Create a customer
/// - `GET /customers` - List customers
/// - `GET /customers/{customer_id}` - Fetch one customer
/// - `GET /services` - The loaded service catalog
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health
        .route("/health", get(health::health))
        // Usage (static segments before the capture)
        .route("/usage", post(usage::record_usage).get(usage::list_usage))
        .route("/usage/aggregate", get(usage::aggregate_usage))
        .route("/usage/summary", get(usage::usage_summary))
        .route(
            "/usage/:record_id",
            get(usage::get_usage).delete(usage::purge_usage),
        )
        // Customers & catalog
        .route(
            "/customers",
            post(customers::create_customer).get(customers::list_customers),
        )
        .route("/customers/:customer_id", get(customers::get_customer))
        .route("/services", get(customers::list_services))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
