//! Tally Service - HTTP API for usage metering.
//!
//! This crate exposes the tally persistence layer over HTTP: usage
//! ingestion with idempotent-write semantics, query and aggregation
//! endpoints, customer management, the service catalog, and a liveness
//! probe.
//!
//! The binary entry point lives in `main.rs`; everything here is also
//! available as a library so integration tests can stand up the full
//! router against a temporary database.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
