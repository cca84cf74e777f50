//! Application state.

use std::sync::Arc;

use tally_store::Store;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
///
/// Constructed once at startup and passed into the router; handlers reach
/// the store and configuration through it rather than through globals.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self { store, config }
    }
}
