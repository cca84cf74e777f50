//! Customer and service catalog handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_core::{Customer, CustomerId, ServiceEntry, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// Create customer request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    /// Customer id; generated as `cust_<uuid>` when absent.
    pub customer_id: Option<String>,
    /// Display name.
    pub name: String,
}

/// Create a customer.
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = match body.customer_id {
        Some(raw) => {
            let id = raw.parse::<CustomerId>().map_err(ValidationError::CustomerId)?;
            Customer::new(id, body.name)?
        }
        None => Customer::with_generated_id(body.name)?,
    };

    state.store.create_customer(&customer).await?;

    tracing::info!(customer_id = %customer.customer_id, "customer created");

    Ok((StatusCode::CREATED, Json(customer)))
}

/// Fetch a single customer.
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer_id = customer_id
        .parse::<CustomerId>()
        .map_err(ValidationError::CustomerId)?;

    let customer = state
        .store
        .get_customer(&customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("customer not found: {customer_id}")))?;

    Ok(Json(customer))
}

/// List customers response.
#[derive(Debug, Serialize)]
pub struct ListCustomersResponse {
    /// All customers, ordered by id.
    pub customers: Vec<Customer>,
    /// Number of customers.
    pub count: usize,
}

/// List all customers.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListCustomersResponse>, ApiError> {
    let customers = state.store.list_customers().await?;
    let count = customers.len();

    Ok(Json(ListCustomersResponse { customers, count }))
}

/// Service catalog response.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// The loaded catalog, ordered by name.
    pub services: Vec<ServiceEntry>,
}

/// List the service catalog.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let services = state.store.list_services().await?;

    Ok(Json(CatalogResponse { services }))
}
