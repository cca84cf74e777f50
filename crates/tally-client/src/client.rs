//! Tally HTTP client implementation.

use std::time::Duration;

use reqwest::Client;

use tally_core::UsageAggregate;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, HealthResponse, ListUsageResponse, RecordUsageRequest, UsageQuery,
    UsageResponse,
};

/// Tally API client.
///
/// Provides methods for reporting usage and querying it back, with a
/// bounded retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct TallyClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl TallyClient {
    /// Create a new tally client with default options.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the tally service (e.g., `"http://tally:8080"`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new tally client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_attempts: options.max_attempts.max(1),
            initial_backoff: Duration::from_millis(options.initial_backoff_ms),
        }
    }

    /// Report a usage event.
    ///
    /// Transient failures are retried with backoff; because ingestion is
    /// idempotent on `record_id`, a retry after an ambiguous failure
    /// (timeout with unknown outcome) cannot double-record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the retry budget or the
    /// server rejects it.
    pub async fn record_usage(
        &self,
        request: RecordUsageRequest,
    ) -> Result<UsageResponse, ClientError> {
        let url = format!("{}/usage", self.base_url);
        let record_id = request.record_id.clone();

        let result: Result<UsageResponse, ClientError> = self
            .execute_with_retry("POST /usage", || self.client.post(&url).json(&request))
            .await;

        // Log the outcome with identifiers only, never the payload.
        match &result {
            Ok(response) if response.created => {
                tracing::info!(record_id = %response.record.record_id, "usage recorded");
            }
            Ok(response) => {
                tracing::info!(
                    record_id = %response.record.record_id,
                    "usage already recorded, replay absorbed"
                );
            }
            Err(ClientError::Validation { field, .. }) => {
                tracing::error!(
                    record_id = ?record_id,
                    field = %field,
                    "usage rejected by validation, not retried"
                );
            }
            Err(err) => {
                tracing::error!(
                    record_id = ?record_id,
                    error = %err,
                    "usage submission failed"
                );
            }
        }

        result
    }

    /// Fetch a single usage record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the record does not exist, or
    /// another error if the request fails.
    pub async fn get_usage(
        &self,
        record_id: impl AsRef<str>,
    ) -> Result<tally_core::UsageRecord, ClientError> {
        let url = format!("{}/usage/{}", self.base_url, record_id.as_ref());
        self.execute_with_retry("GET /usage/{record_id}", || self.client.get(&url))
            .await
    }

    /// List usage records for a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the retry budget.
    pub async fn list_usage(&self, query: &UsageQuery) -> Result<ListUsageResponse, ClientError> {
        let url = format!("{}/usage", self.base_url);
        let pairs = query.to_query_pairs();
        self.execute_with_retry("GET /usage", || self.client.get(&url).query(&pairs))
            .await
    }

    /// Aggregate usage for a customer over a time window.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the retry budget.
    pub async fn aggregate_usage(&self, query: &UsageQuery) -> Result<UsageAggregate, ClientError> {
        let url = format!("{}/usage/aggregate", self.base_url);
        let pairs = query.to_query_pairs();
        self.execute_with_retry("GET /usage/aggregate", || self.client.get(&url).query(&pairs))
            .await
    }

    /// Check the service's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable after the retry
    /// budget.
    pub async fn health_check(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        self.execute_with_retry("GET /health", || self.client.get(&url))
            .await
    }

    /// Send a request, retrying transient failures with exponential
    /// backoff.
    ///
    /// Transient means a connection error, a timeout, or a 5xx response.
    /// Anything else goes straight to [`handle_response`](Self::handle_response):
    /// a 4xx will not succeed on replay, so retrying it only hides the
    /// caller's bug.
    async fn execute_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        make_request: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let mut attempt = 1u32;
        let mut delay = self.initial_backoff;

        loop {
            let last_failure = match make_request().send().await {
                Ok(response) if response.status().is_server_error() => {
                    format!("HTTP {}", response.status())
                }
                Ok(response) => return self.handle_response(response).await,
                Err(err) if err.is_connect() || err.is_timeout() => err.to_string(),
                Err(err) => return Err(ClientError::Http(err)),
            };

            if attempt >= self.max_attempts {
                tracing::error!(
                    endpoint = %endpoint,
                    attempts = attempt,
                    last_failure = %last_failure,
                    "transient failures exhausted retry budget"
                );
                return Err(ClientError::RetriesExhausted {
                    attempts: attempt,
                    last: last_failure,
                });
            }

            tracing::warn!(
                endpoint = %endpoint,
                attempt,
                delay_ms = %delay.as_millis(),
                failure = %last_failure,
                "transient failure, backing off before retry"
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse the structured error body
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                match code {
                    "validation_error" => {
                        let field = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("field"))
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("unknown")
                            .to_string();
                        Err(ClientError::Validation { field, message })
                    }
                    "not_found" => Err(ClientError::NotFound { message }),
                    "conflict" => Err(ClientError::Conflict { message }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Total attempt budget for transient failures (default: 3).
    pub max_attempts: u32,
    /// First backoff delay in milliseconds; doubles per retry
    /// (default: 500).
    pub initial_backoff_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_attempts: 3,
            initial_backoff_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = TallyClient::new("http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = TallyClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn attempt_budget_is_at_least_one() {
        let options = ClientOptions {
            max_attempts: 0,
            ..ClientOptions::default()
        };
        let client = TallyClient::with_options("http://localhost:8080", options);
        assert_eq!(client.max_attempts, 1);
    }
}
