//! Client retry and error-mapping tests against a mock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tally_client::{ClientError, ClientOptions, RecordUsageRequest, TallyClient, UsageQuery};

fn fast_client(base_url: &str) -> TallyClient {
    TallyClient::with_options(
        base_url,
        ClientOptions {
            timeout_seconds: 5,
            max_attempts: 3,
            initial_backoff_ms: 10,
        },
    )
}

fn stored_record_body(created: bool) -> serde_json::Value {
    json!({
        "created": created,
        "record": {
            "record_id": "r1",
            "customer_id": "c1",
            "service_name": "compute",
            "quantity": 5.0,
            "timestamp": "2026-03-01T12:00:00Z"
        }
    })
}

#[tokio::test]
async fn record_usage_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(201).set_body_json(stored_record_body(true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let response = client
        .record_usage(RecordUsageRequest::new("c1", "compute", 5.0).with_record_id("r1"))
        .await
        .unwrap();

    assert!(response.created);
    assert_eq!(response.record.record_id.as_str(), "r1");
}

#[tokio::test]
async fn replay_reports_already_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_record_body(false)))
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let response = client
        .record_usage(RecordUsageRequest::new("c1", "compute", 5.0).with_record_id("r1"))
        .await
        .unwrap();

    assert!(!response.created);
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    // Two 5xx responses, then success on the third attempt.
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(201).set_body_json(stored_record_body(true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let response = client
        .record_usage(RecordUsageRequest::new("c1", "compute", 5.0).with_record_id("r1"))
        .await
        .unwrap();

    assert!(response.created);
}

#[tokio::test]
async fn validation_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {
                "code": "validation_error",
                "message": "quantity must be non-negative, got -1",
                "details": {"field": "quantity"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let err = client
        .record_usage(RecordUsageRequest::new("c1", "compute", -1.0))
        .await
        .unwrap_err();

    match &err {
        ClientError::Validation { field, .. } => assert_eq!(field, "quantity"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn retries_exhausted_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let err = client
        .record_usage(RecordUsageRequest::new("c1", "compute", 5.0).with_record_id("r1"))
        .await
        .unwrap_err();

    match &err {
        ClientError::RetriesExhausted { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn not_found_maps_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "not_found",
                "message": "usage record not found: missing"
            }
        })))
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let err = client.get_usage("missing").await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn list_usage_sends_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .and(query_param("customer_id", "c1"))
        .and(query_param("service_name", "compute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [],
            "count": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let response = client
        .list_usage(&UsageQuery::for_customer("c1").with_service("compute"))
        .await
        .unwrap();

    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn aggregate_usage_deserializes_zero_aggregate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage/aggregate"))
        .and(query_param("customer_id", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customer_id": "c1",
            "total_quantity": 0.0,
            "record_count": 0
        })))
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let aggregate = client
        .aggregate_usage(&UsageQuery::for_customer("c1"))
        .await
        .unwrap();

    assert_eq!(aggregate.total_quantity, 0.0);
    assert_eq!(aggregate.record_count, 0);
}

#[tokio::test]
async fn health_check_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "service": "tally",
            "version": "0.1.0"
        })))
        .mount(&server)
        .await;

    let client = fast_client(&server.uri());
    let health = client.health_check().await.unwrap();

    assert!(health.is_healthy());
    assert_eq!(health.service, "tally");
}
