//! Integration tests for REST Connector using wiremock.
//!
//! These tests verify the connector against a mock HTTP server, covering
//! authentication, lookup conventions, write calls, status mapping, retry
//! and timeout handling.

use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use syncmark_connector::config::{ActivationBody, ConnectionSettings, EndpointTemplate, LookupStyle};
use syncmark_connector::error::ConnectorError;
use syncmark_connector::traits::{ActivateOp, CreateOp, LookupOp, SubmitOp, UpdateOp};
use syncmark_connector::types::{ContentType, Payload};
use syncmark_connector_rest::{LogVerbosity, RestConfig, RestConnector, RetryConfig};

// =============================================================================
// Test Helpers
// =============================================================================

async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

fn create_config(base_url: &str) -> RestConfig {
    RestConfig::new(base_url)
        .with_basic_auth("user", "pass")
        .with_retry(RetryConfig::disabled())
        .with_log_verbosity(LogVerbosity::Debug)
}

fn create_config_with_retry(base_url: &str) -> RestConfig {
    create_config(base_url).with_retry(
        RetryConfig::new(3)
            .with_initial_backoff(10)
            .with_max_backoff(100),
    )
}

fn partner_endpoint() -> EndpointTemplate {
    EndpointTemplate::new("/BusinessPartner")
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_basic_authentication() {
    let server = setup_mock_server().await;

    // base64("user:pass")
    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<BusinessPartner/>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();

    assert_eq!(response.status, 200);
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[tokio::test]
async fn test_lookup_query_style() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .and(query_param("BP1500", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<BusinessPartner><Id>BP1500</Id></BusinessPartner>"),
        )
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();

    assert!(response.is_success());
    assert!(response.body.contains("<BusinessPartner>"));
}

#[tokio::test]
async fn test_lookup_path_style() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/Absence/4711"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Absence":{}}"#))
        .mount(&server)
        .await;

    let endpoint = EndpointTemplate::new("/Absence").with_lookup_style(LookupStyle::Path);
    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector.lookup(&endpoint, "4711").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"Absence":{}}"#);
}

#[tokio::test]
async fn test_lookup_returns_non_success_status() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP9999").await.unwrap();

    assert!(response.is_not_found());
    assert!(response.is_blank());
}

// =============================================================================
// Write Call Tests
// =============================================================================

#[tokio::test]
async fn test_create_sends_payload_with_content_type() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/BusinessPartner/Create"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"BusinessPartner":"BP1500"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let payload = Payload::json(r#"{"BusinessPartner":"BP1500"}"#);
    let response = connector.create(&partner_endpoint(), &payload).await.unwrap();

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_update_xml_payload() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/FixedAsset/Update"))
        .and(header("Content-Type", "application/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let endpoint = EndpointTemplate::new("/FixedAsset").with_content_type(ContentType::Xml);
    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector
        .update(&endpoint, &Payload::xml("<FixedAsset/>"))
        .await
        .unwrap();

    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_activate_without_body() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/BusinessPartner/BP1500/Activate"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector
        .activate(&partner_endpoint(), "BP1500", None)
        .await
        .unwrap();

    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn test_activate_with_document_body() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/Quote/Q-1/Activate"))
        .and(body_string(r#"{"Quote":"Q-1"}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = EndpointTemplate::new("/Quote").with_activation_body(ActivationBody::Document);
    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let payload = Payload::json(r#"{"Quote":"Q-1"}"#);
    connector
        .activate(&endpoint, "Q-1", Some(&payload))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_submit_posts_to_entity_path() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/submission"))
        .and(header("Content-Type", "application/xml"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = EndpointTemplate::new("/submission").with_content_type(ContentType::Xml);
    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let response = connector
        .submit(&endpoint, &Payload::xml("<GovTalkMessage/>"))
        .await
        .unwrap();

    assert_eq!(response.status, 202);
}

// =============================================================================
// Status Mapping Tests
// =============================================================================

#[tokio::test]
async fn test_create_non_success_is_unexpected_status() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/BusinessPartner/Create"))
        .respond_with(ResponseTemplate::new(400).set_body_string("missing name"))
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config(&server.uri())).unwrap();
    let err = connector
        .create(&partner_endpoint(), &Payload::json("{}"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::UnexpectedStatus { status: 400, .. }));
    assert_eq!(err.body(), Some("missing name"));
}

// =============================================================================
// Retry Logic Tests
// =============================================================================

#[tokio::test]
async fn test_lookup_retries_on_503() {
    let server = setup_mock_server().await;

    // First two requests fail with 503, third succeeds
    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<BusinessPartner/>"))
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config_with_retry(&server.uri())).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_lookup_retry_exhausted_returns_last_status() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_config(&server.uri()).with_retry(
        RetryConfig::new(2)
            .with_initial_backoff(1)
            .with_max_backoff(5),
    );
    let connector = RestConnector::new(config).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();

    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn test_lookup_permanent_status_is_not_retried() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config_with_retry(&server.uri())).unwrap();
    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();

    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_lookup_transport_failure_exhausts_retries() {
    let config = create_config("http://127.0.0.1:9")
        .with_connection(ConnectionSettings::new().with_call_timeout_ms(1_000))
        .with_retry(RetryConfig::new(2).with_initial_backoff(1).with_max_backoff(5));
    let connector = RestConnector::new(config).unwrap();

    let err = connector
        .lookup(&partner_endpoint(), "BP1500")
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_create_is_never_retried() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/BusinessPartner/Create"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(create_config_with_retry(&server.uri())).unwrap();
    let err = connector
        .create(&partner_endpoint(), &Payload::json("{}"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
}

// =============================================================================
// Timeout Tests
// =============================================================================

#[tokio::test]
async fn test_request_timeout() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/BusinessPartner/Update"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = create_config(&server.uri())
        .with_connection(ConnectionSettings::new().with_call_timeout_ms(200));
    let connector = RestConnector::new(config).unwrap();

    let err = connector
        .update(&partner_endpoint(), &Payload::json("{}"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::ConnectionTimeout { timeout_ms: 200 }));
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    // Port 9 (discard) is closed on test hosts
    let config = create_config("http://127.0.0.1:9").with_connection(
        ConnectionSettings::new().with_call_timeout_ms(1_000),
    );
    let connector = RestConnector::new(config).unwrap();

    let err = connector
        .lookup(&partner_endpoint(), "BP1500")
        .await
        .unwrap_err();

    assert!(err.is_transport_failure());
    assert_eq!(err.status(), None);
}

// =============================================================================
// Custom Headers Tests
// =============================================================================

#[tokio::test]
async fn test_custom_headers() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/BusinessPartner"))
        .and(header("X-Custom-Header", "custom-value"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_config(&server.uri()).with_header("X-Custom-Header", "custom-value");
    let connector = RestConnector::new(config).unwrap();

    let response = connector.lookup(&partner_endpoint(), "BP1500").await.unwrap();
    assert_eq!(response.status, 200);
}
