//! Functional tests for the HTTP inference client

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prompt_gallery::config::InferenceConfig;
use prompt_gallery::inference::{HttpInferenceClient, ImageGenerator};
use prompt_gallery::AppError;

fn client_for(server: &MockServer, timeout_ms: Option<u64>) -> HttpInferenceClient {
    HttpInferenceClient::new(&InferenceConfig {
        endpoint: format!("{}/models/flux", server.uri()),
        api_key: "hf_test".to_string(),
        timeout_ms,
    })
    .unwrap()
}

#[tokio::test]
async fn test_generate_returns_jpeg_data_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/flux"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_json(json!({ "inputs": "a red bicycle" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .expect(1)
        .mount(&server)
        .await;

    let image = client_for(&server, None).generate("a red bicycle").await.unwrap();

    assert_eq!(image, "data:image/jpeg;base64,/9j/4A==");
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/flux"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Model is currently loading"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, None).generate("a red bicycle").await.unwrap_err();

    match err {
        AppError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "Model is currently loading");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_prompt_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF]))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server, None).generate("   ").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_empty_body_is_an_upstream_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client_for(&server, None).generate("a red bicycle").await.unwrap_err();

    assert!(matches!(err, AppError::InvalidUpstreamResponse(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_configured_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8])
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, Some(50)).generate("a red bicycle").await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamTransport(_)));
}
