//! Functional tests for rate limiting

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use prompt_gallery::middleware::RateLimitLayer;

fn create_test_app(rps: u32, burst: u32) -> Router {
    Router::new()
        .route("/generate-image", axum::routing::post(|| async { "OK" }))
        .route_layer(RateLimitLayer::new(rps, burst))
        .route("/health", axum::routing::get(|| async { "healthy" }))
}

fn post_generate() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-image")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit_allows_within_limit() {
    let app = create_test_app(100, 100);

    let response = app.oneshot(post_generate()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = create_test_app(1, 1);

    let response = app.clone().oneshot(post_generate()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut rate_limited = false;
    for _ in 0..10 {
        let response = app.clone().oneshot(post_generate()).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            rate_limited = true;
            break;
        }
    }

    assert!(rate_limited, "Expected rate limiting to kick in");
}

#[tokio::test]
async fn test_unlimited_routes_are_unaffected() {
    let app = create_test_app(1, 1);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rate_limit_burst_capacity() {
    let app = create_test_app(1, 5);

    for _ in 0..5 {
        let response = app.clone().oneshot(post_generate()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
