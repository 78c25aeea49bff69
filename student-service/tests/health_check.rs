mod common;

use common::TestApp;
use reqwest::StatusCode;
use student_service::handlers::PING_MESSAGE;
use student_service::services::init_metrics;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "student-service");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/ready"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn ping_returns_fixed_text() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/test"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type")
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    assert_eq!(response.text().await.unwrap(), PING_MESSAGE);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    init_metrics().expect("Failed to install metrics recorder");
    let app = TestApp::spawn().await;

    // Generate at least one recorded request.
    app.client
        .get(app.url("/students"))
        .send()
        .await
        .expect("Failed to execute request");

    let response = app
        .client
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to get response body");
    for expected in [
        "http_requests_total",
        "student_operations_total",
        "path=\"/students\"",
    ] {
        assert!(
            body.contains(expected),
            "Missing {} in metrics output: {}",
            expected,
            body
        );
    }
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/test"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
