// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the public contact gateway.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use portfolio_api::{
    config::Config,
    db::Database,
    handlers::{self, AppState},
    limiter::SubmissionLimiter,
};

async fn test_app() -> (Router, Arc<AppState>) {
    test_app_with_config(Config::default()).await
}

async fn test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = Database::connect("memory").await.unwrap();
    let limiter = SubmissionLimiter::new(db.clone(), config.rate_limit.clone());
    let state = Arc::new(AppState {
        db,
        limiter,
        config,
    });
    (handlers::router(state.clone()), state)
}

fn submission_body(name: &str) -> Value {
    json!({
        "name": name,
        "email": "ada@example.edu",
        "subject": "Analytical engines",
        "message": "I have a question about your lecture notes."
    })
}

fn contact_request(ip: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_accepted_submission_response_and_storage() {
    let (app, state) = test_app().await;

    let (status, body) = send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "Message sent successfully!" })
    );

    // Stored fields match the submission exactly, with triage flags off.
    let messages = state.db.list_messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].name, "Ada");
    assert_eq!(messages[0].email, "ada@example.edu");
    assert_eq!(messages[0].subject.as_deref(), Some("Analytical engines"));
    assert_eq!(
        messages[0].message,
        "I have a question about your lecture notes."
    );
    assert!(!messages[0].is_read);
    assert!(!messages[0].replied);
}

#[tokio::test]
async fn test_quota_allows_five_then_rejects() {
    let (app, state) = test_app().await;

    for i in 1..=5 {
        let (status, _) =
            send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;
        assert_eq!(status, StatusCode::OK, "submission {i} should be accepted");
    }

    let (status, body) =
        send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({
            "error": "Rate limit exceeded. Please wait before submitting again.",
            "rateLimited": true
        })
    );

    // The rejection stored nothing and left the ledger count at the cap.
    assert_eq!(state.db.list_messages().await.unwrap().len(), 5);
    let ledger = state.db.list_rate_limits().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].submission_count, 5);
}

#[tokio::test]
async fn test_source_addresses_have_independent_quotas() {
    let (app, _state) = test_app().await;

    for _ in 0..5 {
        send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;
    }

    let (limited, _) =
        send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;
    assert_eq!(limited, StatusCode::TOO_MANY_REQUESTS);

    let (fresh, _) =
        send(&app, contact_request("203.0.113.8", &submission_body("Grace"))).await;
    assert_eq!(fresh, StatusCode::OK);
}

#[tokio::test]
async fn test_lapsed_window_admits_submissions_again() {
    let (app, state) = test_app().await;

    // Simulate a window exhausted 61 minutes ago.
    let stale_start = Utc::now() - Duration::minutes(61);
    let row = state
        .db
        .start_rate_limit_window("203.0.113.7", stale_start)
        .await
        .unwrap();
    for _ in 0..4 {
        state
            .db
            .increment_rate_limit("203.0.113.7", row.window_start)
            .await
            .unwrap();
    }

    let (status, _) =
        send(&app, contact_request("203.0.113.7", &submission_body("Ada"))).await;
    assert_eq!(status, StatusCode::OK);

    // A fresh window opened beside the lapsed one.
    let ledger = state.db.list_rate_limits().await.unwrap();
    assert_eq!(ledger.len(), 2);
    let fresh = ledger
        .iter()
        .find(|r| r.window_start > stale_start)
        .expect("fresh window");
    assert_eq!(fresh.submission_count, 1);
}

#[tokio::test]
async fn test_missing_fields_fail_before_touching_the_ledger() {
    let (app, state) = test_app().await;

    let (status, body) = send(
        &app,
        contact_request(
            "203.0.113.7",
            &json!({ "name": "Ada", "email": "ada@example.edu" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Failed to send message. Please try again." })
    );

    // Invalid submissions consume no quota and store nothing.
    assert!(state.db.list_rate_limits().await.unwrap().is_empty());
    assert!(state.db.list_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_body_fails_with_generic_shape() {
    let (app, state) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from("this is not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Failed to send message. Please try again." })
    );
    assert!(state.db.list_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_headerless_requests_share_one_bucket() {
    let (app, state) = test_app().await;

    let mut body = submission_body("Ada");
    for i in 1..=5 {
        body["name"] = json!(format!("Visitor {i}"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(submission_body("Ada").to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let ledger = state.db.list_rate_limits().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].ip_address, "unknown");
}

#[tokio::test]
async fn test_preflight_creates_no_state() {
    let (app, state) = test_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/contact")
        .header("origin", "https://example.edu")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    assert!(state.db.list_messages().await.unwrap().is_empty());
    assert!(state.db.list_rate_limits().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("portfolio-api"));
}

#[tokio::test]
async fn test_metrics_endpoint_reports_gateway_counters() {
    let (app, _state) = test_app().await;

    // Touch a counter so the family is registered and visible.
    send(&app, contact_request("203.0.113.9", &submission_body("Ada"))).await;

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("contact_submissions_accepted_total"));
}

#[tokio::test]
async fn test_metrics_endpoint_can_be_disabled() {
    let mut config = Config::default();
    config.metrics.enabled = false;
    let (app, _state) = test_app_with_config(config).await;

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
