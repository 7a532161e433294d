// Admin panel HTTP surface, exercised through the full router with an in-memory store

mod common;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{
    setup_test_app, setup_test_app_with_pinger, test_config, RecordingPinger, TEST_ADMIN_TOKEN,
};
use std::sync::Arc;
use streamtape_keeper::{
    app::AppState, build_router, JobState, KeyValueStore, ServiceError, ServiceResult,
    StoreHealth,
};
use tower::util::ServiceExt;

/// Store that is unreachable
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> ServiceResult<Option<String>> {
        Err(ServiceError::StoreError("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> ServiceResult<()> {
        Err(ServiceError::StoreError("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> ServiceResult<()> {
        Err(ServiceError::StoreError("connection refused".to_string()))
    }

    async fn list(&self, _prefix: &str) -> ServiceResult<Vec<(String, String)>> {
        Err(ServiceError::StoreError("connection refused".to_string()))
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth {
            backend: "unavailable".to_string(),
            is_healthy: false,
            latency_ms: 0,
            error: Some("connection refused".to_string()),
        }
    }
}

fn admin_uri() -> String {
    format!("/admin?token={}", TEST_ADMIN_TOKEN)
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

#[tokio::test]
async fn test_login_page_is_public() {
    let app = setup_test_app();

    let response = app.get("/").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .header(header::CONTENT_TYPE)
        .unwrap()
        .starts_with("text/html"));
    assert!(response.text().await.contains("type=\"password\""));
}

#[tokio::test]
async fn test_admin_page_rejects_wrong_or_missing_token() {
    let app = setup_test_app();

    for uri in ["/admin?token=wrong", "/admin", "/admin?token="] {
        let response = app.get(uri).send().await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(response.text().await, "Forbidden: Invalid Admin Token.");
    }
}

#[tokio::test]
async fn test_mutations_with_wrong_token_change_nothing() {
    let app = setup_test_app();
    app.state
        .link_service
        .add("https://streamtape.com/v/keep")
        .await
        .unwrap();

    let attempts = [
        ("/add", vec![("token", "wrong"), ("url", "https://streamtape.com/v/new")]),
        ("/bulk-add", vec![("token", "wrong"), ("urls", "https://streamtape.com/v/b")]),
        ("/delete", vec![("token", "wrong"), ("url", "https://streamtape.com/v/keep")]),
        ("/run-now", vec![("token", "wrong")]),
        ("/add", vec![("url", "https://streamtape.com/v/no-token")]),
    ];

    for (uri, form) in attempts {
        let response = app.post(uri).form(&form).send().await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(response.text().await, "Forbidden: Invalid Admin Token.");
    }

    assert_eq!(app.links().await, vec!["https://streamtape.com/v/keep"]);
    assert_eq!(app.state.job_status.read().await.unwrap().status, JobState::Idle);
    assert!(app.pinger.calls().is_empty());
}

#[tokio::test]
async fn test_post_without_form_body_is_forbidden() {
    let app = setup_test_app();

    let response = app.post("/add").send().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.store.is_empty().await);
}

// =============================================================================
// LINK MANAGEMENT
// =============================================================================

#[tokio::test]
async fn test_add_list_delete_flow() {
    let app = setup_test_app();

    let response = app
        .post("/add")
        .form(&[("token", TEST_ADMIN_TOKEN), ("url", "https://streamtape.com/v/abc")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION).unwrap(), admin_uri());
    assert_eq!(app.links().await, vec!["https://streamtape.com/v/abc"]);

    // Foreign host is dropped but the request still redirects
    let response = app
        .post("/add")
        .form(&[("token", TEST_ADMIN_TOKEN), ("url", "https://evil.com/x")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.links().await.len(), 1);

    let page = app.get(&admin_uri()).send().await;
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await;
    assert!(html.contains("https://streamtape.com/v/abc"));
    assert!(html.contains("data-total=\"1\""));

    let response = app
        .post("/delete")
        .form(&[("token", TEST_ADMIN_TOKEN), ("url", "https://streamtape.com/v/abc")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.links().await.is_empty());
}

#[tokio::test]
async fn test_bulk_add_keeps_only_valid_lines() {
    let app = setup_test_app();

    let response = app
        .post("/bulk-add")
        .form(&[
            ("token", TEST_ADMIN_TOKEN),
            ("urls", "https://streamtape.com/a\nbad\nhttps://streamtape.com/b"),
        ])
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.header(header::LOCATION).unwrap(),
        format!("{}&added=2", admin_uri())
    );
    assert_eq!(
        app.links().await,
        vec!["https://streamtape.com/a", "https://streamtape.com/b"]
    );

    let html = app
        .get(&format!("{}&added=2", admin_uri()))
        .send()
        .await
        .text()
        .await;
    assert!(html.contains("Added 2 links."));
}

#[tokio::test]
async fn test_admin_page_escapes_stored_links() {
    let app = setup_test_app();
    app.store
        .set(
            "streamtape_urls/https://streamtape.com/v/<img src=x onerror=alert(1)>",
            "https://streamtape.com/v/<img src=x onerror=alert(1)>",
        )
        .await
        .unwrap();

    let html = app.get(&admin_uri()).send().await.text().await;

    assert!(!html.contains("<img src=x"));
    assert!(html.contains("&lt;img"));
}

// =============================================================================
// KEEPER JOB
// =============================================================================

#[tokio::test]
async fn test_job_status_defaults_to_idle() {
    let app = setup_test_app();

    let response = app.get("/job-status").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await, r#"{"status":"idle"}"#);
}

#[tokio::test]
async fn test_run_now_pings_every_link_and_finishes() {
    let app = setup_test_app();
    app.state
        .link_service
        .bulk_add("https://streamtape.com/v/1\nhttps://streamtape.com/v/2")
        .await
        .unwrap();

    let response = app
        .post("/run-now")
        .form(&[("token", TEST_ADMIN_TOKEN)])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.header(header::LOCATION).unwrap(),
        format!("{}&status=started", admin_uri())
    );

    let status = app.wait_for_finished().await;
    assert_eq!(status.total, Some(2));
    assert_eq!(status.failed, Some(0));
    assert_eq!(
        app.pinger.calls(),
        vec!["https://streamtape.com/v/1", "https://streamtape.com/v/2"]
    );
}

#[tokio::test]
async fn test_run_now_while_running_redirects_with_running_status() {
    let pinger = Arc::new(RecordingPinger::gated());
    let app = setup_test_app_with_pinger(pinger.clone());
    app.state
        .link_service
        .add("https://streamtape.com/v/slow")
        .await
        .unwrap();

    let first = app
        .post("/run-now")
        .form(&[("token", TEST_ADMIN_TOKEN)])
        .send()
        .await;
    assert_eq!(
        first.header(header::LOCATION).unwrap(),
        format!("{}&status=started", admin_uri())
    );

    let second = app
        .post("/run-now")
        .form(&[("token", TEST_ADMIN_TOKEN)])
        .send()
        .await;
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        second.header(header::LOCATION).unwrap(),
        format!("{}&status=running", admin_uri())
    );

    let html = app
        .get(&second.header(header::LOCATION).unwrap())
        .send()
        .await
        .text()
        .await;
    assert!(html.contains("A keeper job is already running."));

    pinger.release(1);
    let status = app.wait_for_finished().await;
    assert_eq!(status.total, Some(1));
    assert_eq!(pinger.calls(), vec!["https://streamtape.com/v/slow"]);
}

#[tokio::test]
async fn test_job_status_store_failure_is_server_error() {
    let state = AppState::new(
        Arc::new(test_config()),
        Arc::new(UnavailableStore),
        Arc::new(RecordingPinger::default()),
    )
    .unwrap();
    let app = build_router(state);

    let request = Request::builder()
        .uri("/job-status")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Internal Server Error");
}

#[tokio::test]
async fn test_run_now_on_empty_list_finishes_without_requests() {
    let app = setup_test_app();

    app.post("/run-now")
        .form(&[("token", TEST_ADMIN_TOKEN)])
        .send()
        .await;

    let status = app.wait_for_finished().await;
    assert_eq!(status.total, Some(0));
    assert!(app.pinger.calls().is_empty());
}

#[tokio::test]
async fn test_admin_page_with_status_starts_polling() {
    let app = setup_test_app();

    let html = app
        .get(&format!("{}&status=started", admin_uri()))
        .send()
        .await
        .text()
        .await;

    assert!(html.contains("data-poll=\"true\""));
    assert!(html.contains("Keeper job started."));
}

// =============================================================================
// ROUTING
// =============================================================================

#[tokio::test]
async fn test_unknown_paths_and_methods_are_not_found() {
    let app = setup_test_app();

    for (method, uri) in [
        ("GET", "/nope"),
        ("GET", "/add"),
        ("POST", "/job-status"),
        ("DELETE", "/admin"),
        ("PUT", "/"),
    ] {
        let response = app.request(method, uri).send().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(response.text().await, "Not Found");
    }
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = setup_test_app();

    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["store"]["backend"], "memory");
    assert_eq!(body["components"]["sweeper"]["running"], false);
}
