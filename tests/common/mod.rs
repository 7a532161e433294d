// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamtape_keeper::{
    app::AppState,
    app_config::{AppConfig, StoreBackend},
    build_router,
    db::MemoryStore,
    services::{PingError, Pinger},
    JobState, JobStatus,
};
use tokio::sync::Semaphore;
use tower::util::ServiceExt;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Pinger that records every url and answers 200.
/// A gated pinger holds each ping until `release` hands out a permit.
#[derive(Default)]
pub struct RecordingPinger {
    calls: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl RecordingPinger {
    pub fn gated() -> Self {
        Self {
            calls: Mutex::default(),
            gate: Some(Semaphore::new(0)),
        }
    }

    pub fn release(&self, pings: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(pings);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pinger for RecordingPinger {
    async fn ping(&self, url: &str) -> Result<u16, PingError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| PingError::Failed(e.to_string()))?
                .forget();
        }
        self.calls.lock().unwrap().push(url.to_string());
        Ok(200)
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub pinger: Arc<RecordingPinger>,
}

impl TestApp {
    /// Send a POST request
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    /// Send a GET request
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    /// Send a request with any method
    pub fn request(&self, method: &str, uri: &str) -> TestRequest {
        TestRequest::new(self, method, uri)
    }

    /// Tracked links as the link service reports them
    pub async fn links(&self) -> Vec<String> {
        self.state
            .link_service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|url| url.into_inner())
            .collect()
    }

    /// Poll /job-status until the sweep reports `finished`
    pub async fn wait_for_finished(&self) -> JobStatus {
        for _ in 0..200 {
            let status: JobStatus = self.get("/job-status").send().await.json().await;
            if status.status == JobState::Finished {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("keeper job did not finish in time");
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: String,
    uri: String,
    content_type: Option<&'static str>,
    body: Body,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        Self {
            app,
            method: method.to_string(),
            uri: uri.to_string(),
            content_type: None,
            body: Body::empty(),
        }
    }

    /// Add a urlencoded form body to request
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.content_type = Some("application/x-www-form-urlencoded");
        self.body = Body::from(encoded);
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method.as_str()).uri(self.uri.as_str());
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(self.body).unwrap();

        let response = self.app.app.clone().oneshot(request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Get a header as a string
    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Get response body as text
    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

/// Test configuration: in-memory store, known token, no ping delay
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin_token = TEST_ADMIN_TOKEN.to_string();
    config.store_backend = StoreBackend::Memory;
    config.sweep.ping_delay_ms = 0;
    config.sweep.interval_minutes = 0;
    config
}

/// Setup test application with all dependencies
pub fn setup_test_app() -> TestApp {
    setup_test_app_with_pinger(Arc::new(RecordingPinger::default()))
}

/// Setup test application around a specific pinger
pub fn setup_test_app_with_pinger(pinger: Arc<RecordingPinger>) -> TestApp {
    let store = MemoryStore::new();

    let state = AppState::new(
        Arc::new(test_config()),
        Arc::new(store.clone()),
        pinger.clone(),
    )
    .expect("Failed to build app state");

    TestApp {
        app: build_router(state.clone()),
        state,
        store,
        pinger,
    }
}
