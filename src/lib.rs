// Library exports for the Streamtape keeper
// This file exposes modules and functions for the binary and the integration tests

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{KeyValueStore, MemoryStore, RedisConfig, RedisPool, StoreHealth};
pub use models::{JobState, JobStatus, SweepReport, TrackedUrl};
pub use services::{
    HttpPinger, JobStatusService, LinkService, PageRenderer, PingError, Pinger, SweepTrigger,
    Sweeper,
};
pub use utils::{ServiceError, ServiceResult};

// Re-export handler route builders
pub use handlers::admin_routes;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Library initialization function used by the binary
pub async fn initialize_app_state() -> anyhow::Result<AppState> {
    use tracing::{info, warn};

    // Initialize config
    let config = app_config::config();
    if config.uses_fallback_token() {
        if config.is_production() {
            warn!("Running in production with the fallback admin token");
        } else {
            warn!("ADMIN_TOKEN is not set, using the built-in fallback token");
        }
    }

    // Initialize store
    info!("Initializing {:?} store...", config.store_backend);
    let store = db::init_store(config).await?;

    // Initialize services
    let pinger = Arc::new(HttpPinger::new(&config.sweep)?);
    let state = AppState::new(Arc::new(config.clone()), store, pinger)?;

    Ok(state)
}

// Full router: admin routes, health check, 404 fallback and request tracing
pub fn build_router(state: AppState) -> Router {
    admin_routes()
        .route("/health", get(health_check))
        .fallback(handlers::admin::not_found)
        .method_not_allowed_fallback(handlers::admin::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();
    let store_health = state.store.health_check().await;

    let response = serde_json::json!({
        "status": if store_health.is_healthy { "healthy" } else { "degraded" },
        "service": "streamtape-keeper",
        "timestamp": timestamp,
        "components": {
            "store": {
                "backend": store_health.backend,
                "status": if store_health.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": store_health.latency_ms,
                "error": store_health.error
            },
            "sweeper": {
                "running": state.sweeper.is_running()
            }
        }
    });

    if store_health.is_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
