// HTTP handlers for the admin panel

pub mod admin;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

// Admin panel routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::login_page))
        .route("/admin", get(admin::admin_page))
        .route("/add", post(admin::add_link))
        .route("/bulk-add", post(admin::bulk_add_links))
        .route("/delete", post(admin::delete_link))
        .route("/run-now", post(admin::run_now))
        .route("/job-status", get(admin::job_status))
}
