// Admin panel handlers
// Every privileged route checks the shared admin token before touching the store

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use tracing::{info, instrument};
use url::form_urlencoded;

use crate::{
    app::AppState,
    middleware::auth::authorize,
    models::{
        job::JobStatus,
        link::{AdminQuery, BulkAddForm, LinkForm, TokenForm},
    },
    services::{
        pages::{AdminPage, JobNotice},
        sweeper::SweepTrigger,
    },
    utils::{ServiceError, ServiceResult},
};

// =============================================================================
// PAGES
// =============================================================================

/// GET /
pub async fn login_page(State(state): State<AppState>) -> ServiceResult<Html<String>> {
    Ok(Html(state.pages.login()?))
}

/// GET /admin?token=...
#[instrument(skip_all)]
pub async fn admin_page(
    State(state): State<AppState>,
    query: Result<Query<AdminQuery>, QueryRejection>,
) -> ServiceResult<Html<String>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    authorize(&state.config.admin_token, query.token.as_deref())?;

    let links = state.link_service.list().await?;
    let html = state.pages.admin(&AdminPage {
        token: query.token.as_deref().unwrap_or_default(),
        links: &links,
        job_notice: JobNotice::from_query(query.status.as_deref()),
        added: query.added.as_deref().and_then(|n| n.parse().ok()),
    })?;

    Ok(Html(html))
}

// =============================================================================
// LINK MUTATIONS
// =============================================================================

/// POST /add
#[instrument(skip_all)]
pub async fn add_link(
    State(state): State<AppState>,
    form: Result<Form<LinkForm>, FormRejection>,
) -> ServiceResult<Redirect> {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let token = authorized_token(&state, form.token.as_deref())?;

    if let Some(url) = form.url() {
        state.link_service.add(&url).await?;
    }

    Ok(admin_redirect(token, &[]))
}

/// POST /bulk-add
#[instrument(skip_all)]
pub async fn bulk_add_links(
    State(state): State<AppState>,
    form: Result<Form<BulkAddForm>, FormRejection>,
) -> ServiceResult<Redirect> {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let token = authorized_token(&state, form.token.as_deref())?;

    let outcome = state
        .link_service
        .bulk_add(form.urls.as_deref().unwrap_or_default())
        .await?;

    Ok(admin_redirect(token, &[("added", outcome.added.to_string().as_str())]))
}

/// POST /delete
#[instrument(skip_all)]
pub async fn delete_link(
    State(state): State<AppState>,
    form: Result<Form<LinkForm>, FormRejection>,
) -> ServiceResult<Redirect> {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let token = authorized_token(&state, form.token.as_deref())?;

    if let Some(url) = form.url() {
        state.link_service.remove(&url).await?;
    }

    Ok(admin_redirect(token, &[]))
}

// =============================================================================
// KEEPER JOB
// =============================================================================

/// POST /run-now
///
/// Submits the sweep and redirects at once; the browser follows progress
/// through `/job-status`.
#[instrument(skip_all)]
pub async fn run_now(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> ServiceResult<Redirect> {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let token = authorized_token(&state, form.token.as_deref())?;

    let status = match state.sweeper.trigger().await {
        SweepTrigger::Started(handle) => {
            info!("Manual keeper job {} submitted", handle.run_id);
            "started"
        },
        SweepTrigger::AlreadyRunning => "running",
    };

    Ok(admin_redirect(token, &[("status", status)]))
}

/// GET /job-status
pub async fn job_status(State(state): State<AppState>) -> ServiceResult<Json<JobStatus>> {
    Ok(Json(state.job_status.read().await?))
}

/// Fallback for unknown paths and methods
pub async fn not_found() -> impl IntoResponse {
    ServiceError::NotFound
}

// =============================================================================
// HELPERS
// =============================================================================

fn authorized_token<'a>(state: &AppState, provided: Option<&'a str>) -> ServiceResult<&'a str> {
    authorize(&state.config.admin_token, provided)?;
    Ok(provided.unwrap_or_default())
}

/// 303 back to the admin page, carrying the token and any extra query pairs
fn admin_redirect(token: &str, extra: &[(&str, &str)]) -> Redirect {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("token", token);
    for (key, value) in extra {
        query.append_pair(key, value);
    }
    Redirect::to(&format!("/admin?{}", query.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_admin_redirect_encodes_token() {
        let response = admin_redirect("a b&c", &[("status", "started")]).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin?token=a+b%26c&status=started"
        );
    }
}
