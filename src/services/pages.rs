// HTML pages for the admin panel
// Every dynamic value goes through handlebars and is HTML-escaped

use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    models::link::TrackedUrl,
    utils::{ServiceError, ServiceResult},
};

const LOGIN_TEMPLATE: &str = "login";
const ADMIN_TEMPLATE: &str = "admin";

/// Job notice requested through the `status` query parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobNotice {
    Started,
    AlreadyRunning,
}

impl JobNotice {
    /// Only `started` and `running` are recognized
    pub fn from_query(status: Option<&str>) -> Option<Self> {
        match status {
            Some("started") => Some(JobNotice::Started),
            Some("running") => Some(JobNotice::AlreadyRunning),
            _ => None,
        }
    }

    fn message(self) -> &'static str {
        match self {
            JobNotice::Started => "Keeper job started. Waiting for it to finish...",
            JobNotice::AlreadyRunning => {
                "A keeper job is already running. Waiting for it to finish..."
            },
        }
    }
}

/// Everything the admin page shows
pub struct AdminPage<'a> {
    pub token: &'a str,
    pub links: &'a [TrackedUrl],
    pub job_notice: Option<JobNotice>,
    pub added: Option<usize>,
}

#[derive(Serialize)]
struct AdminView<'a> {
    token: &'a str,
    total: usize,
    has_links: bool,
    links: &'a [TrackedUrl],
    poll: bool,
    job_notice: Option<&'static str>,
    added_notice: Option<String>,
}

impl<'a> From<&AdminPage<'a>> for AdminView<'a> {
    fn from(page: &AdminPage<'a>) -> Self {
        Self {
            token: page.token,
            total: page.links.len(),
            has_links: !page.links.is_empty(),
            links: page.links,
            poll: page.job_notice.is_some(),
            job_notice: page.job_notice.map(JobNotice::message),
            added_notice: page.added.map(|n| match n {
                1 => "Added 1 link.".to_string(),
                n => format!("Added {} links.", n),
            }),
        }
    }
}

/// Renders the login and admin pages
#[derive(Clone)]
pub struct PageRenderer {
    templates: Arc<Handlebars<'static>>,
}

impl PageRenderer {
    pub fn new() -> ServiceResult<Self> {
        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        Ok(Self {
            templates: Arc::new(templates),
        })
    }

    fn register_templates(templates: &mut Handlebars) -> ServiceResult<()> {
        let login_template = include_str!("../templates/pages/login.html");
        templates
            .register_template_string(LOGIN_TEMPLATE, login_template)
            .map_err(|e| ServiceError::RenderError(e.to_string()))?;

        let admin_template = include_str!("../templates/pages/admin.html");
        templates
            .register_template_string(ADMIN_TEMPLATE, admin_template)
            .map_err(|e| ServiceError::RenderError(e.to_string()))?;

        Ok(())
    }

    pub fn login(&self) -> ServiceResult<String> {
        Ok(self.templates.render(LOGIN_TEMPLATE, &serde_json::json!({}))?)
    }

    pub fn admin(&self, page: &AdminPage<'_>) -> ServiceResult<String> {
        Ok(self
            .templates
            .render(ADMIN_TEMPLATE, &AdminView::from(page))?)
    }
}
