// Application state and configuration
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::KeyValueStore,
    services::{JobStatusService, LinkService, PageRenderer, Pinger, Sweeper},
    utils::ServiceResult,
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KeyValueStore>,
    pub link_service: LinkService,
    pub job_status: JobStatusService,
    pub sweeper: Arc<Sweeper>,
    pub pages: PageRenderer,
}

impl AppState {
    /// Wire the services together over one store and one pinger
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn KeyValueStore>,
        pinger: Arc<dyn Pinger>,
    ) -> ServiceResult<Self> {
        let link_service = LinkService::new(store.clone());
        let job_status = JobStatusService::new(store.clone());
        let sweeper = Arc::new(Sweeper::new(
            link_service.clone(),
            job_status.clone(),
            pinger,
            config.sweep.ping_delay(),
        ));
        let pages = PageRenderer::new()?;

        Ok(Self {
            config,
            store,
            link_service,
            job_status,
            sweeper,
            pages,
        })
    }
}
