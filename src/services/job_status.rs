// Job status flag: one JSON record polled by the admin page

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::KeyValueStore,
    models::job::{JobStatus, SweepReport, JOB_STATUS_KEY},
    utils::ServiceResult,
};

#[derive(Clone)]
pub struct JobStatusService {
    store: Arc<dyn KeyValueStore>,
}

impl JobStatusService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn set_running(&self, run_id: Uuid, started_at: DateTime<Utc>) -> ServiceResult<()> {
        self.write(&JobStatus::running(run_id, started_at)).await
    }

    pub async fn set_finished(&self, report: &SweepReport) -> ServiceResult<()> {
        self.write(&JobStatus::finished(report)).await
    }

    /// Current record; idle when the key is absent or holds unreadable JSON.
    /// A store failure is returned as an error so pollers see a 500.
    pub async fn read(&self) -> ServiceResult<JobStatus> {
        let status = match self.store.get(JOB_STATUS_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable job status record: {}", e);
                JobStatus::idle()
            }),
            None => JobStatus::idle(),
        };
        Ok(status)
    }

    async fn write(&self, status: &JobStatus) -> ServiceResult<()> {
        let raw = serde_json::to_string(status)?;
        self.store.set(JOB_STATUS_KEY, &raw).await
    }
}
