// Keeper job status record, stored as JSON under a single key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store key of the singleton job status record
pub const JOB_STATUS_KEY: &str = "job_status";

/// Lifecycle of the keeper job as seen by the polling client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Job status record.
///
/// Only `status` is always present; an absent record reads as `{"status":"idle"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

impl JobStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            status: JobState::Running,
            run_id: Some(run_id),
            started_at: Some(started_at),
            ..Self::default()
        }
    }

    pub fn finished(report: &SweepReport) -> Self {
        Self {
            status: JobState::Finished,
            run_id: Some(report.run_id),
            started_at: Some(report.started_at),
            finished_at: Some(report.finished_at),
            total: Some(report.total),
            failed: Some(report.failed),
        }
    }
}

/// Summary of one completed sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}
