pub mod job;
pub mod link;

// Re-export common types
pub use job::{JobState, JobStatus, SweepReport, JOB_STATUS_KEY};
pub use link::{
    AdminQuery, BulkAddForm, BulkAddOutcome, LinkForm, TokenForm, TrackedUrl, REQUIRED_HOST,
    URL_NAMESPACE,
};
