// Services module for the keeper
// Business logic layer for the application

pub mod background_tasks;
pub mod job_status;
pub mod link;
pub mod pages;
pub mod sweeper;

// Re-export commonly used services
pub use background_tasks::{initialize_background_tasks, spawn_scheduled_sweeps};
pub use job_status::JobStatusService;
pub use link::LinkService;
pub use pages::{AdminPage, JobNotice, PageRenderer};
pub use sweeper::{HttpPinger, PingError, Pinger, SweepHandle, SweepTrigger, Sweeper};
