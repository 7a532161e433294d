// Background task scheduler
// Runs the keeper sweep on a fixed interval alongside the manual trigger

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::app::AppState;
use crate::services::sweeper::{SweepTrigger, Sweeper};

/// Background task manager for the keeper
pub struct BackgroundTaskManager {
    state: AppState,
}

impl BackgroundTaskManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Start all background tasks
    pub fn start_all_tasks(&self) -> Option<JoinHandle<()>> {
        match self.state.config.sweep.interval() {
            Some(every) => {
                info!(
                    "Scheduling keeper sweeps every {} minutes",
                    self.state.config.sweep.interval_minutes
                );
                Some(spawn_scheduled_sweeps(self.state.sweeper.clone(), every))
            },
            None => {
                info!("Scheduled keeper sweeps are disabled");
                None
            },
        }
    }
}

/// Spawn a task that triggers a sweep every `every`.
///
/// The first tick is skipped so a fresh start does not ping immediately.
/// A tick that lands while a sweep is still running is dropped.
pub fn spawn_scheduled_sweeps(sweeper: Arc<Sweeper>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        // Skip the first tick, it completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            info!("Starting scheduled keeper sweep...");
            match sweeper.trigger().await {
                SweepTrigger::Started(handle) => {
                    info!("Scheduled keeper job {} submitted", handle.run_id);
                },
                SweepTrigger::AlreadyRunning => {
                    info!("Skipping scheduled sweep, previous one still running");
                },
            }
        }
    })
}

/// Initialize background tasks (call this in main.rs)
pub fn initialize_background_tasks(state: AppState) -> Option<JoinHandle<()>> {
    let task_manager = BackgroundTaskManager::new(state);
    task_manager.start_all_tasks()
}
