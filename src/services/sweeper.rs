// Keeper sweep: ping every tracked link once, one at a time
// Runs detached from the request that triggered it; progress goes to the job status record

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app_config::{PingMethod, SweepConfig},
    models::job::SweepReport,
    services::{job_status::JobStatusService, link::LinkService},
};

const USER_AGENT: &str = concat!("streamtape-keeper/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// PINGER
// =============================================================================

#[derive(Debug, Error)]
pub enum PingError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Ping failed: {0}")]
    Failed(String),
}

/// Issues one keep-alive request and reports the HTTP status
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, url: &str) -> Result<u16, PingError>;
}

/// Pinger backed by a shared reqwest client
pub struct HttpPinger {
    client: reqwest::Client,
    method: PingMethod,
}

impl HttpPinger {
    pub fn new(config: &SweepConfig) -> Result<Self, PingError> {
        let client = reqwest::Client::builder()
            .timeout(config.ping_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            method: config.ping_method,
        })
    }
}

#[async_trait]
impl Pinger for HttpPinger {
    async fn ping(&self, url: &str) -> Result<u16, PingError> {
        let response = match self.method {
            PingMethod::Head => self.client.head(url).send().await?,
            PingMethod::Get => self.client.get(url).send().await?,
        };
        let status = response.status().as_u16();

        // For GET this drops the body stream unread, aborting the download
        drop(response);
        Ok(status)
    }
}

// =============================================================================
// SWEEPER
// =============================================================================

/// Outcome of asking for a sweep
pub enum SweepTrigger {
    Started(SweepHandle),
    /// A sweep is already in flight in this process; nothing was started
    AlreadyRunning,
}

/// Handle to a submitted sweep. Dropping it leaves the sweep running.
pub struct SweepHandle {
    pub run_id: Uuid,
    join: JoinHandle<SweepReport>,
}

impl SweepHandle {
    /// Wait for the sweep to finish. `None` if the task panicked.
    pub async fn wait(self) -> Option<SweepReport> {
        match self.join.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Keeper job {} did not complete: {}", self.run_id, e);
                None
            },
        }
    }
}

/// Clears the in-flight flag when the sweep task ends, panics included
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Sweeper {
    links: LinkService,
    job_status: JobStatusService,
    pinger: Arc<dyn Pinger>,
    delay: Duration,
    in_flight: Arc<AtomicBool>,
}

impl Sweeper {
    pub fn new(
        links: LinkService,
        job_status: JobStatusService,
        pinger: Arc<dyn Pinger>,
        delay: Duration,
    ) -> Self {
        Self {
            links,
            job_status,
            pinger,
            delay,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit a sweep to the runtime and return without waiting for it.
    ///
    /// At most one sweep runs per process. The job status is set to `running`
    /// before this returns, so a client polling right after sees the new run.
    pub async fn trigger(self: &Arc<Self>) -> SweepTrigger {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Keeper job already running, not starting another");
            return SweepTrigger::AlreadyRunning;
        }
        let guard = InFlightGuard(self.in_flight.clone());

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        if let Err(e) = self.job_status.set_running(run_id, started_at).await {
            warn!("Failed to mark keeper job {} as running: {}", run_id, e);
        }

        let sweeper = Arc::clone(self);
        let join = tokio::spawn(async move {
            let _guard = guard;
            sweeper.run(run_id, started_at).await
        });

        SweepTrigger::Started(SweepHandle { run_id, join })
    }

    async fn run(&self, run_id: Uuid, started_at: chrono::DateTime<Utc>) -> SweepReport {
        info!("Keeper job {} started at {}", run_id, started_at.to_rfc3339());

        // Snapshot; links added during the sweep wait for the next one
        let urls = match self.links.list().await {
            Ok(urls) => urls,
            Err(e) => {
                error!("Keeper job {} could not list links: {}", run_id, e);
                Vec::new()
            },
        };

        if urls.is_empty() {
            info!("No URLs to process.");
        } else {
            info!("Processing {} URLs.", urls.len());
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay).await;
            }

            match self.pinger.ping(url.as_str()).await {
                Ok(status) => {
                    info!("Pinged {} - Status: {}", url, status);
                    succeeded += 1;
                },
                Err(e) => {
                    warn!("Failed to ping {}: {}", url, e);
                    failed += 1;
                },
            }
        }

        let report = SweepReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total: urls.len(),
            succeeded,
            failed,
        };

        if let Err(e) = self.job_status.set_finished(&report).await {
            error!("Failed to mark keeper job {} as finished: {}", run_id, e);
        }
        info!(
            "Keeper job {} finished: {} pinged, {} failed",
            run_id, succeeded, failed
        );

        report
    }
}
