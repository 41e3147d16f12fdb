pub mod session_sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::SessionConfig;
use crate::selection::session::SessionStore;

/// Timeout for individual worker invocations.
const WORKER_TIMEOUT: Duration = Duration::from_secs(60);

/// Drain period before scheduler shutdown to let in-flight tasks complete.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    SessionSweep,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionSweep => "session_sweep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub every: Duration,
    pub enabled: bool,
}

pub struct WorkerManager {
    sessions: Arc<SessionStore>,
    shutdown_rx: broadcast::Receiver<()>,
    config: SessionConfig,
}

impl WorkerManager {
    pub fn new(
        sessions: Arc<SessionStore>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            shutdown_rx,
            config: config.clone(),
        }
    }

    /// Single source of truth for all planned jobs and their intervals.
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        vec![JobSpec {
            name: WorkerName::SessionSweep,
            every: Duration::from_secs(self.config.sweep_interval_secs),
            // interval 为 0 表示关闭清理
            enabled: self.config.sweep_interval_secs > 0,
        }]
    }

    /// Start the worker scheduler and block until shutdown is broadcast.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let specs = self.planned_jobs();
        if specs.iter().all(|s| !s.enabled) {
            tracing::info!("No workers enabled; skipping scheduler startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;
        self.register_jobs(&scheduler, &specs).await;
        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            drain_ms = DRAIN_TIMEOUT.as_millis() as u64,
            "Worker manager shutting down"
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler, specs: &[JobSpec]) {
        for spec in specs {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let name_str = spec.name.as_str();
            match spec.name {
                WorkerName::SessionSweep => {
                    let sessions = self.sessions.clone();
                    let ttl = Duration::from_secs(self.config.ttl_secs);
                    add_job(scheduler, spec.every, name_str, move || {
                        let sessions = sessions.clone();
                        async move {
                            session_sweep::run(&sessions, ttl).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(
                name = name_str,
                every_secs = spec.every.as_secs(),
                "Registered worker"
            );
        }
    }
}

/// Add a repeating job with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(scheduler: &JobScheduler, every: Duration, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_repeated_async(every, move |_uuid, _lock| {
        let guard = running.clone();

        if guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        }

        let fut = run();
        Box::pin(async move {
            if tokio::time::timeout(WORKER_TIMEOUT, fut).await.is_err() {
                tracing::error!(
                    worker = name,
                    timeout_secs = WORKER_TIMEOUT.as_secs(),
                    "Worker timed out"
                );
            }
            guard.store(false, Ordering::SeqCst);
        })
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error = %err, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error = %err, worker = name, "Failed to create worker job"),
    }
}
