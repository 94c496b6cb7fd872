//! Periodic background jobs.

mod jobs;
mod traits;

pub use jobs::{CatalogResyncJob, EpisodeCheckJob};
pub use traits::{JobResult, Schedule, SchedulerJob};

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Scheduler service that runs registered jobs on their schedules.
///
/// Each job runs in its own tokio task. A job that is still executing
/// when its next trigger comes due does not run twice; missed triggers are
/// skipped.
///
/// # Example
///
/// ```rust,ignore
/// let scheduler = SchedulerService::new()
///     .with_job(CatalogResyncJob::new(sync, max_age, poll))
///     .with_job(EpisodeCheckJob::new(pipeline, hours, minute));
///
/// scheduler.start();
/// // ...
/// scheduler.stop();
/// ```
pub struct SchedulerService {
    jobs: Vec<Arc<dyn SchedulerJob>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SchedulerService {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            jobs: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Adds a job. Jobs are not started until [`start`](Self::start) is called.
    pub fn with_job<J: SchedulerJob + 'static>(mut self, job: J) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Spawn one task per job and return immediately.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return Vec::new();
        }

        self.jobs
            .iter()
            .map(|job| {
                let job = Arc::clone(job);
                let shutdown_rx = self.shutdown_tx.subscribe();
                tokio::spawn(async move {
                    Self::run_job_loop(job, shutdown_rx).await;
                })
            })
            .collect()
    }

    /// Signal every job loop to stop. Jobs already executing finish on
    /// their own.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());
    }

    async fn run_job_loop(job: Arc<dyn SchedulerJob>, mut shutdown_rx: broadcast::Receiver<()>) {
        let name = job.name();
        match job.schedule() {
            Schedule::Every(interval) => {
                let mut timer = tokio::time::interval(interval);
                timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = timer.tick() => Self::run_once(job.as_ref()).await,
                    }
                }
            }
            schedule @ Schedule::DailyAt { .. } => loop {
                let now = Local::now();
                let Some(next) = schedule.next_after(&now) else {
                    error!("Job '{}' has no valid run time; not scheduling", name);
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();
                debug!("Job '{}' next runs at {}", name, next.format("%Y-%m-%d %H:%M"));

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(wait) => Self::run_once(job.as_ref()).await,
                }
            },
        }
        debug!("Job '{}' stopped", name);
    }

    /// Run one execution. A panic is logged and the job stays scheduled.
    async fn run_once(job: &dyn SchedulerJob) {
        match AssertUnwindSafe(job.execute()).catch_unwind().await {
            Ok(Ok(())) => debug!("Job '{}' completed successfully", job.name()),
            Ok(Err(e)) => error!("Job '{}' failed: {:#}", job.name(), e),
            Err(_) => error!("Job '{}' panicked; it will run again on schedule", job.name()),
        }
    }
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}
