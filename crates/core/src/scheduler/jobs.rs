use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::traits::{JobResult, Schedule, SchedulerJob};
use crate::catalog::MetadataSync;
use crate::pipeline::{AcquisitionPipeline, ScanOutcome};

/// Resyncs the catalog when the last sync is older than `max_age`.
///
/// The condition is checked every `poll`, starting immediately.
pub struct CatalogResyncJob {
    sync: Arc<dyn MetadataSync>,
    max_age: chrono::Duration,
    poll: Duration,
}

impl CatalogResyncJob {
    pub fn new(sync: Arc<dyn MetadataSync>, max_age: chrono::Duration, poll: Duration) -> Self {
        Self {
            sync,
            max_age,
            poll,
        }
    }

    /// Whether a sync is due at `now`. A catalog that was never synced is due.
    pub async fn is_due(&self, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let last = self
            .sync
            .last_synced_at()
            .await
            .context("failed to read last sync time")?;
        Ok(last.is_none_or(|at| now - at > self.max_age))
    }
}

#[async_trait]
impl SchedulerJob for CatalogResyncJob {
    fn name(&self) -> &'static str {
        "CatalogResync"
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.poll)
    }

    async fn execute(&self) -> JobResult {
        if !self.is_due(Utc::now()).await? {
            debug!("catalog is fresh; skipping resync");
            return Ok(());
        }

        info!("catalog is stale; resyncing with {}", self.sync.name());
        let touched = self
            .sync
            .sync()
            .await
            .with_context(|| format!("{} sync failed", self.sync.name()))?;
        info!("catalog resync finished ({} series)", touched);
        Ok(())
    }
}

/// Checks for new episodes daily at fixed hours.
pub struct EpisodeCheckJob {
    pipeline: Arc<AcquisitionPipeline>,
    hours: Vec<u32>,
    minute: u32,
}

impl EpisodeCheckJob {
    pub fn new(pipeline: Arc<AcquisitionPipeline>, hours: Vec<u32>, minute: u32) -> Self {
        let job = Self {
            pipeline,
            hours,
            minute,
        };
        info!("scheduling checks at {}", job.schedule().describe());
        job
    }
}

#[async_trait]
impl SchedulerJob for EpisodeCheckJob {
    fn name(&self) -> &'static str {
        "EpisodeCheck"
    }

    fn schedule(&self) -> Schedule {
        Schedule::DailyAt {
            hours: self.hours.clone(),
            minute: self.minute,
        }
    }

    async fn execute(&self) -> JobResult {
        let report = self
            .pipeline
            .check_new_episodes(None)
            .await
            .context("episode check failed")?;

        if report.outcome == ScanOutcome::Searched {
            info!(
                "episode check: {} needed, {} found",
                report.needed_count(),
                report.found.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSync;

    fn job(sync: &Arc<MockSync>) -> CatalogResyncJob {
        CatalogResyncJob::new(
            Arc::clone(sync) as Arc<dyn MetadataSync>,
            chrono::Duration::hours(12),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_never_synced_is_due() {
        let sync = Arc::new(MockSync::new());
        job(&sync).execute().await.unwrap();
        assert_eq!(sync.sync_count().await, 1);
    }

    #[tokio::test]
    async fn test_fresh_catalog_is_not_resynced() {
        let sync = Arc::new(MockSync::new());
        sync.set_last_synced(Some(Utc::now() - chrono::Duration::hours(2)))
            .await;
        job(&sync).execute().await.unwrap();
        assert_eq!(sync.sync_count().await, 0);
    }

    #[tokio::test]
    async fn test_stale_catalog_is_resynced() {
        let sync = Arc::new(MockSync::new());
        sync.set_last_synced(Some(Utc::now() - chrono::Duration::hours(13)))
            .await;
        let job = job(&sync);
        assert!(job.is_due(Utc::now()).await.unwrap());
        job.execute().await.unwrap();
        assert_eq!(sync.sync_count().await, 1);
        assert!(!job.is_due(Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_failure_is_reported() {
        let sync = Arc::new(MockSync::new());
        sync.set_fail(true).await;
        let err = job(&sync).execute().await.unwrap_err();
        assert!(format!("{:#}", err).contains("mock sync failed"));
    }
}
