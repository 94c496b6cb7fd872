//! Need detection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{AcquisitionPipeline, PipelineError, ScanOutcome, ScanReport, SeriesNeed};

impl AcquisitionPipeline {
    /// Scan the catalog for ready episodes, search for them and queue what
    /// was found.
    ///
    /// Only one scan runs at a time; a call made while a scan is running
    /// waits for it and receives its report (its own `only` is ignored).
    pub async fn check_new_episodes(
        self: &Arc<Self>,
        only: Option<Vec<String>>,
    ) -> Result<ScanReport, PipelineError> {
        let this = Arc::clone(self);
        self.scan_flight
            .run(move || async move { this.scan(only.as_deref()).await })
            .await
    }

    async fn scan(self: &Arc<Self>, only: Option<&[String]>) -> Result<ScanReport, PipelineError> {
        info!("checking for new episodes and availability");
        let need = self.find_needed(only, Utc::now())?;

        if need.is_empty() {
            info!("no new episodes; all up to date");
            return Ok(ScanReport {
                need,
                found: Vec::new(),
                outcome: ScanOutcome::UpToDate,
            });
        }

        if self.searchers.is_empty() {
            error!("episodes require fetching but no searchers are enabled");
            return Ok(ScanReport {
                need,
                found: Vec::new(),
                outcome: ScanOutcome::NoSearchersEnabled,
            });
        }

        let found = self.search_and_queue(&need).await;
        Ok(ScanReport {
            need,
            found,
            outcome: ScanOutcome::Searched,
        })
    }

    /// Ready episodes per series that are not already queued, as of `now`.
    ///
    /// Paused series and series without ready episodes are left out.
    pub fn find_needed(
        &self,
        only: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeriesNeed>, PipelineError> {
        let mut need = Vec::new();

        for series in self.catalog.list_series()? {
            if only.is_some_and(|ids| !ids.contains(&series.id)) {
                continue;
            }
            if series.paused {
                debug!("{} is paused; skipping", series.name);
                continue;
            }

            let mut episodes = Vec::new();
            for ep in self.catalog.episodes_of(&series.id)? {
                if !ep.is_ready(now) {
                    continue;
                }
                let aired = ep
                    .aired_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                debug!("need {} {} ({}): {}", series.name, ep.code, aired, ep.name);
                if self.queue.contains(ep.id) {
                    debug!("episode is already queued for retrieval, skipping");
                    continue;
                }
                episodes.push(ep);
            }

            if !episodes.is_empty() {
                episodes.sort_by_key(|ep| ep.code);
                need.push(SeriesNeed { series, episodes });
            }
        }

        Ok(need)
    }
}
