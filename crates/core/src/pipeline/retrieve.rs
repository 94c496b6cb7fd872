//! Draining the retrieval queue.

use std::sync::Arc;

use tokio::fs;
use tracing::{debug, error, info, warn};

use super::{AcquisitionPipeline, AttemptOutcome, PipelineError, QueuedEpisode};
use crate::catalog::{Episode, EpisodeStatus, Series};
use crate::notifier::RetrievedEpisode;
use crate::searcher::SearchResult;

impl AcquisitionPipeline {
    /// Start draining the queue in the background. Does nothing extra when a
    /// drain is already running.
    pub fn signal_queue(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.process_retrieve_queue().await;
        });
    }

    /// Drain the queue until it is empty and return what was retrieved.
    ///
    /// Only one drain runs at a time; concurrent callers join it. Entries
    /// queued after a drain saw the queue empty are picked up by a follow-up
    /// drain before this returns.
    pub async fn process_retrieve_queue(self: &Arc<Self>) -> Vec<RetrievedEpisode> {
        let mut retrieved = Vec::new();
        loop {
            let this = Arc::clone(self);
            let batch = self
                .drain_flight
                .run(move || async move { this.drain().await })
                .await;
            retrieved.extend(batch);

            if !self.queue.has_pending() {
                break;
            }
            debug!("entries queued during drain; draining again");
        }
        retrieved
    }

    async fn drain(&self) -> Vec<RetrievedEpisode> {
        let mut retrieved = Vec::new();

        while let Some(entry) = self.queue.begin_next() {
            let series = match self.catalog.get_series(&entry.series.id) {
                Ok(Some(series)) => series,
                Ok(None) => entry.series.clone(),
                Err(e) => {
                    warn!("cannot reload series {}: {}", entry.series.name, e);
                    entry.series.clone()
                }
            };

            for queued in entry.episodes_in_order() {
                match self.process_episode(&series, &queued).await {
                    Ok(Some(episode)) => retrieved.push(RetrievedEpisode {
                        series: series.clone(),
                        episode,
                    }),
                    Ok(None) => {}
                    Err(e) => error!(
                        "retrieval of {} {} failed: {}",
                        series.name, queued.code, e
                    ),
                }
            }
        }

        if !retrieved.is_empty() {
            self.notifiers.notify(&retrieved).await;
        }
        retrieved
    }

    async fn process_episode(
        &self,
        series: &Series,
        queued: &QueuedEpisode,
    ) -> Result<Option<Episode>, PipelineError> {
        let Some(mut episode) = self.catalog.get_episode(queued.episode_id)? else {
            warn!(
                "{} {} disappeared from the catalog; skipping",
                series.name, queued.code
            );
            return Ok(None);
        };

        if episode.status == EpisodeStatus::Have {
            error!(
                "BUG: scheduled to retrieve {} {} but it is already retrieved",
                series.name, episode.code
            );
            return Ok(None);
        }

        if let Some(filename) = episode.filename.clone() {
            let existing = self.layout.episode_path(series, episode.code, &filename);
            if fs::try_exists(&existing).await.unwrap_or(false) {
                let Some(result) = episode.search_result.clone() else {
                    error!(
                        "scheduled to fetch {} but it already exists; skipping",
                        existing.display()
                    );
                    return Ok(None);
                };

                info!("resuming retrieval of {} {} from last search result", series.name, episode.code);
                match self.get_episode(series, &mut episode, &result).await? {
                    AttemptOutcome::Retrieved => return Ok(Some(episode)),
                    AttemptOutcome::Abandoned => return Ok(None),
                    AttemptOutcome::Failed => {
                        warn!("resume failed, trying other search results");
                        episode.filename = None;
                        episode.search_result = None;
                        self.catalog.update_episode(&episode)?;
                    }
                }
            }
        }

        for result in &queued.results {
            match self.get_episode(series, &mut episode, result).await? {
                AttemptOutcome::Retrieved => return Ok(Some(episode)),
                AttemptOutcome::Failed => continue,
                AttemptOutcome::Abandoned => {
                    warn!(
                        "giving up on the remaining results for {} {}",
                        series.name, episode.code
                    );
                    return Ok(None);
                }
            }
        }

        warn!(
            "no result could be retrieved for {} {}",
            series.name, episode.code
        );
        Ok(None)
    }

    /// Retrieve one candidate for `episode`, persisting the chosen result
    /// and filename before the transfer starts.
    async fn get_episode(
        &self,
        series: &Series,
        episode: &mut Episode,
        result: &SearchResult,
    ) -> Result<AttemptOutcome, PipelineError> {
        let season_dir = self.layout.season_dir(series, episode.code);
        if let Err(e) = fs::create_dir_all(&season_dir).await {
            error!("cannot create {}: {}", season_dir.display(), e);
            return Ok(AttemptOutcome::Failed);
        }

        let filename = self.layout.target_filename(series, episode, result);
        let target = season_dir.join(&filename);

        episode.search_result = Some(result.clone());
        episode.filename = Some(filename);
        self.catalog.update_episode(episode)?;

        info!(
            "starting retrieval of {} {} ({})",
            series.name, episode.code, result.searcher
        );

        match self.dispatcher.retrieve(episode, result, &target).await {
            Ok(retriever) => {
                info!(
                    "successfully retrieved {} {} with {}",
                    series.name, episode.code, retriever
                );
                episode.status = EpisodeStatus::Have;
                self.catalog.update_episode(episode)?;
                Ok(AttemptOutcome::Retrieved)
            }
            Err(e) => {
                error!(
                    "retrieval of {} {} from {} failed: {}",
                    series.name, episode.code, result.filename, e
                );
                episode.filename = None;
                self.catalog.update_episode(episode)?;
                if e.is_hard_abort() {
                    Ok(AttemptOutcome::Abandoned)
                } else {
                    Ok(AttemptOutcome::Failed)
                }
            }
        }
    }
}
