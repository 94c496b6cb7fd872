//! Searching for needed episodes and queueing the results.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info};

use super::{AcquisitionPipeline, QueueEntry, QueuedEpisode, SeriesNeed};
use crate::catalog::{Episode, Quality, Series};
use crate::searcher::SearchParams;

const MIB: f64 = 1024.0 * 1024.0;
const DEFAULT_RUNTIME_MINUTES: u32 = 30;
const DATE_FLOOR_SLACK_DAYS: i64 = 3;

/// Search parameters for a series' need list.
///
/// The date floor is the earliest air date minus three days. The minimum
/// size assumes 5.5 MiB per minute of runtime for HD and 3 MiB otherwise;
/// the ideal size is ten times that for `Any` quality, five times otherwise.
pub fn search_params(series: &Series, episodes: &[Episode]) -> SearchParams {
    let date_floor = episodes
        .iter()
        .filter_map(Episode::airdate)
        .min()
        .map(|earliest| earliest - Duration::days(DATE_FLOOR_SLACK_DAYS));

    let mib_per_minute = match series.quality {
        Quality::Hd => 5.5,
        _ => 3.0,
    };
    let runtime = series.runtime_minutes.unwrap_or(DEFAULT_RUNTIME_MINUTES);
    let min_size = (runtime as f64 * mib_per_minute * MIB) as u64;
    let factor = match series.quality {
        Quality::Any => 10,
        _ => 5,
    };

    SearchParams {
        date_floor,
        ideal_size: min_size * factor,
        min_size,
        quality: series.quality,
    }
}

impl AcquisitionPipeline {
    /// Search every series in `need` and queue the episodes that have
    /// candidates. Returns those episodes.
    ///
    /// A failed search is logged and does not affect the other series.
    pub async fn search_and_queue(self: &Arc<Self>, need: &[SeriesNeed]) -> Vec<Episode> {
        let mut found = Vec::new();

        for SeriesNeed { series, episodes } in need {
            let params = search_params(series, episodes);
            info!(
                "searching for {} episode(s) of {}",
                episodes.len(),
                series.name
            );

            let mut results = match self.searchers.search(series, episodes, &params).await {
                Ok(results) => results,
                Err(e) => {
                    error!("search for {} failed: {}", series.name, e);
                    continue;
                }
            };

            let mut queued = Vec::new();
            for ep in episodes {
                let Some(candidates) = results.remove(&ep.id) else {
                    continue;
                };
                for r in &candidates {
                    debug!(
                        "result {} ({:.1}M)",
                        r.filename,
                        r.size_bytes as f64 / MIB
                    );
                }
                queued.push(QueuedEpisode {
                    episode_id: ep.id,
                    code: ep.code,
                    results: candidates,
                });
                found.push(ep.clone());
            }

            if queued.is_empty() {
                debug!("no results for {}", series.name);
                continue;
            }

            self.queue.push(QueueEntry {
                series: series.clone(),
                episodes: queued,
            });
            self.signal_queue();
        }

        debug!(
            "new episode check finished, found {} result(s)",
            found.len()
        );
        found
    }
}
