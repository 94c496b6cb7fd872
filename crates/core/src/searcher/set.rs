//! The ordered set of enabled searchers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{EpisodeResults, SearchError, SearchParams, Searcher};
use crate::catalog::{Episode, Series};

/// Enabled searchers, queried in configured order.
#[derive(Clone, Default)]
pub struct SearcherSet {
    searchers: Vec<Arc<dyn Searcher>>,
}

impl SearcherSet {
    pub fn new(searchers: Vec<Arc<dyn Searcher>>) -> Self {
        Self { searchers }
    }

    /// Select the `enabled` names (in that order) from the available searchers.
    /// Unknown names are logged and skipped.
    pub fn from_enabled(available: Vec<Arc<dyn Searcher>>, enabled: &[String]) -> Self {
        let mut searchers = Vec::new();
        for name in enabled {
            match available.iter().find(|s| s.name() == name) {
                Some(searcher) => {
                    if !searchers.iter().any(|s: &Arc<dyn Searcher>| s.name() == name) {
                        searchers.push(Arc::clone(searcher));
                    }
                }
                None => warn!("unknown searcher {:?} in configuration; skipping", name),
            }
        }
        Self { searchers }
    }

    pub fn is_empty(&self) -> bool {
        self.searchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.searchers.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.searchers.iter().map(|s| s.name()).collect()
    }

    /// Search all enabled searchers for the given episodes.
    ///
    /// Episodes satisfied by an earlier searcher are not requested from later
    /// ones. A failing searcher is logged and skipped; the search only fails
    /// when every searcher failed.
    pub async fn search(
        &self,
        series: &Series,
        episodes: &[Episode],
        params: &SearchParams,
    ) -> Result<EpisodeResults, SearchError> {
        let mut found: EpisodeResults = HashMap::new();
        let mut errors = HashMap::new();

        for searcher in &self.searchers {
            let remaining: Vec<Episode> = episodes
                .iter()
                .filter(|ep| !found.contains_key(&ep.id))
                .cloned()
                .collect();
            if remaining.is_empty() {
                break;
            }

            match searcher.search(series, &remaining, params).await {
                Ok(results) => {
                    for (id, list) in results {
                        if list.is_empty() || !remaining.iter().any(|ep| ep.id == id) {
                            continue;
                        }
                        debug!(
                            searcher = searcher.name(),
                            episode_id = id,
                            "{} result(s)",
                            list.len()
                        );
                        found.insert(id, list);
                    }
                }
                Err(e) => {
                    warn!(
                        "searcher {} failed for {}: {}",
                        searcher.name(),
                        series.name,
                        e
                    );
                    errors.insert(searcher.name().to_string(), e.to_string());
                }
            }
        }

        if found.is_empty() && !errors.is_empty() && errors.len() == self.searchers.len() {
            return Err(SearchError::AllSearchersFailed(errors));
        }
        Ok(found)
    }
}
