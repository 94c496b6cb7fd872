//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{Episode, EpisodeId, Series};
use crate::searcher::{EpisodeResults, SearchError, SearchParams, SearchResult, Searcher};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub series_id: String,
    /// Requested episodes, in request order.
    pub episode_ids: Vec<EpisodeId>,
    pub params: SearchParams,
}

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configured results per episode
/// - Track searches for assertions
/// - Simulate failures and slow searches
///
/// # Example
///
/// ```rust,ignore
/// use showrunner_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::named("mock");
/// searcher.set_results(episode.id, vec![fixtures::search_result("a.mkv", "file")]).await;
///
/// let results = searcher.search(&series, &[episode], &params).await?;
/// assert_eq!(searcher.recorded_searches().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    name: String,
    /// Configured results per episode.
    results: Arc<RwLock<HashMap<EpisodeId, Vec<SearchResult>>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Simulated latency per search.
    delay: Arc<RwLock<Option<Duration>>>,
    /// If set, the next search panics.
    panic_next: Arc<RwLock<bool>>,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a mock searcher named "mock" with no results.
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            panic_next: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the results returned for an episode.
    pub async fn set_results(&self, episode_id: EpisodeId, results: Vec<SearchResult>) {
        self.results.write().await.insert(episode_id, results);
    }

    /// Make the next search fail.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Make the next search panic.
    pub async fn panic_next(&self) {
        *self.panic_next.write().await = true;
    }

    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        series: &Series,
        episodes: &[Episode],
        params: &SearchParams,
    ) -> Result<EpisodeResults, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            series_id: series.id.clone(),
            episode_ids: episodes.iter().map(|ep| ep.id).collect(),
            params: params.clone(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_panic = std::mem::take(&mut *self.panic_next.write().await);
        if should_panic {
            panic!("simulated searcher panic");
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let results = self.results.read().await;
        Ok(episodes
            .iter()
            .filter_map(|ep| {
                let list = results.get(&ep.id)?;
                let list = list
                    .iter()
                    .cloned()
                    .map(|mut r| {
                        r.searcher = self.name.clone();
                        r
                    })
                    .collect();
                Some((ep.id, list))
            })
            .collect())
    }
}
