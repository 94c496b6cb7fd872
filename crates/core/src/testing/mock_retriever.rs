//! Mock retriever for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{Episode, EpisodeId};
use crate::retriever::{Retriever, RetrieverError};
use crate::searcher::SearchResult;

/// A recorded retrieval attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRetrieval {
    pub episode_id: EpisodeId,
    /// File name of the search result.
    pub filename: String,
    pub target: PathBuf,
}

/// Mock implementation of the Retriever trait.
///
/// Succeeds by default and writes a small file at the target. Failures can
/// be scripted per call (`push_outcome`) or per result file name
/// (`fail_filename`).
#[derive(Debug)]
pub struct MockRetriever {
    name: String,
    result_types: Vec<String>,
    always: bool,
    /// Scripted outcomes, consumed one per call.
    outcomes: Arc<RwLock<VecDeque<Result<(), RetrieverError>>>>,
    /// Errors returned for every attempt on a given result file name.
    filename_errors: Arc<RwLock<HashMap<String, RetrieverError>>>,
    panic_next: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedRetrieval>>>,
}

impl MockRetriever {
    /// Create a mock retriever supporting the given result types.
    pub fn new(name: &str, result_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            result_types: result_types.iter().map(|t| t.to_string()).collect(),
            always: false,
            outcomes: Arc::new(RwLock::new(VecDeque::new())),
            filename_errors: Arc::new(RwLock::new(HashMap::new())),
            panic_next: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Mark the retriever as always enabled.
    pub fn with_always_enabled(mut self) -> Self {
        self.always = true;
        self
    }

    /// Queue the outcome of the next unscripted call.
    pub async fn push_outcome(&self, outcome: Result<(), RetrieverError>) {
        self.outcomes.write().await.push_back(outcome);
    }

    /// Fail every attempt on results named `filename`.
    pub async fn fail_filename(&self, filename: &str, error: RetrieverError) {
        self.filename_errors
            .write()
            .await
            .insert(filename.to_string(), error);
    }

    /// Panic on the next call.
    pub async fn panic_next(&self) {
        *self.panic_next.write().await = true;
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn calls(&self) -> Vec<RecordedRetrieval> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, result_type: &str) -> bool {
        self.result_types.iter().any(|t| t == result_type)
    }

    fn always_enabled(&self) -> bool {
        self.always
    }

    async fn retrieve(
        &self,
        episode: &Episode,
        result: &SearchResult,
        target: &Path,
    ) -> Result<(), RetrieverError> {
        self.calls.write().await.push(RecordedRetrieval {
            episode_id: episode.id,
            filename: result.filename.clone(),
            target: target.to_path_buf(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_panic = std::mem::take(&mut *self.panic_next.write().await);
        if should_panic {
            panic!("simulated retriever panic");
        }

        if let Some(error) = self.filename_errors.read().await.get(&result.filename) {
            return Err(error.clone());
        }

        let outcome = self.outcomes.write().await.pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            let _ = tokio::fs::write(target, result.filename.as_bytes()).await;
        }
        outcome
    }
}
