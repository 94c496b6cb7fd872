//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{Notifier, NotifierError, RetrievedEpisode};

/// Mock implementation of the Notifier trait. Records every batch.
#[derive(Debug)]
pub struct MockNotifier {
    name: String,
    batches: Arc<RwLock<Vec<Vec<RetrievedEpisode>>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batches: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every notification fail (after being recorded).
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn batches(&self) -> Vec<Vec<RetrievedEpisode>> {
        self.batches.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, episodes: &[RetrievedEpisode]) -> Result<(), NotifierError> {
        self.batches.write().await.push(episodes.to_vec());
        if *self.fail.read().await {
            return Err(NotifierError::Api("simulated notifier failure".to_string()));
        }
        Ok(())
    }
}
