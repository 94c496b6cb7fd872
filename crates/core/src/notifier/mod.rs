//! Notification backends.
//!
//! Notifiers are told about each batch of retrieved episodes. Their
//! failures are logged and never affect the acquisition pipeline.

mod telegram;
mod types;
mod webhook;

pub use telegram::TelegramNotifier;
pub use types::*;
pub use webhook::WebhookNotifier;

use std::sync::Arc;
use tracing::{info, warn};

/// The enabled notifiers.
#[derive(Clone, Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Call every notifier with the batch. Errors are logged.
    pub async fn notify(&self, episodes: &[RetrievedEpisode]) {
        if episodes.is_empty() {
            return;
        }
        for notifier in &self.notifiers {
            match notifier.notify(episodes).await {
                Ok(()) => info!(
                    "notified {} about {} episode(s)",
                    notifier.name(),
                    episodes.len()
                ),
                Err(e) => warn!("notifier {} failed: {}", notifier.name(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockNotifier};

    #[tokio::test]
    async fn test_failures_do_not_stop_other_notifiers() {
        let failing = Arc::new(MockNotifier::new("failing"));
        failing.set_fail(true).await;
        let working = Arc::new(MockNotifier::new("working"));

        let set = NotifierSet::new(vec![failing.clone(), working.clone()]);
        let series = fixtures::series("thetvdb:1", "Show");
        let episode = fixtures::aired_episode(1, &series.id, 1, 1, 1);
        set.notify(&[RetrievedEpisode { series, episode }]).await;

        assert_eq!(failing.batches().await.len(), 1);
        assert_eq!(working.batches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let notifier = Arc::new(MockNotifier::new("mock"));
        let set = NotifierSet::new(vec![notifier.clone()]);
        set.notify(&[]).await;
        assert!(notifier.batches().await.is_empty());
    }
}
