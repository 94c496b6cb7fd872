//! Dispatch of one search result across the configured retrievers.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::{Disposition, Retriever, RetrieverError};
use crate::catalog::Episode;
use crate::searcher::SearchResult;

/// Tries eligible retrievers in order: the configured enabled names first,
/// then every always-enabled backend.
#[derive(Clone)]
pub struct RetrieverDispatcher {
    available: Vec<Arc<dyn Retriever>>,
    enabled: Vec<String>,
}

impl RetrieverDispatcher {
    pub fn new(available: Vec<Arc<dyn Retriever>>, enabled: Vec<String>) -> Self {
        for name in &enabled {
            if !available.iter().any(|r| r.name() == name) {
                warn!("unknown retriever {:?} in configuration; skipping", name);
            }
        }
        Self { available, enabled }
    }

    /// Backends eligible for `result_type`, in trial order, each at most once.
    pub fn eligible(&self, result_type: &str) -> Vec<Arc<dyn Retriever>> {
        let configured = self
            .enabled
            .iter()
            .filter_map(|name| self.available.iter().find(|r| r.name() == name));
        let always = self.available.iter().filter(|r| r.always_enabled());

        let mut tried = HashSet::new();
        configured
            .chain(always)
            .filter(|r| r.supports(result_type))
            .filter(|r| tried.insert(r.name().to_string()))
            .cloned()
            .collect()
    }

    /// Retrieve `result` into `target`, returning the name of the backend
    /// that succeeded.
    pub async fn retrieve(
        &self,
        episode: &Episode,
        result: &SearchResult,
        target: &Path,
    ) -> Result<String, RetrieverError> {
        let retrievers = self.eligible(&result.result_type);
        if retrievers.is_empty() {
            return Err(RetrieverError::NoRetriever {
                result_type: result.result_type.clone(),
            });
        }

        let mut suppressed = Vec::new();
        for retriever in retrievers {
            debug!(
                retriever = retriever.name(),
                filename = %result.filename,
                "trying retriever"
            );

            let outcome = AssertUnwindSafe(retriever.retrieve(episode, result, target))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(RetrieverError::Internal(panic_message(panic))));

            let err = match outcome {
                Ok(()) => {
                    info!("retrieved {} with {}", result.filename, retriever.name());
                    return Ok(retriever.name().to_string());
                }
                Err(err) => err,
            };

            if err.disposition() == Disposition::Abort {
                warn!("retriever {} aborted: {}", retriever.name(), err);
                return Err(err);
            }

            match &err {
                RetrieverError::Hard(_) => {
                    error!("retriever {} failed: {}", retriever.name(), err)
                }
                RetrieverError::Internal(_) => error!(
                    "retriever {} hit an unexpected error (this is a bug): {}",
                    retriever.name(),
                    err
                ),
                _ => warn!("retriever {} failed: {}", retriever.name(), err),
            }
            suppressed.push(err);
        }

        Err(suppressed
            .into_iter()
            .find(RetrieverError::is_significant)
            .unwrap_or(RetrieverError::Exhausted))
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("retriever panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("retriever panicked: {}", s)
    } else {
        "retriever panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockRetriever};
    use std::path::PathBuf;

    fn dispatcher(retrievers: &[&Arc<MockRetriever>], enabled: &[&str]) -> RetrieverDispatcher {
        RetrieverDispatcher::new(
            retrievers
                .iter()
                .map(|r| Arc::clone(*r) as Arc<dyn Retriever>)
                .collect(),
            enabled.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn target() -> PathBuf {
        PathBuf::from("/nonexistent/target.mkv")
    }

    #[test]
    fn test_eligible_order_and_dedup() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        let b = Arc::new(MockRetriever::new("b", &["http"]));
        let always = Arc::new(MockRetriever::new("always", &["http"]).with_always_enabled());
        let other = Arc::new(MockRetriever::new("other", &["file"]));

        let d = dispatcher(&[&a, &b, &always, &other], &["b", "nope", "always", "a", "other"]);
        let names: Vec<String> = d
            .eligible("http")
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "always", "a"]);
    }

    #[tokio::test]
    async fn test_no_retriever() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        let d = dispatcher(&[&a], &["a"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "torrent");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        assert_eq!(
            err,
            RetrieverError::NoRetriever {
                result_type: "torrent".to_string()
            }
        );
        assert!(a.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_to_next_backend() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.push_outcome(Err(RetrieverError::Soft("timeout".into()))).await;
        let b = Arc::new(MockRetriever::new("b", &["http"]));

        let d = dispatcher(&[&a, &b], &["a", "b"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let winner = d.retrieve(&ep, &result, &target()).await.unwrap();
        assert_eq!(winner, "b");
        assert_eq!(a.calls().await.len(), 1);
        assert_eq!(b.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_stops_dispatch() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.push_outcome(Err(RetrieverError::AbortedSoft("bad".into()))).await;
        let b = Arc::new(MockRetriever::new("b", &["http"]));

        let d = dispatcher(&[&a, &b], &["a", "b"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        assert_eq!(err, RetrieverError::AbortedSoft("bad".into()));
        assert!(b.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_reports_first_significant_error() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.push_outcome(Err(RetrieverError::Soft("soft".into()))).await;
        let b = Arc::new(MockRetriever::new("b", &["http"]));
        b.push_outcome(Err(RetrieverError::Hard("disk full".into()))).await;
        let c = Arc::new(MockRetriever::new("c", &["http"]));
        c.push_outcome(Err(RetrieverError::Internal("oops".into()))).await;

        let d = dispatcher(&[&a, &b, &c], &["a", "b", "c"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        assert_eq!(err, RetrieverError::Hard("disk full".into()));
    }

    #[tokio::test]
    async fn test_exhaustion_prefers_trial_order_over_severity() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.push_outcome(Err(RetrieverError::Soft("soft".into()))).await;
        let b = Arc::new(MockRetriever::new("b", &["http"]));
        b.push_outcome(Err(RetrieverError::Internal("unexpected".into()))).await;
        let c = Arc::new(MockRetriever::new("c", &["http"]));
        c.push_outcome(Err(RetrieverError::Hard("disk full".into()))).await;

        let d = dispatcher(&[&a, &b, &c], &["a", "b", "c"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        assert_eq!(err, RetrieverError::Internal("unexpected".into()));
        assert_eq!(c.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_with_only_soft_errors() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.push_outcome(Err(RetrieverError::Soft("soft".into()))).await;

        let d = dispatcher(&[&a], &["a"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        assert_eq!(err, RetrieverError::Exhausted);
    }

    #[tokio::test]
    async fn test_panicking_backend_is_contained() {
        let a = Arc::new(MockRetriever::new("a", &["http"]));
        a.panic_next().await;
        let b = Arc::new(MockRetriever::new("b", &["http"]));
        b.push_outcome(Err(RetrieverError::Soft("soft".into()))).await;

        let d = dispatcher(&[&a, &b], &["a", "b"]);
        let ep = fixtures::aired_episode(1, "s", 1, 1, 1);
        let result = fixtures::search_result("a.mkv", "http");

        let err = d.retrieve(&ep, &result, &target()).await.unwrap_err();
        match err {
            RetrieverError::Internal(msg) => assert!(msg.contains("panicked")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(b.calls().await.len(), 1);
    }
}
