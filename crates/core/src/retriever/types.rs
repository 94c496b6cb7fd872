//! Retriever trait and error taxonomy.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::Episode;
use crate::searcher::SearchResult;

/// Errors a retriever (or the dispatcher) can report.
///
/// Backends classify their own failures: `Soft`/`Hard` let the dispatcher
/// move on to the next backend, `AbortedSoft`/`AbortedHard` stop dispatch for
/// the result immediately. `Internal` marks anything unclassified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrieverError {
    /// Transient failure (network, missing source). Try the next backend.
    #[error("Retrieval failed: {0}")]
    Soft(String),

    /// Failure that is unlikely to go away (local write error). Try the next
    /// backend, but report it if nothing succeeds.
    #[error("Retrieval failed (hard): {0}")]
    Hard(String),

    /// The result itself is bad. Stop trying backends for it.
    #[error("Retrieval aborted: {0}")]
    AbortedSoft(String),

    /// The result is bad and so are its siblings. Stop trying this episode.
    #[error("Retrieval aborted (hard): {0}")]
    AbortedHard(String),

    /// Unclassified error or a backend panic.
    #[error("Internal retriever error: {0}")]
    Internal(String),

    #[error("No enabled retriever found for the given result ({result_type})")]
    NoRetriever { result_type: String },

    #[error("No retriever plugins were able to fetch the file")]
    Exhausted,
}

/// What the dispatcher does after a backend reported an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Propagate to the caller without trying more backends.
    Abort,
    /// Log, suppress and try the next backend.
    TryNext,
}

impl RetrieverError {
    pub fn disposition(&self) -> Disposition {
        match self {
            RetrieverError::AbortedSoft(_) | RetrieverError::AbortedHard(_) => Disposition::Abort,
            _ => Disposition::TryNext,
        }
    }

    /// Errors worth surfacing when every backend failed.
    pub fn is_significant(&self) -> bool {
        matches!(self, RetrieverError::Hard(_) | RetrieverError::Internal(_))
    }

    /// Whether the remaining candidates of the episode should be skipped too.
    pub fn is_hard_abort(&self) -> bool {
        matches!(self, RetrieverError::AbortedHard(_))
    }
}

/// A backend that turns a search result into a file on disk.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Name used in configuration and logs.
    fn name(&self) -> &str;

    /// Whether this backend can handle results of the given type.
    fn supports(&self, result_type: &str) -> bool;

    /// Always-enabled backends are tried after the configured ones even when
    /// they are not listed.
    fn always_enabled(&self) -> bool {
        false
    }

    /// Fetch `result` into `target`.
    async fn retrieve(
        &self,
        episode: &Episode,
        result: &SearchResult,
        target: &Path,
    ) -> Result<(), RetrieverError>;
}
