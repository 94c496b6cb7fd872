//! Pipeline results and errors.

use thiserror::Error;

use crate::catalog::{CatalogError, Episode, Series};

/// Ready episodes of one series, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesNeed {
    pub series: Series,
    pub episodes: Vec<Episode>,
}

/// How a need scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Nothing is ready.
    UpToDate,
    /// Episodes are ready but no searchers are enabled.
    NoSearchersEnabled,
    /// The searchers were queried.
    Searched,
}

/// Result of [`AcquisitionPipeline::check_new_episodes`](super::AcquisitionPipeline::check_new_episodes).
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub need: Vec<SeriesNeed>,
    /// Episodes for which at least one candidate was queued.
    pub found: Vec<Episode>,
    pub outcome: ScanOutcome,
}

impl ScanReport {
    /// Number of ready episodes across all series.
    pub fn needed_count(&self) -> usize {
        self.need.iter().map(|n| n.episodes.len()).sum()
    }
}

/// Errors from pipeline operations.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result of one candidate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Retrieved,
    /// Try the next candidate.
    Failed,
    /// Skip the remaining candidates of this episode.
    Abandoned,
}
