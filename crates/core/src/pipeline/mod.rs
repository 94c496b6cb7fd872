//! The acquisition pipeline.
//!
//! Need scan → search → retrieval queue → retriever dispatch → catalog
//! update → notification. Scans and queue drains are single-flight: a call
//! made while one is running joins it.

mod naming;
mod queue;
mod retrieve;
mod scanner;
mod search;
mod single_flight;
mod types;

pub use naming::LibraryLayout;
pub use queue::{QueueEntry, QueuedEpisode, RetrievalQueue};
pub use search::search_params;
pub use single_flight::SingleFlight;
pub(crate) use types::AttemptOutcome;
pub use types::{PipelineError, ScanOutcome, ScanReport, SeriesNeed};

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::notifier::{NotifierSet, RetrievedEpisode};
use crate::retriever::RetrieverDispatcher;
use crate::searcher::SearcherSet;

/// Ties the catalog, searchers, retrievers and notifiers together.
pub struct AcquisitionPipeline {
    catalog: Arc<dyn Catalog>,
    searchers: SearcherSet,
    dispatcher: RetrieverDispatcher,
    notifiers: NotifierSet,
    layout: LibraryLayout,
    queue: RetrievalQueue,
    scan_flight: SingleFlight<Result<ScanReport, PipelineError>>,
    drain_flight: SingleFlight<Vec<RetrievedEpisode>>,
}

impl AcquisitionPipeline {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        searchers: SearcherSet,
        dispatcher: RetrieverDispatcher,
        notifiers: NotifierSet,
        layout: LibraryLayout,
    ) -> Self {
        Self {
            catalog,
            searchers,
            dispatcher,
            notifiers,
            layout,
            queue: RetrievalQueue::new(),
            scan_flight: SingleFlight::new(),
            drain_flight: SingleFlight::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn queue(&self) -> &RetrievalQueue {
        &self.queue
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    /// Whether a need scan is running.
    pub fn is_scanning(&self) -> bool {
        self.scan_flight.is_running()
    }

    /// Whether a queue drain is running.
    pub fn is_draining(&self) -> bool {
        self.drain_flight.is_running()
    }
}
