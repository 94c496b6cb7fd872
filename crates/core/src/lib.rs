pub mod catalog;
pub mod config;
pub mod notifier;
pub mod pipeline;
pub mod retriever;
pub mod scheduler;
pub mod searcher;
pub mod testing;

pub use catalog::{
    Catalog, CatalogError, ConfigSeriesSync, Episode, EpisodeCode, EpisodeId, EpisodeStatus,
    MetadataSync, Quality, Series, SqliteCatalog,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use notifier::{Notifier, NotifierError, NotifierSet, RetrievedEpisode};
pub use pipeline::{AcquisitionPipeline, LibraryLayout, PipelineError, ScanOutcome, ScanReport};
pub use retriever::{Retriever, RetrieverDispatcher, RetrieverError};
pub use scheduler::{CatalogResyncJob, EpisodeCheckJob, SchedulerService};
pub use searcher::{SearchResult, Searcher, SearcherSet};
