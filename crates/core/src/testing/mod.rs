//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the plugin traits so the
//! acquisition pipeline can be exercised end to end without real search
//! providers, transfers or notification services.
//!
//! # Example
//!
//! ```rust,ignore
//! use showrunner_core::testing::{MockRetriever, MockSearcher, fixtures};
//!
//! let searcher = MockSearcher::named("mock");
//! let retriever = MockRetriever::new("mock", &["file"]);
//!
//! searcher.set_results(episode.id, vec![fixtures::search_result("a.mkv", "file")]).await;
//! retriever.push_outcome(Err(RetrieverError::Soft("busy".into()))).await;
//! ```

pub mod http_stub;
mod mock_notifier;
mod mock_retriever;
mod mock_searcher;
mod mock_sync;

pub use mock_notifier::MockNotifier;
pub use mock_retriever::{MockRetriever, RecordedRetrieval};
pub use mock_searcher::{MockSearcher, RecordedSearch};
pub use mock_sync::MockSync;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use crate::catalog::{
        Episode, EpisodeCode, EpisodeId, EpisodeStatus, NewEpisode, Quality, Series,
    };
    use crate::searcher::SearchResult;

    /// A series tracked for a year, stored under its own name.
    pub fn series(id: &str, name: &str) -> Series {
        Series {
            id: id.to_string(),
            name: name.to_string(),
            path: name.to_string(),
            quality: Quality::Any,
            paused: false,
            runtime_minutes: None,
            added_at: Utc::now() - Duration::days(365),
        }
    }

    /// An episode that aired `days_ago` days ago and has not been retrieved.
    pub fn aired_episode(
        id: EpisodeId,
        series_id: &str,
        season: u32,
        episode: u32,
        days_ago: i64,
    ) -> Episode {
        Episode {
            id,
            series_id: series_id.to_string(),
            code: EpisodeCode::new(season, episode),
            name: format!("Episode {}", episode),
            overview: None,
            aired_at: Some(Utc::now() - Duration::days(days_ago)),
            filename: None,
            search_result: None,
            status: EpisodeStatus::None,
        }
    }

    /// Episode data for [`Catalog::add_series`](crate::catalog::Catalog::add_series).
    pub fn new_episode(season: u32, episode: u32, aired_at: Option<DateTime<Utc>>) -> NewEpisode {
        NewEpisode {
            code: EpisodeCode::new(season, episode),
            name: format!("Episode {}", episode),
            overview: Some(format!("Overview of episode {}.", episode)),
            aired_at,
        }
    }

    /// A 1 KiB search result.
    pub fn search_result(filename: &str, result_type: &str) -> SearchResult {
        SearchResult {
            filename: filename.to_string(),
            size_bytes: 1024,
            result_type: result_type.to_string(),
            handle: json!({ "path": filename }),
            searcher: "mock".to_string(),
        }
    }
}
