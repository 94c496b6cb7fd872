//! Types for the episode search system.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::catalog::{Episode, EpisodeId, Quality, Series};

/// A downloadable candidate for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// File name as published by the source.
    pub filename: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Type tag matched against retriever capabilities (e.g. "file", "http").
    pub result_type: String,
    /// Provider-specific data the matching retriever needs (path, URL, ...).
    pub handle: serde_json::Value,
    /// Name of the searcher that produced this result.
    pub searcher: String,
}

/// Parameters computed per series for a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Ignore releases published before this date.
    pub date_floor: Option<NaiveDate>,
    /// Size (bytes) that ranks best.
    pub ideal_size: u64,
    /// Smallest acceptable size (bytes).
    pub min_size: u64,
    pub quality: Quality,
}

/// Ranked results per episode, best match first.
pub type EpisodeResults = HashMap<EpisodeId, Vec<SearchResult>>;

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search I/O error: {0}")]
    Io(String),

    #[error("All searchers failed")]
    AllSearchersFailed(HashMap<String, String>),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for episode search providers.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging and the `searcher` field of results.
    fn name(&self) -> &str;

    /// Search for the given episodes of a series.
    ///
    /// Episodes without candidates may be absent from the returned map.
    async fn search(
        &self,
        series: &Series,
        episodes: &[Episode],
        params: &SearchParams,
    ) -> Result<EpisodeResults, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_result_serialization() {
        let result = SearchResult {
            filename: "Show.S01E01.720p.mkv".to_string(),
            size_bytes: 1024,
            result_type: "http".to_string(),
            handle: json!({"url": "http://example.com/a.mkv"}),
            searcher: "mock".to_string(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: SearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
        assert_eq!(parsed.handle["url"], "http://example.com/a.mkv");
    }

    #[test]
    fn test_error_display() {
        let err = SearchError::ConnectionFailed("refused".to_string());
        assert_eq!(err.to_string(), "Search backend connection failed: refused");
    }
}
