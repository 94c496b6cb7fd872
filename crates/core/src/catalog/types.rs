//! Types for the series/episode catalog.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::searcher::SearchResult;

/// Catalog row id of an episode.
pub type EpisodeId = i64;

/// Season/episode code. Ordered by season, then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeCode {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeCode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl fmt::Display for EpisodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{:02}e{:02}", self.season, self.episode)
    }
}

/// Quality preference of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[serde(alias = "HD")]
    Hd,
    #[serde(alias = "SD")]
    Sd,
    #[default]
    #[serde(alias = "Any", alias = "ANY")]
    Any,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd => "hd",
            Quality::Sd => "sd",
            Quality::Any => "any",
        }
    }
}

impl FromStr for Quality {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hd" => Ok(Quality::Hd),
            "sd" => Ok(Quality::Sd),
            "any" => Ok(Quality::Any),
            other => Err(CatalogError::InvalidData(format!("unknown quality: {}", other))),
        }
    }
}

/// Acquisition status of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    /// Not yet acquired, nothing decided.
    #[default]
    None,
    /// Explicitly wanted.
    Need,
    /// Retrieved; the file exists on disk.
    Have,
    /// Never acquire (e.g. aired before the series was tracked).
    Ignore,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::None => "none",
            EpisodeStatus::Need => "need",
            EpisodeStatus::Have => "have",
            EpisodeStatus::Ignore => "ignore",
        }
    }
}

impl FromStr for EpisodeStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(EpisodeStatus::None),
            "need" => Ok(EpisodeStatus::Need),
            "have" => Ok(EpisodeStatus::Have),
            "ignore" => Ok(EpisodeStatus::Ignore),
            other => Err(CatalogError::InvalidData(format!(
                "unknown episode status: {}",
                other
            ))),
        }
    }
}

/// A tracked series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Provider id, e.g. "thetvdb:73762".
    pub id: String,
    /// Display name.
    pub name: String,
    /// Directory relative to the library root.
    pub path: String,
    pub quality: Quality,
    pub paused: bool,
    /// Nominal runtime of an episode in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// When the series was added to the catalog (tracking start).
    pub added_at: DateTime<Utc>,
}

/// An episode of a tracked series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub series_id: String,
    pub code: EpisodeCode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// When the episode airs (or aired).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aired_at: Option<DateTime<Utc>>,
    /// File name inside the season directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Search result chosen for the current (or last) retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_result: Option<SearchResult>,
    pub status: EpisodeStatus,
}

impl Episode {
    /// Air date, if known.
    pub fn airdate(&self) -> Option<NaiveDate> {
        self.aired_at.map(|at| at.date_naive())
    }

    /// Whether the episode has aired as of `now`. Episodes without an air
    /// date never count as aired.
    pub fn has_aired(&self, now: DateTime<Utc>) -> bool {
        self.aired_at.is_some_and(|at| at <= now)
    }

    /// Whether the episode should be acquired as of `now`, ignoring the
    /// series' paused flag.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, EpisodeStatus::None | EpisodeStatus::Need) && self.has_aired(now)
    }
}

/// Episode data supplied when a series is added to the catalog.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub code: EpisodeCode,
    pub name: String,
    pub overview: Option<String>,
    pub aired_at: Option<DateTime<Utc>>,
}

/// User preferences applied to a series already in the catalog.
#[derive(Debug, Clone, Default)]
pub struct SeriesPreferences {
    /// New path; `None` keeps the current one.
    pub path: Option<String>,
    pub quality: Quality,
    pub paused: bool,
}

/// Errors from catalog operations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Episode not found: {0}")]
    EpisodeNotFound(EpisodeId),

    #[error("Invalid catalog data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Database(e.to_string())
    }
}
