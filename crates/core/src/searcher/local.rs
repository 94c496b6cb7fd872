//! Searcher that finds episode files in local directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde_json::json;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{EpisodeResults, SearchError, SearchParams, SearchResult, Searcher};
use crate::catalog::{Episode, EpisodeCode, EpisodeId, Quality, Series};
use crate::config::LocalSearcherConfig;

/// Result type tag of local files.
pub const FILE_RESULT_TYPE: &str = "file";

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "wmv", "mov"];
const HD_MARKERS: &[&str] = &["720p", "1080p", "2160p"];

/// Scans configured directories for files whose name starts with the series
/// name and carries an episode code.
pub struct LocalSearcher {
    roots: Vec<PathBuf>,
    max_depth: usize,
}

impl LocalSearcher {
    pub fn new(config: &LocalSearcherConfig) -> Self {
        Self {
            roots: config.paths.clone(),
            max_depth: config.max_depth,
        }
    }
}

#[async_trait]
impl Searcher for LocalSearcher {
    fn name(&self) -> &str {
        "local"
    }

    async fn search(
        &self,
        series: &Series,
        episodes: &[Episode],
        params: &SearchParams,
    ) -> Result<EpisodeResults, SearchError> {
        let wanted: HashMap<EpisodeCode, EpisodeId> =
            episodes.iter().map(|ep| (ep.code, ep.id)).collect();
        let roots = self.roots.clone();
        let max_depth = self.max_depth;
        let series_name = series.name.clone();
        let params = params.clone();

        tokio::task::spawn_blocking(move || {
            scan_roots(&roots, max_depth, &series_name, &wanted, &params)
        })
        .await
        .map_err(|e| SearchError::Internal(format!("local scan task failed: {}", e)))?
    }
}

fn scan_roots(
    roots: &[PathBuf],
    max_depth: usize,
    series_name: &str,
    wanted: &HashMap<EpisodeCode, EpisodeId>,
    params: &SearchParams,
) -> Result<EpisodeResults, SearchError> {
    let series_key = format!(" {} ", normalize(series_name));
    let mut found: EpisodeResults = HashMap::new();
    let mut readable = 0;

    for root in roots {
        if !root.is_dir() {
            warn!("local search path {} is not a directory", root.display());
            continue;
        }
        readable += 1;

        for entry in WalkDir::new(root).max_depth(max_depth.saturating_add(1)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("error walking {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_video_file(entry.path()) {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };

            let Some((episode_id, result)) =
                match_file(entry.path(), file_name, &series_key, wanted, params)
            else {
                continue;
            };
            debug!(path = %entry.path().display(), episode_id, "local match");
            found.entry(episode_id).or_default().push(result);
        }
    }

    if readable == 0 && !roots.is_empty() {
        return Err(SearchError::Io(
            "none of the local search paths are readable".to_string(),
        ));
    }

    for results in found.values_mut() {
        results.sort_by_key(|r| r.size_bytes.abs_diff(params.ideal_size));
    }
    Ok(found)
}

fn match_file(
    path: &Path,
    file_name: &str,
    series_key: &str,
    wanted: &HashMap<EpisodeCode, EpisodeId>,
    params: &SearchParams,
) -> Option<(EpisodeId, SearchResult)> {
    let normalized = format!(" {} ", normalize(file_name));
    if !normalized.starts_with(series_key) {
        return None;
    }
    let code = parse_episode_code(file_name)?;
    let episode_id = *wanted.get(&code)?;

    let is_hd = HD_MARKERS
        .iter()
        .any(|marker| normalized.contains(&format!(" {} ", marker)));
    match params.quality {
        Quality::Hd if !is_hd => return None,
        Quality::Sd if is_hd => return None,
        _ => {}
    }

    let metadata = path.metadata().ok()?;
    if metadata.len() < params.min_size {
        return None;
    }
    if let (Some(floor), Ok(modified)) = (params.date_floor, metadata.modified()) {
        if DateTime::<Utc>::from(modified).date_naive() < floor {
            return None;
        }
    }

    Some((
        episode_id,
        SearchResult {
            filename: file_name.to_string(),
            size_bytes: metadata.len(),
            result_type: FILE_RESULT_TYPE.to_string(),
            handle: json!({ "path": path.to_string_lossy() }),
            searcher: "local".to_string(),
        },
    ))
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lowercase, drop apostrophes, and turn every other non-alphanumeric run
/// into a single space.
fn normalize(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract an episode code such as `S01E02`, `s01.e02` or `1x02`.
pub fn parse_episode_code(name: &str) -> Option<EpisodeCode> {
    let lower = name.to_lowercase();
    let patterns = [
        r"\bs(\d{1,2})[ ._-]?e(\d{1,3})\b",
        r"\b(\d{1,2})x(\d{2,3})\b",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(&lower) {
            let season = caps.get(1)?.as_str().parse().ok()?;
            let episode = caps.get(2)?.as_str().parse().ok()?;
            return Some(EpisodeCode::new(season, episode));
        }
    }
    None
}
