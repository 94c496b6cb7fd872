//! Notifier trait and batch summary formatting.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write;
use thiserror::Error;

use crate::catalog::{Episode, Series};

/// An episode retrieved during one drain of the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedEpisode {
    pub series: Series,
    pub episode: Episode,
}

/// Errors that can occur while sending a notification.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),
}

/// Something that tells the user about retrieved episodes.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Report one batch of retrieved episodes.
    async fn notify(&self, episodes: &[RetrievedEpisode]) -> Result<(), NotifierError>;
}

/// Plain-text rendering of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub subject: String,
    pub text: String,
}

/// Build the numbered summary and the overview section for a batch.
pub fn format_summary(episodes: &[RetrievedEpisode]) -> Summary {
    let mut summary = String::from("Summary of Episodes\n");
    let mut overview = String::from("\nOverview of Episodes\n");

    for (i, item) in episodes.iter().enumerate() {
        let n = i + 1;
        let ep = &item.episode;
        let _ = writeln!(
            summary,
            "{:02}: {} {} {}",
            n, item.series.name, ep.code, ep.name
        );
        let aired = ep
            .aired_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let _ = write!(
            overview,
            "{:02}: {} {} {} ({})\n{}\n\n",
            n,
            item.series.name,
            ep.code,
            ep.name,
            aired,
            ep.overview.as_deref().unwrap_or("")
        );
    }

    let plural = if episodes.len() == 1 { "" } else { "s" };
    Summary {
        subject: format!("[showrunner] downloaded {} episode{}", episodes.len(), plural),
        text: format!("{}\n{}", summary, overview),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_format_summary() {
        let series = fixtures::series("thetvdb:1", "Show");
        let mut first = fixtures::aired_episode(1, &series.id, 1, 2, 1);
        first.name = "Second".to_string();
        first.overview = Some("Things happen.".to_string());
        let second = fixtures::aired_episode(2, &series.id, 1, 3, 1);

        let summary = format_summary(&[
            RetrievedEpisode {
                series: series.clone(),
                episode: first,
            },
            RetrievedEpisode {
                series,
                episode: second,
            },
        ]);

        assert_eq!(summary.subject, "[showrunner] downloaded 2 episodes");
        assert!(summary.text.starts_with("Summary of Episodes\n01: Show s01e02 Second\n"));
        assert!(summary.text.contains("02: Show s01e03 "));
        assert!(summary.text.contains("Overview of Episodes"));
        assert!(summary.text.contains("Things happen."));
    }

    #[test]
    fn test_singular_subject() {
        let series = fixtures::series("thetvdb:1", "Show");
        let ep = fixtures::aired_episode(1, &series.id, 1, 1, 1);
        let summary = format_summary(&[RetrievedEpisode {
            series,
            episode: ep,
        }]);
        assert_eq!(summary.subject, "[showrunner] downloaded 1 episode");
    }
}
