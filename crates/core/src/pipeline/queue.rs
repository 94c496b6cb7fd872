//! The retrieval queue: pending entries plus the entry being drained.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::{EpisodeCode, EpisodeId, Series};
use crate::searcher::SearchResult;

/// One episode of a queue entry with its ranked candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEpisode {
    pub episode_id: EpisodeId,
    pub code: EpisodeCode,
    /// Best candidate first.
    pub results: Vec<SearchResult>,
}

/// A batch of episodes of one series found by one search.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub series: Series,
    pub episodes: Vec<QueuedEpisode>,
}

impl QueueEntry {
    pub fn contains(&self, episode_id: EpisodeId) -> bool {
        self.episodes.iter().any(|ep| ep.episode_id == episode_id)
    }

    /// Episodes oldest first.
    pub fn episodes_in_order(&self) -> Vec<QueuedEpisode> {
        let mut episodes = self.episodes.clone();
        episodes.sort_by_key(|ep| ep.code);
        episodes
    }
}

#[derive(Debug, Default)]
enum DrainSlot {
    #[default]
    Idle,
    Draining(QueueEntry),
}

#[derive(Debug, Default)]
struct QueueState {
    current: DrainSlot,
    pending: VecDeque<QueueEntry>,
}

/// FIFO of queue entries. The lock is only held for the duration of each
/// call.
#[derive(Debug, Default)]
pub struct RetrievalQueue {
    state: Mutex<QueueState>,
}

impl RetrievalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry at the back.
    pub fn push(&self, entry: QueueEntry) {
        self.lock().pending.push_back(entry);
    }

    /// Whether the episode is pending or being drained.
    pub fn contains(&self, episode_id: EpisodeId) -> bool {
        let state = self.lock();
        let in_flight = match &state.current {
            DrainSlot::Draining(entry) => entry.contains(episode_id),
            DrainSlot::Idle => false,
        };
        in_flight || state.pending.iter().any(|e| e.contains(episode_id))
    }

    /// Pop the oldest pending entry and mark it in flight. When nothing is
    /// pending the in-flight slot is cleared and `None` returned.
    pub fn begin_next(&self) -> Option<QueueEntry> {
        let mut state = self.lock();
        match state.pending.pop_front() {
            Some(entry) => {
                state.current = DrainSlot::Draining(entry.clone());
                Some(entry)
            }
            None => {
                state.current = DrainSlot::Idle;
                None
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_draining(&self) -> bool {
        matches!(self.lock().current, DrainSlot::Draining(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn entry(series_id: &str, ids: &[(EpisodeId, u32)]) -> QueueEntry {
        QueueEntry {
            series: fixtures::series(series_id, series_id),
            episodes: ids
                .iter()
                .map(|(id, ep)| QueuedEpisode {
                    episode_id: *id,
                    code: EpisodeCode::new(1, *ep),
                    results: vec![fixtures::search_result("a.mkv", "file")],
                })
                .collect(),
        }
    }

    #[test]
    fn test_fifo_and_membership() {
        let queue = RetrievalQueue::new();
        queue.push(entry("a", &[(1, 1)]));
        queue.push(entry("b", &[(2, 1)]));

        assert!(queue.contains(1));
        assert!(queue.contains(2));
        assert!(!queue.contains(3));
        assert_eq!(queue.pending_len(), 2);

        let first = queue.begin_next().unwrap();
        assert_eq!(first.series.id, "a");
        assert!(queue.is_draining());
        assert!(queue.contains(1), "in-flight entry counts as queued");

        let second = queue.begin_next().unwrap();
        assert_eq!(second.series.id, "b");
        assert!(!queue.contains(1));

        assert!(queue.begin_next().is_none());
        assert!(!queue.is_draining());
        assert!(!queue.contains(2));
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_episodes_in_order() {
        let e = entry("a", &[(3, 3), (1, 1), (2, 2)]);
        let ids: Vec<EpisodeId> = e.episodes_in_order().iter().map(|q| q.episode_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
