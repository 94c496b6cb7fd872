//! Episode search abstraction.
//!
//! This module provides a `Searcher` trait for finding downloadable
//! candidates for episodes, and a `SearcherSet` that queries the enabled
//! searchers in configured order.

mod local;
mod set;
mod types;

pub use local::{parse_episode_code, LocalSearcher, FILE_RESULT_TYPE};
pub use set::SearcherSet;
pub use types::*;
