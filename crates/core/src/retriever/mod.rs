//! Retrieval backends.
//!
//! A `Retriever` turns a search result into a file on disk. The
//! `RetrieverDispatcher` tries the eligible retrievers for a result in
//! order and classifies their failures.

mod dispatcher;
mod file;
mod http;
mod types;

pub use dispatcher::RetrieverDispatcher;
pub use file::FileRetriever;
pub use http::{HttpRetriever, HTTP_RESULT_TYPE};
pub use types::*;

use std::path::Path;

use tracing::debug;

/// Best-effort removal of a partial target.
pub(crate) async fn discard(target: &Path) {
    if let Err(e) = tokio::fs::remove_file(target).await {
        debug!("could not remove partial file {}: {}", target.display(), e);
    }
}
