//! Retriever for results that point at a local file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{self as tokio_io, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use super::{discard, Retriever, RetrieverError};
use crate::catalog::Episode;
use crate::searcher::{SearchResult, FILE_RESULT_TYPE};

/// Copies `{"path": ...}` results into the library. Always enabled.
#[derive(Debug, Default)]
pub struct FileRetriever;

impl FileRetriever {
    pub fn new() -> Self {
        Self
    }
}

fn source_path(result: &SearchResult) -> Result<PathBuf, RetrieverError> {
    result
        .handle
        .get("path")
        .and_then(|p| p.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| {
            RetrieverError::Internal(format!("result {} has no source path", result.filename))
        })
}

#[async_trait]
impl Retriever for FileRetriever {
    fn name(&self) -> &str {
        "file"
    }

    fn supports(&self, result_type: &str) -> bool {
        result_type == FILE_RESULT_TYPE
    }

    fn always_enabled(&self) -> bool {
        true
    }

    async fn retrieve(
        &self,
        _episode: &Episode,
        result: &SearchResult,
        target: &Path,
    ) -> Result<(), RetrieverError> {
        let source = source_path(result)?;

        let source_file = File::open(&source).await.map_err(|e| {
            RetrieverError::Soft(format!("cannot open {}: {}", source.display(), e))
        })?;
        let target_file = File::create(target).await.map_err(|e| {
            RetrieverError::Hard(format!("cannot create {}: {}", target.display(), e))
        })?;

        let mut reader = BufReader::new(source_file);
        let mut writer = BufWriter::new(target_file);
        let copied = match tokio_io::copy(&mut reader, &mut writer).await {
            Ok(copied) => copied,
            Err(e) => {
                drop(writer);
                discard(target).await;
                return Err(RetrieverError::Hard(format!(
                    "copy to {} failed: {}",
                    target.display(),
                    e
                )));
            }
        };
        if let Err(e) = writer.flush().await {
            drop(writer);
            discard(target).await;
            return Err(RetrieverError::Hard(format!(
                "flush of {} failed: {}",
                target.display(),
                e
            )));
        }

        if result.size_bytes > 0 && copied != result.size_bytes {
            drop(writer);
            discard(target).await;
            return Err(RetrieverError::AbortedSoft(format!(
                "copied {} bytes from {}, expected {}",
                copied,
                source.display(),
                result.size_bytes
            )));
        }

        debug!("copied {} ({} bytes)", source.display(), copied);
        Ok(())
    }
}
