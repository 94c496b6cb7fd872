//! Retriever that downloads `{"url": ...}` results over HTTP.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::{discard, Retriever, RetrieverError};
use crate::catalog::Episode;
use crate::config::HttpRetrieverConfig;
use crate::searcher::SearchResult;

/// Result type tag handled by [`HttpRetriever`].
pub const HTTP_RESULT_TYPE: &str = "http";

/// Streams a URL straight into the target file.
pub struct HttpRetriever {
    client: Client,
}

impl HttpRetriever {
    pub fn new(config: &HttpRetrieverConfig) -> Result<Self, RetrieverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RetrieverError::Internal(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn name(&self) -> &str {
        "http"
    }

    fn supports(&self, result_type: &str) -> bool {
        result_type == HTTP_RESULT_TYPE
    }

    async fn retrieve(
        &self,
        _episode: &Episode,
        result: &SearchResult,
        target: &Path,
    ) -> Result<(), RetrieverError> {
        let url = result
            .handle
            .get("url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| {
                RetrieverError::Internal(format!("result {} has no url", result.filename))
            })?;

        let mut response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RetrieverError::Soft(format!("request to {} timed out", url))
            } else {
                RetrieverError::Soft(format!("request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrieverError::Soft(format!("{} returned {}", url, status)));
        }

        let file = File::create(target).await.map_err(|e| {
            RetrieverError::Hard(format!("cannot create {}: {}", target.display(), e))
        })?;
        let mut writer = BufWriter::new(file);

        let written = match stream_body(&mut response, &mut writer).await {
            Ok(written) => written,
            Err(e) => {
                drop(writer);
                discard(target).await;
                return Err(e);
            }
        };

        if result.size_bytes > 0 && written != result.size_bytes {
            drop(writer);
            discard(target).await;
            return Err(RetrieverError::AbortedSoft(format!(
                "downloaded {} bytes from {}, expected {}",
                written, url, result.size_bytes
            )));
        }

        debug!("downloaded {} ({} bytes)", url, written);
        Ok(())
    }
}

async fn stream_body(
    response: &mut reqwest::Response,
    writer: &mut BufWriter<File>,
) -> Result<u64, RetrieverError> {
    let mut written = 0u64;
    loop {
        let chunk = response
            .chunk()
            .await
            .map_err(|e| RetrieverError::Soft(format!("download interrupted: {}", e)))?;
        let Some(chunk) = chunk else {
            break;
        };
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| RetrieverError::Hard(format!("write failed: {}", e)))?;
        written += chunk.len() as u64;
    }
    writer
        .flush()
        .await
        .map_err(|e| RetrieverError::Hard(format!("flush failed: {}", e)))?;
    Ok(written)
}
