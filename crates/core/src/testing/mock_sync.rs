//! Mock metadata sync for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, MetadataSync};

/// Mock implementation of the MetadataSync trait.
///
/// A successful `sync` records the current time as the last sync.
#[derive(Debug, Default)]
pub struct MockSync {
    last_synced: Arc<RwLock<Option<DateTime<Utc>>>>,
    syncs: Arc<RwLock<usize>>,
    fail: Arc<RwLock<bool>>,
}

impl MockSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_last_synced(&self, at: Option<DateTime<Utc>>) {
        *self.last_synced.write().await = at;
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Number of sync runs (including failed ones).
    pub async fn sync_count(&self) -> usize {
        *self.syncs.read().await
    }
}

#[async_trait]
impl MetadataSync for MockSync {
    fn name(&self) -> &str {
        "mock"
    }

    async fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError> {
        Ok(*self.last_synced.read().await)
    }

    async fn sync(&self) -> Result<usize, CatalogError> {
        *self.syncs.write().await += 1;
        if *self.fail.read().await {
            return Err(CatalogError::Database("mock sync failed".to_string()));
        }
        *self.last_synced.write().await = Some(Utc::now());
        Ok(0)
    }
}
