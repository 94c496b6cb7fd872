//! Series and episode catalog.
//!
//! The catalog owns series and episode records. The acquisition pipeline
//! only reads episode attributes and writes back status, filename and the
//! chosen search result.

mod sqlite;
mod sync;
mod types;

pub use sqlite::SqliteCatalog;
pub use sync::ConfigSeriesSync;
pub(crate) use sync::fix_separators;
pub use types::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for catalog storage.
pub trait Catalog: Send + Sync {
    /// All series, ordered by name.
    fn list_series(&self) -> Result<Vec<Series>, CatalogError>;

    /// Get a series by provider id.
    fn get_series(&self, id: &str) -> Result<Option<Series>, CatalogError>;

    /// Episodes of a series, ordered by code.
    fn episodes_of(&self, series_id: &str) -> Result<Vec<Episode>, CatalogError>;

    /// Get a single episode.
    fn get_episode(&self, id: EpisodeId) -> Result<Option<Episode>, CatalogError>;

    /// Persist the mutable fields of an episode (status, filename, search result).
    fn update_episode(&self, episode: &Episode) -> Result<(), CatalogError>;

    /// Add a series with its episodes, or return the existing episodes if the
    /// series is already present.
    ///
    /// Episodes that aired before `series.added_at` are stored as
    /// [`EpisodeStatus::Ignore`]; episodes without an air date are not.
    fn add_series(&self, series: &Series, episodes: &[NewEpisode])
        -> Result<Vec<Episode>, CatalogError>;

    /// Apply user preferences to an existing series.
    fn update_series_preferences(
        &self,
        id: &str,
        prefs: &SeriesPreferences,
    ) -> Result<(), CatalogError>;

    /// When the catalog was last synced.
    fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError>;

    /// Record a completed sync.
    fn record_sync(&self, at: DateTime<Utc>) -> Result<(), CatalogError>;
}

/// Something that refreshes the catalog from an outside source.
#[async_trait]
pub trait MetadataSync: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str;

    /// When the last sync completed, if ever.
    async fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError>;

    /// Run a sync. Returns the number of series touched.
    async fn sync(&self) -> Result<usize, CatalogError>;
}
