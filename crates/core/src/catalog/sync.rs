//! Reconciles the `[[series]]` configuration with the catalog.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::{Catalog, CatalogError, MetadataSync, SeriesPreferences};
use crate::config::SeriesConfig;

/// Applies configured series preferences to the catalog.
///
/// Series present in the catalog but missing from the configuration are
/// paused, so the acquisition pipeline leaves them alone.
pub struct ConfigSeriesSync {
    catalog: Arc<dyn Catalog>,
    series: Vec<SeriesConfig>,
}

impl ConfigSeriesSync {
    pub fn new(catalog: Arc<dyn Catalog>, series: Vec<SeriesConfig>) -> Self {
        Self { catalog, series }
    }

    /// Configured series ids that have no catalog record yet.
    ///
    /// The sync never creates series; their episode lists have to be put in
    /// the catalog database by whatever maintains it.
    pub fn missing_series(&self) -> Result<Vec<String>, CatalogError> {
        let mut missing = Vec::new();
        for cfg in &self.series {
            if self.catalog.get_series(&cfg.id)?.is_none() {
                missing.push(cfg.id.clone());
            }
        }
        Ok(missing)
    }
}

/// Replace path separators so a display name is usable as a directory name.
pub(crate) fn fix_separators(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

#[async_trait]
impl MetadataSync for ConfigSeriesSync {
    fn name(&self) -> &str {
        "config"
    }

    async fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError> {
        self.catalog.last_synced_at()
    }

    async fn sync(&self) -> Result<usize, CatalogError> {
        let mut seen = HashSet::new();
        let mut touched = 0;

        for cfg in &self.series {
            seen.insert(cfg.id.as_str());

            let Some(series) = self.catalog.get_series(&cfg.id)? else {
                warn!(
                    "series {} is configured but not in the catalog yet; skipping",
                    cfg.id
                );
                continue;
            };

            let path = match &cfg.path {
                Some(path) if !path.is_empty() => path.clone(),
                _ => fix_separators(&series.name),
            };

            let prefs = SeriesPreferences {
                path: Some(path),
                quality: cfg.quality,
                paused: cfg.paused,
            };
            self.catalog.update_series_preferences(&series.id, &prefs)?;
            debug!(series = %series.name, quality = cfg.quality.as_str(), paused = cfg.paused, "applied series preferences");
            touched += 1;
        }

        for series in self.catalog.list_series()? {
            if seen.contains(series.id.as_str()) || series.paused {
                continue;
            }
            error!(
                "series {} ({}) in catalog but not config; pausing",
                series.id, series.name
            );
            self.catalog.update_series_preferences(
                &series.id,
                &SeriesPreferences {
                    path: None,
                    quality: series.quality,
                    paused: true,
                },
            )?;
            touched += 1;
        }

        self.catalog.record_sync(Utc::now())?;
        info!("catalog sync finished, {} series updated", touched);
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Quality, Series, SqliteCatalog};

    fn add(catalog: &SqliteCatalog, id: &str, name: &str) {
        catalog
            .add_series(
                &Series {
                    id: id.to_string(),
                    name: name.to_string(),
                    path: name.to_string(),
                    quality: Quality::Any,
                    paused: false,
                    runtime_minutes: None,
                    added_at: Utc::now(),
                },
                &[],
            )
            .unwrap();
    }

    fn cfg(id: &str, path: Option<&str>, quality: Quality, paused: bool) -> SeriesConfig {
        SeriesConfig {
            id: id.to_string(),
            path: path.map(str::to_string),
            quality,
            paused,
        }
    }

    #[test]
    fn test_fix_separators() {
        assert_eq!(fix_separators("Face/Off"), "Face-Off");
        assert_eq!(fix_separators("A\\B"), "A-B");
        assert_eq!(fix_separators("Plain"), "Plain");
    }

    #[tokio::test]
    async fn test_sync_applies_preferences_and_pauses_unknown() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        add(&catalog, "thetvdb:1", "Doctor Who/Torchwood");
        add(&catalog, "thetvdb:2", "Orphan");
        add(&catalog, "thetvdb:3", "Custom");

        let sync = ConfigSeriesSync::new(
            catalog.clone(),
            vec![
                cfg("thetvdb:1", None, Quality::Hd, false),
                cfg("thetvdb:3", Some("Anime/Custom"), Quality::Sd, true),
                cfg("thetvdb:404", None, Quality::Any, false),
            ],
        );

        assert!(sync.last_synced_at().await.unwrap().is_none());
        let touched = sync.sync().await.unwrap();
        assert_eq!(touched, 3);

        let first = catalog.get_series("thetvdb:1").unwrap().unwrap();
        assert_eq!(first.path, "Doctor Who-Torchwood");
        assert_eq!(first.quality, Quality::Hd);
        assert!(!first.paused);

        let orphan = catalog.get_series("thetvdb:2").unwrap().unwrap();
        assert!(orphan.paused);

        let custom = catalog.get_series("thetvdb:3").unwrap().unwrap();
        assert_eq!(custom.path, "Anime/Custom");
        assert!(custom.paused);

        assert!(sync.last_synced_at().await.unwrap().is_some());
    }

    #[test]
    fn test_missing_series_lists_unseeded_ids() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        add(&catalog, "thetvdb:1", "Seeded");

        let sync = ConfigSeriesSync::new(
            catalog.clone(),
            vec![
                cfg("thetvdb:1", None, Quality::Any, false),
                cfg("thetvdb:404", None, Quality::Any, false),
            ],
        );
        assert_eq!(sync.missing_series().unwrap(), vec!["thetvdb:404"]);

        add(&catalog, "thetvdb:404", "Late");
        assert!(sync.missing_series().unwrap().is_empty());
    }
}
