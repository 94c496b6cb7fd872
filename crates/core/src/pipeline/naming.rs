//! On-disk layout of the library.

use std::path::{Path, PathBuf};

use crate::catalog::{fix_separators, Episode, EpisodeCode, Series};
use crate::config::NamingConfig;
use crate::searcher::SearchResult;

/// Maps series and episodes to `<data_dir>/<series path>/<season dir>/<file>`.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    data_dir: PathBuf,
    naming: NamingConfig,
}

impl LibraryLayout {
    pub fn new(data_dir: impl Into<PathBuf>, naming: NamingConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            naming,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn season_dir(&self, series: &Series, code: EpisodeCode) -> PathBuf {
        let season = fix_separators(
            &self
                .naming
                .season_dir
                .replace("{season}", &code.season.to_string()),
        );
        self.data_dir.join(&series.path).join(season)
    }

    pub fn episode_path(&self, series: &Series, code: EpisodeCode, filename: &str) -> PathBuf {
        self.season_dir(series, code).join(filename)
    }

    /// File name for `episode` when retrieved from `result`.
    ///
    /// With renaming enabled this is the naming template plus the result's
    /// lower-cased extension; otherwise the result's own base name.
    pub fn target_filename(&self, series: &Series, episode: &Episode, result: &SearchResult) -> String {
        let source = Path::new(&result.filename);
        if !self.naming.rename {
            if let Some(name) = source.file_name().and_then(|n| n.to_str()) {
                return name.to_string();
            }
        }

        let stem = fix_separators(&self.render(series, episode));
        match source.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", stem, ext.to_lowercase()),
            None => stem,
        }
    }

    fn render(&self, series: &Series, episode: &Episode) -> String {
        self.naming
            .template
            .replace("{series}", &series.name)
            .replace("{code}", &episode.code.to_string())
            .replace("{title}", &episode.name)
            .replace("{season}", &episode.code.season.to_string())
            .replace("{episode}", &format!("{:02}", episode.code.episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn layout(rename: bool) -> LibraryLayout {
        LibraryLayout::new(
            "/media/tv",
            NamingConfig {
                rename,
                ..NamingConfig::default()
            },
        )
    }

    #[test]
    fn test_season_dir() {
        let mut series = fixtures::series("thetvdb:1", "Show");
        series.path = "Show (2005)".to_string();
        assert_eq!(
            layout(true).season_dir(&series, EpisodeCode::new(3, 1)),
            PathBuf::from("/media/tv/Show (2005)/Season 3")
        );
    }

    #[test]
    fn test_renamed_target_uses_template_and_lowercase_extension() {
        let series = fixtures::series("thetvdb:1", "Show");
        let mut ep = fixtures::aired_episode(1, &series.id, 1, 2, 1);
        ep.name = "Either/Or".to_string();
        let result = fixtures::search_result("Show.S01E02.720p.MKV", "file");

        assert_eq!(
            layout(true).target_filename(&series, &ep, &result),
            "Show - s01e02 - Either-Or.mkv"
        );
    }

    #[test]
    fn test_target_without_rename_keeps_base_name() {
        let series = fixtures::series("thetvdb:1", "Show");
        let ep = fixtures::aired_episode(1, &series.id, 1, 2, 1);
        let result = fixtures::search_result("releases/Show.S01E02.mkv", "file");

        assert_eq!(
            layout(false).target_filename(&series, &ep, &result),
            "Show.S01E02.mkv"
        );
    }

    #[test]
    fn test_renamed_target_without_extension() {
        let series = fixtures::series("thetvdb:1", "Show");
        let ep = fixtures::aired_episode(1, &series.id, 1, 2, 1);
        let result = fixtures::search_result("noext", "file");

        assert_eq!(
            layout(true).target_filename(&series, &ep, &result),
            format!("Show - s01e02 - {}", ep.name)
        );
    }
}
