//! SQLite-backed catalog implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    Catalog, CatalogError, Episode, EpisodeCode, EpisodeId, EpisodeStatus, NewEpisode, Series,
    SeriesPreferences,
};
use crate::searcher::SearchResult;

const LAST_SYNC_KEY: &str = "last_synced_at";

const SERIES_COLUMNS: &str = "id, name, path, quality, paused, runtime_minutes, added_at";
const EPISODE_COLUMNS: &str =
    "id, series_id, season, episode, name, overview, aired_at, filename, search_result, status";

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

/// Raw episode row, converted outside the rusqlite row closure so that
/// parse failures surface as catalog errors.
struct EpisodeRow {
    id: EpisodeId,
    series_id: String,
    season: u32,
    episode: u32,
    name: String,
    overview: Option<String>,
    aired_at: Option<String>,
    filename: Option<String>,
    search_result: Option<String>,
    status: String,
}

impl EpisodeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            series_id: row.get(1)?,
            season: row.get(2)?,
            episode: row.get(3)?,
            name: row.get(4)?,
            overview: row.get(5)?,
            aired_at: row.get(6)?,
            filename: row.get(7)?,
            search_result: row.get(8)?,
            status: row.get(9)?,
        })
    }

    fn into_episode(self) -> Result<Episode, CatalogError> {
        let search_result = match self.search_result {
            Some(json) => Some(
                serde_json::from_str::<SearchResult>(&json)
                    .map_err(|e| CatalogError::InvalidData(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Episode {
            id: self.id,
            series_id: self.series_id,
            code: EpisodeCode::new(self.season, self.episode),
            name: self.name,
            overview: self.overview,
            aired_at: self.aired_at.as_deref().map(parse_timestamp).transpose()?,
            filename: self.filename,
            search_result,
            status: self.status.parse()?,
        })
    }
}

struct SeriesRow {
    id: String,
    name: String,
    path: String,
    quality: String,
    paused: bool,
    runtime_minutes: Option<u32>,
    added_at: String,
}

impl SeriesRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            path: row.get(2)?,
            quality: row.get(3)?,
            paused: row.get(4)?,
            runtime_minutes: row.get(5)?,
            added_at: row.get(6)?,
        })
    }

    fn into_series(self) -> Result<Series, CatalogError> {
        Ok(Series {
            id: self.id,
            name: self.name,
            path: self.path,
            quality: self.quality.parse()?,
            paused: self.paused,
            runtime_minutes: self.runtime_minutes,
            added_at: parse_timestamp(&self.added_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CatalogError::InvalidData(format!("bad timestamp {:?}: {}", s, e)))
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS series (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL,
                quality TEXT NOT NULL DEFAULT 'any',
                paused INTEGER NOT NULL DEFAULT 0,
                runtime_minutes INTEGER,
                added_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                series_id TEXT NOT NULL REFERENCES series(id) ON DELETE CASCADE,
                season INTEGER NOT NULL,
                episode INTEGER NOT NULL,
                name TEXT NOT NULL,
                overview TEXT,
                aired_at TEXT,
                filename TEXT,
                search_result TEXT,
                status TEXT NOT NULL DEFAULT 'none',
                UNIQUE(series_id, season, episode)
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_series ON episodes(series_id);

            CREATE TABLE IF NOT EXISTS catalog_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Database("catalog connection lock poisoned".to_string()))
    }

    fn load_episodes(
        conn: &Connection,
        sql: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Vec<Episode>, CatalogError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(&[param], EpisodeRow::from_row)?;

        let mut episodes = Vec::new();
        for row in rows {
            episodes.push(row?.into_episode()?);
        }
        Ok(episodes)
    }
}

impl Catalog for SqliteCatalog {
    fn list_series(&self) -> Result<Vec<Series>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM series ORDER BY name COLLATE NOCASE",
            SERIES_COLUMNS
        ))?;
        let rows = stmt.query_map([], SeriesRow::from_row)?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row?.into_series()?);
        }
        Ok(series)
    }

    fn get_series(&self, id: &str) -> Result<Option<Series>, CatalogError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM series WHERE id = ?", SERIES_COLUMNS),
                params![id],
                SeriesRow::from_row,
            )
            .optional()?;
        row.map(SeriesRow::into_series).transpose()
    }

    fn episodes_of(&self, series_id: &str) -> Result<Vec<Episode>, CatalogError> {
        let conn = self.lock()?;
        Self::load_episodes(
            &conn,
            &format!(
                "SELECT {} FROM episodes WHERE series_id = ? ORDER BY season, episode",
                EPISODE_COLUMNS
            ),
            &series_id,
        )
    }

    fn get_episode(&self, id: EpisodeId) -> Result<Option<Episode>, CatalogError> {
        let conn = self.lock()?;
        let episodes = Self::load_episodes(
            &conn,
            &format!("SELECT {} FROM episodes WHERE id = ?", EPISODE_COLUMNS),
            &id,
        )?;
        Ok(episodes.into_iter().next())
    }

    fn update_episode(&self, episode: &Episode) -> Result<(), CatalogError> {
        let search_result = episode
            .search_result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CatalogError::InvalidData(e.to_string()))?;

        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE episodes SET status = ?, filename = ?, search_result = ? WHERE id = ?",
            params![
                episode.status.as_str(),
                episode.filename,
                search_result,
                episode.id
            ],
        )?;

        if updated == 0 {
            return Err(CatalogError::EpisodeNotFound(episode.id));
        }
        Ok(())
    }

    fn add_series(
        &self,
        series: &Series,
        episodes: &[NewEpisode],
    ) -> Result<Vec<Episode>, CatalogError> {
        {
            let mut conn = self.lock()?;
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM series WHERE id = ?)",
                    params![series.id],
                    |row| row.get(0),
                )?;

            if !exists {
                let tx = conn.transaction()?;
                tx.execute(
                    &format!(
                        "INSERT INTO series ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                        SERIES_COLUMNS
                    ),
                    params![
                        series.id,
                        series.name,
                        series.path,
                        series.quality.as_str(),
                        series.paused,
                        series.runtime_minutes,
                        series.added_at.to_rfc3339(),
                    ],
                )?;

                for ep in episodes {
                    // Backlog that aired before tracking started is never fetched.
                    let status = match ep.aired_at {
                        Some(at) if at < series.added_at => EpisodeStatus::Ignore,
                        _ => EpisodeStatus::None,
                    };
                    tx.execute(
                        "INSERT INTO episodes (series_id, season, episode, name, overview, aired_at, status)
                         VALUES (?, ?, ?, ?, ?, ?, ?)",
                        params![
                            series.id,
                            ep.code.season,
                            ep.code.episode,
                            ep.name,
                            ep.overview,
                            ep.aired_at.map(|at| at.to_rfc3339()),
                            status.as_str(),
                        ],
                    )?;
                }
                tx.commit()?;
            }
        }

        self.episodes_of(&series.id)
    }

    fn update_series_preferences(
        &self,
        id: &str,
        prefs: &SeriesPreferences,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE series SET path = COALESCE(?, path), quality = ?, paused = ? WHERE id = ?",
            params![prefs.path, prefs.quality.as_str(), prefs.paused, id],
        )?;

        if updated == 0 {
            return Err(CatalogError::SeriesNotFound(id.to_string()));
        }
        Ok(())
    }

    fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM catalog_meta WHERE key = ?",
                params![LAST_SYNC_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value.as_deref().map(parse_timestamp).transpose()
    }

    fn record_sync(&self, at: DateTime<Utc>) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO catalog_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SYNC_KEY, at.to_rfc3339()],
        )?;
        Ok(())
    }
}
