use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::Quality;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub searchers: SearchersConfig,
    #[serde(default)]
    pub retrievers: RetrieversConfig,
    #[serde(default)]
    pub notifiers: NotifiersConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Series tracked by the daemon.
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

/// Library (download destination) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root directory; each series lives in `<data_dir>/<series path>`.
    pub data_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("showrunner.db")
}

/// File naming preferences.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConfig {
    /// Rename retrieved files using `template` (otherwise keep the result's filename).
    #[serde(default = "default_true")]
    pub rename: bool,
    /// Placeholders: `{series}`, `{code}`, `{title}`, `{season}`, `{episode}`.
    #[serde(default = "default_template")]
    pub template: String,
    /// Season directory name. Placeholder: `{season}`.
    #[serde(default = "default_season_dir")]
    pub season_dir: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            rename: true,
            template: default_template(),
            season_dir: default_season_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_template() -> String {
    "{series} - {code} - {title}".to_string()
}

fn default_season_dir() -> String {
    "Season {season}".to_string()
}

/// Search provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchersConfig {
    /// Enabled searchers, queried in this order.
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Local directory searcher (required when "local" is enabled)
    #[serde(default)]
    pub local: Option<LocalSearcherConfig>,
}

/// Local directory searcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSearcherConfig {
    /// Directories scanned for episode files.
    pub paths: Vec<PathBuf>,
    /// Maximum directory depth below each path (default: 4)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    4
}

/// Retriever backend configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrieversConfig {
    /// Enabled retrievers, tried in this order. Always-enabled retrievers
    /// are appended after these.
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub http: HttpRetrieverConfig,
}

/// HTTP retriever configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpRetrieverConfig {
    /// Request timeout in seconds (default: 3600)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpRetrieverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_http_timeout() -> u64 {
    3600
}

/// Notification configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifiersConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Telegram Bot API notifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Generic JSON webhook notifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    30
}

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Hours of the day (local time) at which new episodes are checked.
    /// The minute is randomized once at startup.
    #[serde(default = "default_check_hours")]
    pub check_hours: Vec<u32>,
    /// Minimum age of the last catalog sync before a resync runs.
    #[serde(default = "default_resync_interval")]
    pub resync_interval_hours: u64,
    /// How often the resync condition is evaluated.
    #[serde(default = "default_resync_poll")]
    pub resync_poll_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_hours: default_check_hours(),
            resync_interval_hours: default_resync_interval(),
            resync_poll_minutes: default_resync_poll(),
        }
    }
}

fn default_check_hours() -> Vec<u32> {
    vec![4, 11, 16, 21]
}

fn default_resync_interval() -> u64 {
    12
}

fn default_resync_poll() -> u64 {
    60
}

/// A tracked series and its preferences.
///
/// Only preferences live here. The series and its episodes must already be
/// in the catalog database; ids without a catalog record are reported at
/// startup and otherwise ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeriesConfig {
    /// Provider id, e.g. "thetvdb:73762".
    pub id: String,
    /// Directory relative to the library root (default: series name).
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[library]
data_dir = "/media/tv"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.library.data_dir.to_str().unwrap(), "/media/tv");
        assert_eq!(config.database.path.to_str().unwrap(), "showrunner.db");
        assert!(config.naming.rename);
        assert_eq!(config.naming.template, "{series} - {code} - {title}");
        assert_eq!(config.scheduler.check_hours, vec![4, 11, 16, 21]);
        assert_eq!(config.scheduler.resync_interval_hours, 12);
        assert!(config.searchers.enabled.is_empty());
        assert!(config.series.is_empty());
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[database]
path = "x.db"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_plugins_and_series() {
        let toml = r#"
[library]
data_dir = "/media/tv"

[searchers]
enabled = ["local"]

[searchers.local]
paths = ["/downloads/complete"]

[retrievers]
enabled = ["http", "file"]

[retrievers.http]
timeout_secs = 60

[notifiers]
enabled = ["webhook"]

[notifiers.webhook]
url = "http://localhost:9000/hook"

[[series]]
id = "thetvdb:73762"
quality = "hd"

[[series]]
id = "thetvdb:75897"
path = "South Park"
paused = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.searchers.enabled, vec!["local"]);
        let local = config.searchers.local.as_ref().unwrap();
        assert_eq!(local.paths.len(), 1);
        assert_eq!(local.max_depth, 4);
        assert_eq!(config.retrievers.enabled, vec!["http", "file"]);
        assert_eq!(config.retrievers.http.timeout_secs, 60);

        let webhook = config.notifiers.webhook.as_ref().unwrap();
        assert_eq!(webhook.timeout_secs, 30);

        assert_eq!(config.series.len(), 2);
        assert_eq!(config.series[0].quality, Quality::Hd);
        assert!(config.series[0].path.is_none());
        assert_eq!(config.series[1].quality, Quality::Any);
        assert!(config.series[1].paused);
    }

    #[test]
    fn test_telegram_default_api_url() {
        let toml = r#"
bot_token = "123:abc"
chat_id = "42"
"#;
        let telegram: TelegramConfig = toml::from_str(toml).unwrap();
        assert_eq!(telegram.api_url, "https://api.telegram.org");
    }
}
