//! Reading the daemon configuration.

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

use super::{types::Config, ConfigError};

/// Prefix of environment variables that override file settings.
const ENV_PREFIX: &str = "SHOWRUNNER_";

/// Read the config file at `path`, then apply `SHOWRUNNER_*` overrides.
///
/// Nested keys are separated by `__`, so `SHOWRUNNER_LIBRARY__DATA_DIR`
/// replaces `[library] data_dir`. Semantic checks are left to
/// [`validate_config`](super::validate_config).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse TOML text without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_custom_check_hours() {
        let config = load_config_from_str(
            r#"
[library]
data_dir = "/media/tv"

[scheduler]
check_hours = [6, 18]
"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.check_hours, vec![6, 18]);
        assert_eq!(config.scheduler.resync_interval_hours, 12);
    }

    #[test]
    fn test_library_section_is_required() {
        let err = load_config_from_str(
            r#"
[searchers]
enabled = ["local"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/showrunner.toml")).unwrap_err();
        match err {
            ConfigError::FileNotFound(path) => assert!(path.ends_with("showrunner.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_series_and_database_from_file() {
        let file = config_file(
            r#"
[library]
data_dir = "/srv/media"

[database]
path = "/var/lib/showrunner/catalog.db"

[[series]]
id = "thetvdb:73762"
quality = "hd"

[[series]]
id = "thetvdb:81189"
paused = true
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.library.data_dir.to_str().unwrap(), "/srv/media");
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/var/lib/showrunner/catalog.db"
        );
        let ids: Vec<&str> = config.series.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["thetvdb:73762", "thetvdb:81189"]);
        assert!(config.series[1].paused);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let file = config_file("[library\ndata_dir = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
