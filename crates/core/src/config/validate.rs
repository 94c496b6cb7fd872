use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Library root is set
/// - Scheduler hours and intervals are sane
/// - Enabled plugins that need a config section have one
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.library.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.data_dir cannot be empty".to_string(),
        ));
    }

    // Scheduler validation
    let scheduler = &config.scheduler;
    if scheduler.check_hours.is_empty() {
        return Err(ConfigError::ValidationError(
            "scheduler.check_hours cannot be empty".to_string(),
        ));
    }
    if let Some(hour) = scheduler.check_hours.iter().find(|h| **h > 23) {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.check_hours contains invalid hour {}",
            hour
        )));
    }
    if scheduler.resync_interval_hours == 0 || scheduler.resync_poll_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler intervals must be greater than 0".to_string(),
        ));
    }

    if is_enabled(&config.searchers.enabled, "local") && config.searchers.local.is_none() {
        return Err(ConfigError::ValidationError(
            "searcher \"local\" is enabled but [searchers.local] is missing".to_string(),
        ));
    }

    let notifiers = &config.notifiers;
    if is_enabled(&notifiers.enabled, "telegram") && notifiers.telegram.is_none() {
        return Err(ConfigError::ValidationError(
            "notifier \"telegram\" is enabled but [notifiers.telegram] is missing".to_string(),
        ));
    }
    if is_enabled(&notifiers.enabled, "webhook") && notifiers.webhook.is_none() {
        return Err(ConfigError::ValidationError(
            "notifier \"webhook\" is enabled but [notifiers.webhook] is missing".to_string(),
        ));
    }

    Ok(())
}

fn is_enabled(enabled: &[String], name: &str) -> bool {
    enabled.iter().any(|n| n == name)
}
