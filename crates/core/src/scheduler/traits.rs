use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, TimeZone};

/// Result type returned by scheduled jobs.
pub type JobResult = anyhow::Result<()>;

/// When a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// At start, then at a fixed interval.
    Every(Duration),
    /// Every day at each of `hours` (local time), at `minute` past the hour.
    DailyAt { hours: Vec<u32>, minute: u32 },
}

impl Schedule {
    /// Next daily run strictly after `now`. `None` for interval schedules or
    /// when no valid hour is configured.
    ///
    /// Local times that do not exist (DST gaps) are skipped; ambiguous ones
    /// resolve to the earlier instant.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let Schedule::DailyAt { hours, minute } = self else {
            return None;
        };
        let mut hours = hours.clone();
        hours.sort_unstable();
        hours.dedup();

        let tz = now.timezone();
        let today = now.date_naive();
        for offset in 0..=2 {
            let date = today.checked_add_days(Days::new(offset))?;
            for &hour in &hours {
                let Some(naive) = date.and_hms_opt(hour, *minute, 0) else {
                    continue;
                };
                if let Some(at) = tz.from_local_datetime(&naive).earliest() {
                    if at > *now {
                        return Some(at);
                    }
                }
            }
        }
        None
    }

    /// Human-readable run times, e.g. `4:23, 11:23`.
    pub fn describe(&self) -> String {
        match self {
            Schedule::Every(interval) => format!("every {}s", interval.as_secs()),
            Schedule::DailyAt { hours, minute } => hours
                .iter()
                .map(|h| format!("{}:{:02}", h, minute))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Trait for jobs run by the scheduler.
#[async_trait]
pub trait SchedulerJob: Send + Sync {
    /// Job name for logging.
    fn name(&self) -> &'static str;

    fn schedule(&self) -> Schedule;

    /// Run the job once.
    async fn execute(&self) -> JobResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn daily(hours: &[u32], minute: u32) -> Schedule {
        Schedule::DailyAt {
            hours: hours.to_vec(),
            minute,
        }
    }

    #[test]
    fn test_next_after_same_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let next = daily(&[21, 4, 11, 16], 23).next_after(&now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 1, 11, 23, 0).unwrap());
    }

    #[test]
    fn test_next_after_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 11, 23, 0).unwrap();
        let next = daily(&[4, 11, 16, 21], 23).next_after(&now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 1, 16, 23, 0).unwrap());
    }

    #[test]
    fn test_next_after_wraps_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap();
        let next = daily(&[4, 11, 16, 21], 5).next_after(&now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 4, 5, 0).unwrap());
    }

    #[test]
    fn test_next_after_interval_and_empty() {
        let now = Utc::now();
        assert!(Schedule::Every(Duration::from_secs(60))
            .next_after(&now)
            .is_none());
        assert!(daily(&[], 0).next_after(&now).is_none());
        assert!(daily(&[25], 0).next_after(&now).is_none());
    }

    #[test]
    fn test_describe() {
        assert_eq!(daily(&[4, 11], 7).describe(), "4:07, 11:07");
        assert_eq!(
            Schedule::Every(Duration::from_secs(3600)).describe(),
            "every 3600s"
        );
    }
}
