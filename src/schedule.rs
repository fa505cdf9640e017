//! Recurring run schedule
//!
//! Cron expressions are accepted in the classic 5-field form (minute
//! precision) as well as the 6/7-field form with a leading seconds field.

use crate::ConfigError;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;

/// Parses a cron expression into a [`Schedule`]
pub fn parse_schedule(spec: &str) -> Result<Schedule, ConfigError> {
    let spec = spec.trim();
    let normalized = if spec.split_whitespace().count() == 5 {
        format!("0 {}", spec)
    } else {
        spec.to_string()
    };

    Schedule::from_str(&normalized).map_err(|e| ConfigError::InvalidSchedule {
        spec: spec.to_string(),
        reason: e.to_string(),
    })
}

/// Returns the next fire time strictly after `after`
pub fn next_fire_time(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

/// Invokes `job` at every upcoming fire time of `schedule`
///
/// Runs never overlap: the next fire time is computed after the previous run
/// finished. Returns once the schedule has no upcoming fire time.
pub async fn run_scheduled<F, Fut>(schedule: &Schedule, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let now = Utc::now();
        let next = match next_fire_time(schedule, now) {
            Some(next) => next,
            None => {
                tracing::warn!("Schedule has no upcoming fire time, stopping");
                return;
            }
        };

        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!("Next run scheduled at {} (in {:?})", next, wait);
        tokio::time::sleep(wait).await;

        job().await;
    }
}
