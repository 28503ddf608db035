//! Daily scheduler
//! Runs the charge planner once a day at a fixed UTC hour, after the
//! next day's prices have been published.

use chrono::Timelike;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Seconds after the run hour during which a run still starts immediately
pub const GRACE_SECS: u32 = 5;

const SECS_PER_DAY: u32 = 24 * 3600;

/// Calculate duration until the next run at `run_hour:00` UTC
pub fn time_until_next_run(run_hour: u32) -> Option<Duration> {
    let now = chrono::Utc::now();
    time_until_next_run_at(now.hour(), now.minute(), now.second(), run_hour)
}

/// Testable version: wait time from the given UTC hour/minute/second until `run_hour:00`.
/// Returns None if we should run immediately.
pub fn time_until_next_run_at(hour: u32, minute: u32, second: u32, run_hour: u32) -> Option<Duration> {
    // Within the grace window at the top of the run hour
    if hour == run_hour && minute == 0 && second < GRACE_SECS {
        return None;
    }

    let now_secs = hour * 3600 + minute * 60 + second;
    let target_secs = run_hour * 3600;
    let wait = if target_secs > now_secs {
        target_secs - now_secs
    } else {
        SECS_PER_DAY - now_secs + target_secs
    };
    Some(Duration::from_secs(u64::from(wait)))
}

/// Format duration for logging
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Run the scheduler loop until `cancel` fires
pub async fn run_scheduler<F, Fut>(run_hour: u32, cancel: CancellationToken, mut run_fn: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    info!("Scheduler started (daily at {:02}:00 UTC)", run_hour);

    loop {
        match time_until_next_run(run_hour) {
            Some(wait_duration) => {
                info!("Next run in {}", format_duration(wait_duration));
                tokio::select! {
                    _ = sleep(wait_duration) => {}
                    _ = cancel.cancelled() => break,
                }
            }
            None => {
                debug!("Running immediately");
            }
        }

        run_fn().await;

        // Small delay to avoid running twice within the grace window
        tokio::select! {
            _ = sleep(Duration::from_secs(60)) => {}
            _ = cancel.cancelled() => break,
        }
    }

    info!("Scheduler stopped");
}
