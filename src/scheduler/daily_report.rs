//! Daily report scheduler
//!
//! Sends the daily report at a fixed local time (22:20 Europe/Bucharest by
//! default). Missed runs are not caught up and failed sends are not retried.

use crate::services::ReportService;
use crate::state::AppState;
use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Daily report scheduler
pub struct DailyReportScheduler {
    state: Arc<AppState>,
    at: NaiveTime,
    timezone: Tz,
}

impl DailyReportScheduler {
    /// Create a scheduler using the configured time and zone
    pub fn new(state: Arc<AppState>) -> Self {
        let at = state.config.schedule.daily_time;
        let timezone = state.config.schedule.timezone;
        Self { state, at, timezone }
    }

    /// Next instant strictly after `now` when the local clock in `tz` reads `at`
    ///
    /// A local time skipped by a DST change runs an hour later; a repeated one
    /// runs at its first occurrence.
    pub fn next_run(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> DateTime<Utc> {
        let today = now.with_timezone(&tz).date_naive();

        for offset in 0..=2 {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            if let Some(run) = Self::resolve_local(tz, date.and_time(at)) {
                if run > now {
                    return run;
                }
            }
        }

        now + chrono::Duration::days(1)
    }

    fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => tz
                .from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Calculate duration until the next run
    pub fn duration_until(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> Duration {
        (Self::next_run(now, tz, at) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Start the scheduler
    ///
    /// This spawns a background task that sleeps until the next run, sends
    /// the daily report and repeats.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Daily report scheduler started ({} {})", self.at.format("%H:%M"), self.timezone);

            loop {
                let duration = Self::duration_until(Utc::now(), self.timezone, self.at);
                info!(
                    "Next daily report in {} hours {} minutes",
                    duration.as_secs() / 3600,
                    (duration.as_secs() % 3600) / 60
                );

                tokio::time::sleep(duration).await;

                self.execute_daily_report().await;
            }
        })
    }

    /// Send the report once
    async fn execute_daily_report(&self) {
        info!("Executing scheduled daily report");

        match ReportService::send_daily(&self.state).await {
            Ok(delivery) => info!(
                "Scheduled daily report sent: {} cars, message {}",
                delivery.cars_count, delivery.message_id
            ),
            Err(e) => error!("Scheduled daily report failed: {}", e),
        }
    }
}
