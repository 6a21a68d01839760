//! Scheduler module
//!
//! Handles scheduled tasks:
//! - Daily top-cars report at a configured local time

mod daily_report;

pub use daily_report::DailyReportScheduler;
