//! Report rendering module
//!
//! Turns a ranked list of cars into an email: subject line, plaintext body
//! and standalone HTML body with inline styles. Two profiles exist:
//! - `on_demand`: English / USD, sent when a visitor submits the contact form
//! - `daily`: Romanian / EUR, sent by the scheduled trigger

mod locale;
mod render;
mod strings;

pub use locale::{Currency, Locale};
pub use render::{render_report, RenderedReport, ReportKind, ReportProfile, MAX_REPORT_CARS};
