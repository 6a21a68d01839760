//! Services Layer
//!
//! Business logic shared between the HTTP handlers, the live views and the
//! in-process scheduler.
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers ──┐
//! Scheduler ──────┼──> Services --> DocumentStore / MailDispatcher
//! Live views ─────┘
//! ```
//!
//! # Services
//!
//! - `CarService` - Car and batch-run queries
//! - `ReportService` - Fetch, render and send the top-cars report
//! - `ContactService` - Validate a contact submission and trigger a report

pub mod car_service;
pub mod contact_service;
pub mod report_service;

pub use car_service::CarService;
pub use contact_service::{ContactForm, ContactService};
pub use report_service::{ReportDelivery, ReportService};
