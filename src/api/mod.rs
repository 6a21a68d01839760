//! HTTP API module
//!
//! Provides:
//! - Contact submission and scheduled report triggers
//! - JSON views over the live market and dashboard
//! - Server-Sent Events stream of market updates

pub mod handlers;
mod server;
mod types;

pub use server::ApiServer;
pub use types::{
    ApiResponse, ContactResponse, DailyReportResponse, DashboardResponse, MarketEvent, MarketResponse,
    PageQuery,
};
