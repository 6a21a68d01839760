//! Live views module
//!
//! Views subscribe to store queries and rebuild their in-memory state from
//! every full snapshot. Pagination slices the in-memory list and never
//! queries the store.

mod page;
mod view;

pub use page::{clamp_page, page_window, paginate, total_pages, Page};
pub use view::{LiveView, StatsScope, ViewKind, ViewSummary, DASHBOARD_BATCH_RUNS, DASHBOARD_RECENT_CARS};
