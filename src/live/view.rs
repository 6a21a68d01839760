//! Live view controller
//!
//! A view owns its store subscriptions. Each delivered snapshot replaces the
//! view's whole state and bumps a version counter; readers take copies under
//! a short read lock.

use super::page::{paginate, total_pages, Page};
use crate::error::Result;
use crate::models::{BatchRun, Car};
use crate::services::CarService;
use crate::stats::AggregateStats;
use crate::store::{DocumentStore, Snapshot, Subscription};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

/// Cars shown by the dashboard view
pub const DASHBOARD_RECENT_CARS: usize = 10;

/// Batch runs shown by the dashboard view
pub const DASHBOARD_BATCH_RUNS: usize = 5;

/// Which screen a view backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    /// Every car by profit, paginated
    Market,
    /// Most recent cars plus latest batch runs
    Dashboard,
}

/// Which cars the view's stats were computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatsScope {
    #[serde(rename = "all")]
    FullSet,
    /// Only the recent window the dashboard displays
    #[serde(rename = "recent")]
    RecentWindow,
}

impl ViewKind {
    pub fn stats_scope(&self) -> StatsScope {
        match self {
            ViewKind::Market => StatsScope::FullSet,
            ViewKind::Dashboard => StatsScope::RecentWindow,
        }
    }
}

#[derive(Debug, Clone)]
struct ViewState {
    cars: Vec<Car>,
    batch_runs: Vec<BatchRun>,
    stats: AggregateStats,
    loading: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            cars: Vec::new(),
            batch_runs: Vec::new(),
            stats: AggregateStats::default(),
            loading: true,
            updated_at: None,
        }
    }
}

/// Serializable summary of a view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub kind: ViewKind,
    pub loading: bool,
    pub stats: AggregateStats,
    pub stats_scope: StatsScope,
    pub total_pages: usize,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-memory view kept current by store subscriptions
pub struct LiveView {
    kind: ViewKind,
    page_size: usize,
    state: Arc<RwLock<ViewState>>,
    version: Arc<watch::Sender<u64>>,
    listeners: Mutex<Vec<AbortHandle>>,
    consumers: Mutex<Vec<JoinHandle<()>>>,
}

impl LiveView {
    /// Subscribe to the queries backing `kind`
    pub async fn start(store: Arc<dyn DocumentStore>, kind: ViewKind, page_size: usize) -> Result<Self> {
        let (version, _) = watch::channel(0u64);
        let view = Self {
            kind,
            page_size: page_size.max(1),
            state: Arc::new(RwLock::new(ViewState::default())),
            version: Arc::new(version),
            listeners: Mutex::new(Vec::new()),
            consumers: Mutex::new(Vec::new()),
        };

        match kind {
            ViewKind::Market => {
                let cars = store.subscribe(CarService::by_profit_query()).await?;
                view.attach(cars, Self::apply_cars);
            }
            ViewKind::Dashboard => {
                let cars = store
                    .subscribe(CarService::recent_query(DASHBOARD_RECENT_CARS))
                    .await?;
                view.attach(cars, Self::apply_cars);

                let runs = store
                    .subscribe(CarService::batch_runs_query(DASHBOARD_BATCH_RUNS))
                    .await?;
                view.attach(runs, Self::apply_batch_runs);
            }
        }

        info!("{:?} view started on {}", kind, store.name());
        Ok(view)
    }

    fn attach(&self, mut subscription: Subscription, apply: fn(ViewKind, &mut ViewState, &Snapshot)) {
        self.listeners.lock().push(subscription.abort_handle());

        let kind = self.kind;
        let state = self.state.clone();
        let version = self.version.clone();

        let consumer = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                {
                    let mut guard = state.write();
                    apply(kind, &mut guard, &snapshot);
                }
                version.send_modify(|v| *v += 1);
            }
            debug!("{:?} subscription {} ended", kind, subscription.id());
        });

        self.consumers.lock().push(consumer);
    }

    fn apply_cars(kind: ViewKind, state: &mut ViewState, snapshot: &Snapshot) {
        let mut cars = CarService::decode_cars(&snapshot.documents);
        if kind == ViewKind::Market {
            cars.sort_by(|a, b| b.profit.total_cmp(&a.profit));
        }

        state.stats = AggregateStats::from_cars(&cars);
        state.cars = cars;
        state.loading = false;
        state.updated_at = Some(snapshot.read_time);

        debug!("{:?} view: {} cars", kind, state.cars.len());
    }

    fn apply_batch_runs(kind: ViewKind, state: &mut ViewState, snapshot: &Snapshot) {
        state.batch_runs = CarService::decode_batch_runs(&snapshot.documents);
        debug!("{:?} view: {} batch runs", kind, state.batch_runs.len());
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// True until the first car snapshot arrives
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn stats(&self) -> AggregateStats {
        self.state.read().stats
    }

    pub fn cars(&self) -> Vec<Car> {
        self.state.read().cars.clone()
    }

    pub fn batch_runs(&self) -> Vec<BatchRun> {
        self.state.read().batch_runs.clone()
    }

    /// Receiver notified after every applied snapshot
    pub fn watch_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn summary(&self) -> ViewSummary {
        let state = self.state.read();
        ViewSummary {
            kind: self.kind,
            loading: state.loading,
            stats: state.stats,
            stats_scope: self.kind.stats_scope(),
            total_pages: total_pages(state.cars.len(), self.page_size),
            version: *self.version.borrow(),
            updated_at: state.updated_at,
        }
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Slice the current list to `requested`
    ///
    /// The view keeps no page cursor: every caller names its own page, and a
    /// page left past the end by a shrinking list comes back as page 1.
    pub fn page(&self, requested: usize) -> Page<Car> {
        let state = self.state.read();
        paginate(&state.cars, requested, self.page_size)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Cancel every subscription of this view
    pub fn close(&self) {
        let listeners: Vec<_> = self.listeners.lock().drain(..).collect();
        let consumers: Vec<_> = self.consumers.lock().drain(..).collect();
        if listeners.is_empty() && consumers.is_empty() {
            return;
        }

        for listener in &listeners {
            listener.abort();
        }
        for consumer in &consumers {
            consumer.abort();
        }
        info!("{:?} view closed ({} subscriptions)", self.kind, listeners.len());
    }

    pub fn is_closed(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BATCH_RUNS_COLLECTION, CARS_COLLECTION};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for_version(view: &LiveView, target: u64) {
        let mut rx = view.watch_version();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|v| *v >= target))
            .await
            .expect("view did not update in time")
            .unwrap();
    }

    async fn wait_for_listeners(store: &MemoryStore, expected: usize) {
        for _ in 0..200 {
            if store.listener_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("listener count stuck at {}", store.listener_count());
    }

    fn add_car(store: &MemoryStore, id: &str, profit: f64) {
        store.upsert(CARS_COLLECTION, id, json!({"makeModel": id, "profit": profit}));
    }

    #[tokio::test]
    async fn test_market_view_recomputes_on_change() {
        let store = Arc::new(MemoryStore::new());
        add_car(&store, "a", 100.0);
        add_car(&store, "b", 0.0);

        let view = LiveView::start(store.clone(), ViewKind::Market, 15).await.unwrap();
        wait_for_version(&view, 1).await;
        assert!(!view.is_loading());
        assert_eq!(view.stats().count, 2);
        assert_eq!(view.stats().profitable_count, 1);

        add_car(&store, "c", 500.0);
        wait_for_version(&view, 2).await;

        let cars = view.cars();
        assert_eq!(cars[0].car_id, "c");
        assert_eq!(view.stats().total_profit, 600.0);
        assert_eq!(view.summary().stats_scope, StatsScope::FullSet);
    }

    #[tokio::test]
    async fn test_pagination_and_shrink_reset() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..23 {
            add_car(&store, &format!("car-{:02}", i), 1000.0 - i as f64);
        }

        let view = LiveView::start(store.clone(), ViewKind::Market, 15).await.unwrap();
        wait_for_version(&view, 1).await;

        let first = view.page(1);
        assert_eq!(first.items.len(), 15);
        assert_eq!(first.items[0].car_id, "car-00");

        let second = view.page(2);
        assert_eq!(second.items.len(), 8);
        assert_eq!(second.items[0].car_id, "car-15");

        assert_eq!(view.page(3).page, 1);
        assert_eq!(view.page(1).page, 1);

        for i in 10..23 {
            store.remove(CARS_COLLECTION, &format!("car-{:02}", i));
        }
        for _ in 0..200 {
            if view.cars().len() == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(view.cars().len(), 10);
        let shrunk = view.page(2);
        assert_eq!(shrunk.page, 1);
        assert_eq!(shrunk.total_pages, 1);
        assert_eq!(shrunk.items.len(), 10);
    }

    #[tokio::test]
    async fn test_dashboard_stats_cover_recent_window() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..12 {
            store.upsert(
                CARS_COLLECTION,
                &format!("car-{:02}", i),
                json!({"profit": 10.0, "createdAt": format!("2026-10-{:02}T08:00:00Z", i + 1)}),
            );
        }
        for i in 0..7 {
            store.upsert(
                BATCH_RUNS_COLLECTION,
                &format!("run-{}", i),
                json!({"startTime": format!("2026-10-0{}T00:00:00Z", i + 1), "status": "completed"}),
            );
        }

        let view = LiveView::start(store.clone(), ViewKind::Dashboard, 15).await.unwrap();
        wait_for_version(&view, 2).await;

        assert_eq!(view.stats().count, DASHBOARD_RECENT_CARS);
        assert_eq!(view.cars()[0].car_id, "car-11");
        assert_eq!(view.batch_runs().len(), DASHBOARD_BATCH_RUNS);
        assert_eq!(view.batch_runs()[0].batch_run_id, "run-6");
        assert_eq!(view.summary().stats_scope, StatsScope::RecentWindow);
    }

    #[tokio::test]
    async fn test_close_releases_store_listeners() {
        let store = Arc::new(MemoryStore::new());
        let view = LiveView::start(store.clone(), ViewKind::Dashboard, 15).await.unwrap();
        wait_for_listeners(&store, 2).await;

        view.close();
        assert!(view.is_closed());
        wait_for_listeners(&store, 0).await;

        let market = LiveView::start(store.clone(), ViewKind::Market, 15).await.unwrap();
        wait_for_listeners(&store, 1).await;
        drop(market);
        wait_for_listeners(&store, 0).await;
    }
}
