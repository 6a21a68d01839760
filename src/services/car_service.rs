//! Car Service
//!
//! Read-only queries over the `cars` and `batchRuns` collections.

use crate::error::Result;
use crate::models::{BatchRun, Car, BATCH_RUNS_COLLECTION, CARS_COLLECTION};
use crate::store::{Direction, Document, DocumentStore, Query};
use tracing::{debug, warn};

/// Car service for data access
pub struct CarService;

impl CarService {
    // ========================================================================
    // Queries
    // ========================================================================

    /// Cars ordered by profit, highest first
    pub fn by_profit_query() -> Query {
        Query::collection(CARS_COLLECTION).order_by("profit", Direction::Descending)
    }

    /// Cars ordered by creation time, newest first
    pub fn recent_query(n: usize) -> Query {
        Query::collection(CARS_COLLECTION)
            .order_by("createdAt", Direction::Descending)
            .limit(n)
    }

    /// Batch runs ordered by start time, newest first
    pub fn batch_runs_query(n: usize) -> Query {
        Query::collection(BATCH_RUNS_COLLECTION)
            .order_by("startTime", Direction::Descending)
            .limit(n)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Up to `n` cars by profit descending
    pub async fn top_by_profit(store: &dyn DocumentStore, n: usize) -> Result<Vec<Car>> {
        debug!("CarService::top_by_profit - {}", n);
        let documents = store.run_query(&Self::by_profit_query().limit(n)).await?;
        Ok(Self::decode_cars(&documents))
    }

    /// Up to `n` cars by creation time descending
    pub async fn recent_cars(store: &dyn DocumentStore, n: usize) -> Result<Vec<Car>> {
        debug!("CarService::recent_cars - {}", n);
        let documents = store.run_query(&Self::recent_query(n)).await?;
        Ok(Self::decode_cars(&documents))
    }

    /// One car, `None` when the id is unknown
    pub async fn get_car(store: &dyn DocumentStore, car_id: &str) -> Result<Option<Car>> {
        debug!("CarService::get_car - {}", car_id);
        match store.get_document(CARS_COLLECTION, car_id).await? {
            Some(doc) => Ok(Some(Car::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Every car by profit descending, unbounded
    pub async fn all_by_profit_descending(store: &dyn DocumentStore) -> Result<Vec<Car>> {
        let documents = store.run_query(&Self::by_profit_query()).await?;
        Ok(Self::decode_cars(&documents))
    }

    /// Up to `n` batch runs by start time descending
    pub async fn recent_batch_runs(store: &dyn DocumentStore, n: usize) -> Result<Vec<BatchRun>> {
        let documents = store.run_query(&Self::batch_runs_query(n)).await?;
        Ok(Self::decode_batch_runs(&documents))
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Decode cars, skipping documents that do not parse
    pub fn decode_cars(documents: &[Document]) -> Vec<Car> {
        documents
            .iter()
            .filter_map(|doc| match Car::from_document(doc) {
                Ok(car) => Some(car),
                Err(e) => {
                    warn!("Skipping car document {}: {}", doc.id, e);
                    None
                }
            })
            .collect()
    }

    /// Decode batch runs, skipping documents that do not parse
    pub fn decode_batch_runs(documents: &[Document]) -> Vec<BatchRun> {
        documents
            .iter()
            .filter_map(|doc| match BatchRun::from_document(doc) {
                Ok(run) => Some(run),
                Err(e) => {
                    warn!("Skipping batch run document {}: {}", doc.id, e);
                    None
                }
            })
            .collect()
    }
}
