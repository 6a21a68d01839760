//! Document store module
//!
//! Provides:
//! - `DocumentStore` trait with query, point lookup and live subscriptions
//! - `FirestoreStore` over the Firestore REST API
//! - `MemoryStore` for tests and offline demo runs

mod firestore;
mod memory;
mod query;

pub use firestore::{FirestoreConfig, FirestoreStore, DEFAULT_BASE_URL};
pub use memory::MemoryStore;
pub use query::{Direction, OrderBy, Query};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

/// A stored document: its id plus plain JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Deserialize the fields, injecting the document id under `id_field`
    pub fn decode_with_id<T: DeserializeOwned>(&self, id_field: &str) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert(id_field.to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Field value used for ordering
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }
}

/// Full result set delivered with each change notification
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub read_time: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            read_time: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Document store trait that every backend must implement
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Run a filtered, ordered, limited query
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Fetch one document, `None` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Register a persistent listener delivering full snapshots of `query`
    async fn subscribe(&self, query: Query) -> Result<Subscription>;
}

/// Handle to a live query listener
///
/// Cancelling (or dropping) the handle stops the store-side listener task.
pub struct Subscription {
    id: Uuid,
    query: Query,
    receiver: mpsc::Receiver<Snapshot>,
    listener: JoinHandle<()>,
}

impl Subscription {
    /// Channel capacity between listener and consumer
    pub const BUFFER: usize = 16;

    pub fn new(query: Query, receiver: mpsc::Receiver<Snapshot>, listener: JoinHandle<()>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            receiver,
            listener,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next snapshot; `None` once the listener is gone
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Stop the listener; in-flight store calls are not interrupted mid-flight
    pub fn cancel(&self) {
        self.listener.abort();
    }

    /// Handle that stops the listener without owning the subscription
    pub fn abort_handle(&self) -> AbortHandle {
        self.listener.abort_handle()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("query", &self.query)
            .finish()
    }
}

/// Convert a store response status into an error
pub(crate) fn store_error(context: &str, detail: impl std::fmt::Display) -> AppError {
    AppError::Store(format!("{}: {}", context, detail))
}
