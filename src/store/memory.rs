//! In-process document store
//!
//! Every write broadcasts the collection name; listeners re-run their query
//! and push the full result to their subscriber.

use super::{Document, DocumentStore, Query, Snapshot, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

type Collection = BTreeMap<String, Map<String, Value>>;

/// In-memory store with change notification
pub struct MemoryStore {
    collections: Arc<DashMap<String, Collection>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            collections: Arc::new(DashMap::new()),
            changes,
        }
    }

    /// Insert or replace a document
    pub fn upsert(&self, collection: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.notify(collection);
    }

    /// Remove a document, returning whether it existed
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        let removed = self
            .collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            self.notify(collection);
        }
        removed
    }

    /// Number of live listeners across all subscriptions
    pub fn listener_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine: nobody is listening yet
        let _ = self.changes.send(collection.to_string());
    }

    fn snapshot_of(collections: &DashMap<String, Collection>, query: &Query) -> Vec<Document> {
        let documents = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        query.apply(documents)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        Ok(Self::snapshot_of(&self.collections, query))
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
            .map(|fields| Document::new(id, fields)))
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(Subscription::BUFFER);
        let mut changes = self.changes.subscribe();
        let collections = Arc::clone(&self.collections);
        let listener_query = query.clone();

        let listener = tokio::spawn(async move {
            let initial = Self::snapshot_of(&collections, &listener_query);
            if tx.send(Snapshot::new(initial)).await.is_err() {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(collection) if collection == listener_query.collection => {}
                    Ok(_) => continue,
                    // Missed notifications collapse into one fresh snapshot
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Memory listener lagged by {} notifications", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                let documents = Self::snapshot_of(&collections, &listener_query);
                if tx.send(Snapshot::new(documents)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(query, rx, listener))
    }
}
