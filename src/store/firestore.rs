//! Firestore REST adapter
//!
//! Queries go through `documents:runQuery`, point lookups through a document
//! GET. Live subscriptions poll the query and push a snapshot whenever the
//! result set changes.

use super::{store_error, Document, DocumentStore, Query, Snapshot, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Public Firestore REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Connection settings for a Firestore database
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// REST root, without a trailing slash
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }
}

/// Firestore document store
pub struct FirestoreStore {
    client: Client,
    config: Arc<FirestoreConfig>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    fn authorize(config: &FirestoreConfig, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match &config.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        };
        match &config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch(client: &Client, config: &FirestoreConfig, query: &Query) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", config.documents_url());
        let body = json!({ "structuredQuery": structured_query(query) });

        let response = Self::authorize(config, client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(store_error(
                &format!("runQuery on '{}' failed", query.collection),
                format!("{} {}", status, text),
            ));
        }

        let rows: Vec<RunQueryRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(RawDocument::into_document)
            .collect())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        Self::fetch(&self.client, &self.config, query).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!(
            "{}/{}/{}",
            self.config.documents_url(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        );

        let response = Self::authorize(&self.config, self.client.get(&url))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let raw: RawDocument = response.json().await?;
                Ok(Some(raw.into_document()))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(store_error(
                    &format!("get {}/{} failed", collection, id),
                    format!("{} {}", status, text),
                ))
            }
        }
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(Subscription::BUFFER);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let listener_query = query.clone();

        let listener = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<Vec<Document>> = None;

            loop {
                ticker.tick().await;

                let documents = match Self::fetch(&client, &config, &listener_query).await {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!("Polling '{}' failed: {}", listener_query.collection, e);
                        continue;
                    }
                };

                if last.as_ref() == Some(&documents) {
                    continue;
                }

                debug!(
                    "Snapshot of '{}' changed ({} documents)",
                    listener_query.collection,
                    documents.len()
                );
                last = Some(documents.clone());

                if tx.send(Snapshot::new(documents)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(query, rx, listener))
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Deserialize)]
struct RunQueryRow {
    document: Option<RawDocument>,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn into_document(self) -> Document {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect();
        Document::new(id, fields)
    }
}

/// Build the `structuredQuery` body for a query
fn structured_query(query: &Query) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": query.collection }],
    });

    if let Some(order) = &query.order_by {
        structured["orderBy"] = json!([{
            "field": { "fieldPath": order.field },
            "direction": order.direction.as_firestore(),
        }]);
    }

    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    structured
}

/// Flatten a Firestore typed value into plain JSON
fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            other => other.clone(),
        },
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use axum::extract::State;
    use axum::http::{Method, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Local REST server replaying scripted `runQuery` answers
    struct FakeFirestore {
        answers: Mutex<VecDeque<(StatusCode, Value)>>,
        queries: AtomicUsize,
    }

    impl FakeFirestore {
        fn new(answers: Vec<(StatusCode, Value)>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                queries: AtomicUsize::new(0),
            })
        }

        /// Next scripted answer; the last one repeats forever
        fn next_answer(&self) -> (StatusCode, Value) {
            let mut answers = self.answers.lock();
            if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                answers.front().cloned().unwrap()
            }
        }
    }

    async fn fake_handler(State(fake): State<Arc<FakeFirestore>>, method: Method, uri: Uri) -> Response {
        let path = uri.path();
        if method == Method::POST && path.ends_with(":runQuery") {
            fake.queries.fetch_add(1, Ordering::SeqCst);
            let (status, body) = fake.next_answer();
            return (status, Json(body)).into_response();
        }
        if path.ends_with("/cars/missing") {
            return (StatusCode::NOT_FOUND, Json(json!({"error": {"code": 404}}))).into_response();
        }
        if path.ends_with("/cars/broken") {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"code": 500}}))).into_response();
        }
        (StatusCode::OK, Json(raw_car("car-1", 100))).into_response()
    }

    async fn serve(fake: Arc<FakeFirestore>) -> FirestoreStore {
        let app = Router::new().fallback(fake_handler).with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FirestoreStore::new(FirestoreConfig {
            base_url: format!("http://{}/v1", addr),
            project_id: "carbot".to_string(),
            database: "(default)".to_string(),
            api_key: None,
            bearer_token: None,
            poll_interval: Duration::from_millis(20),
        })
        .unwrap()
    }

    fn raw_car(id: &str, profit: i64) -> Value {
        json!({
            "name": format!("projects/carbot/databases/(default)/documents/cars/{}", id),
            "fields": {"profit": {"integerValue": profit.to_string()}}
        })
    }

    fn rows(cars: &[(&str, i64)]) -> (StatusCode, Value) {
        let rows: Vec<Value> = cars
            .iter()
            .map(|(id, profit)| json!({"document": raw_car(id, *profit), "readTime": "2026-10-16T08:00:00Z"}))
            .collect();
        (StatusCode::OK, Value::Array(rows))
    }

    async fn next_snapshot(subscription: &mut Subscription) -> Snapshot {
        tokio::time::timeout(Duration::from_secs(2), subscription.next())
            .await
            .expect("no snapshot in time")
            .expect("subscription ended")
    }

    #[tokio::test]
    async fn test_poll_delivers_only_changed_results() {
        let fake = FakeFirestore::new(vec![
            rows(&[("car-1", 100)]),
            rows(&[("car-1", 100)]),
            rows(&[("car-1", 100)]),
            rows(&[("car-1", 250), ("car-2", 40)]),
        ]);
        let store = serve(fake.clone()).await;
        let mut subscription = store.subscribe(Query::collection("cars")).await.unwrap();

        let first = next_snapshot(&mut subscription).await;
        assert_eq!(first.documents.len(), 1);
        assert_eq!(first.documents[0].fields["profit"], json!(100));

        let second = next_snapshot(&mut subscription).await;
        assert_eq!(second.documents.len(), 2);
        assert_eq!(second.documents[0].fields["profit"], json!(250));

        // The changed rows keep repeating; none of those polls may emit
        let quiet = tokio::time::timeout(Duration::from_millis(200), subscription.next()).await;
        assert!(quiet.is_err());
        assert!(fake.queries.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn test_failed_poll_is_not_a_snapshot() {
        let fake = FakeFirestore::new(vec![
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": {"status": "UNAVAILABLE"}})),
            rows(&[("car-1", 100)]),
        ]);
        let store = serve(fake.clone()).await;
        let mut subscription = store.subscribe(Query::collection("cars")).await.unwrap();

        let first = next_snapshot(&mut subscription).await;
        assert_eq!(first.documents.len(), 1);
        assert_eq!(first.documents[0].id, "car-1");
        assert!(fake.queries.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_run_query_error_status() {
        let fake = FakeFirestore::new(vec![(StatusCode::FORBIDDEN, json!({"error": {"code": 403}}))]);
        let store = serve(fake).await;

        let err = store.run_query(&Query::collection("cars")).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Store(_)));
    }

    #[tokio::test]
    async fn test_get_document_not_found_is_none() {
        let store = serve(FakeFirestore::new(vec![rows(&[])])).await;

        assert!(store.get_document("cars", "missing").await.unwrap().is_none());

        let found = store.get_document("cars", "car-1").await.unwrap().unwrap();
        assert_eq!(found.id, "car-1");
        assert_eq!(found.fields["profit"], json!(100));

        assert!(store.get_document("cars", "broken").await.is_err());
    }

    #[test]
    fn test_structured_query() {
        let query = Query::collection("cars")
            .order_by("profit", Direction::Descending)
            .limit(10);
        let body = structured_query(&query);

        assert_eq!(body["from"][0]["collectionId"], "cars");
        assert_eq!(body["orderBy"][0]["field"]["fieldPath"], "profit");
        assert_eq!(body["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(body["limit"], 10);

        let body = structured_query(&Query::collection("batchRuns"));
        assert!(body.get("orderBy").is_none());
        assert!(body.get("limit").is_none());
    }

    #[test]
    fn test_decode_typed_values() {
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/cars/car-42",
            "fields": {
                "makeModel": {"stringValue": "Skoda Octavia"},
                "profit": {"integerValue": "1250"},
                "profitPercentage": {"doubleValue": 12.5},
                "sold": {"booleanValue": false},
                "createdAt": {"timestampValue": "2025-06-01T10:00:00.123456Z"},
                "vin": {"nullValue": null},
                "features": {"arrayValue": {"values": [{"stringValue": "Navi"}]}},
                "images": {"arrayValue": {}},
                "seller": {"mapValue": {"fields": {"type": {"stringValue": "dealer"}}}}
            }
        });

        let doc = serde_json::from_value::<RawDocument>(raw).unwrap().into_document();
        assert_eq!(doc.id, "car-42");
        assert_eq!(doc.fields["makeModel"], json!("Skoda Octavia"));
        assert_eq!(doc.fields["profit"], json!(1250));
        assert_eq!(doc.fields["profitPercentage"], json!(12.5));
        assert_eq!(doc.fields["sold"], json!(false));
        assert_eq!(doc.fields["createdAt"], json!("2025-06-01T10:00:00.123456Z"));
        assert_eq!(doc.fields["vin"], Value::Null);
        assert_eq!(doc.fields["features"], json!(["Navi"]));
        assert_eq!(doc.fields["images"], json!([]));
        assert_eq!(doc.fields["seller"], json!({"type": "dealer"}));
    }

    #[test]
    fn test_run_query_rows_without_documents() {
        let rows: Vec<RunQueryRow> = serde_json::from_value(json!([
            {"readTime": "2025-06-01T10:00:00Z"}
        ]))
        .unwrap();
        assert!(rows[0].document.is_none());
    }
}
