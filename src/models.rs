//! Domain models read from the document store
//!
//! Records are written by the external ingestion pipeline, so decoding is
//! lenient: numbers may arrive as strings, money fields may be missing.

use crate::error::Result;
use crate::store::Document;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Collection holding analysed cars
pub const CARS_COLLECTION: &str = "cars";

/// Collection holding ingestion batch runs
pub const BATCH_RUNS_COLLECTION: &str = "batchRuns";

// ============================================================================
// Flexible Deserializers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleNumber {
    Float(f64),
    Int(i64),
    Str(String),
    Null(()),
}

impl FlexibleNumber {
    fn into_f64(self) -> std::result::Result<Option<f64>, String> {
        match self {
            FlexibleNumber::Float(f) => Ok(Some(f)),
            FlexibleNumber::Int(i) => Ok(Some(i as f64)),
            FlexibleNumber::Str(s) if s.trim().is_empty() => Ok(None),
            FlexibleNumber::Str(s) => s.trim().parse().map(Some).map_err(|e| format!("{}", e)),
            FlexibleNumber::Null(()) => Ok(None),
        }
    }
}

/// Number or numeric string; null and missing read as 0
fn deserialize_flexible_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleNumber::deserialize(deserializer)?
        .into_f64()
        .map(|v| v.unwrap_or(0.0))
        .map_err(serde::de::Error::custom)
}

fn deserialize_optional_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexibleNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) => n.into_f64().map_err(serde::de::Error::custom),
    }
}

fn deserialize_optional_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_f64(deserializer).map(|v| v.map(|f| f.max(0.0) as u32))
}

fn deserialize_flexible_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_flexible_f64(deserializer).map(|f| f.max(0.0) as u64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleText {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null(()),
}

impl FlexibleText {
    fn into_string(self) -> Option<String> {
        match self {
            FlexibleText::Str(s) => Some(s),
            FlexibleText::Int(i) => Some(i.to_string()),
            FlexibleText::Float(f) => Some(f.to_string()),
            FlexibleText::Bool(b) => Some(b.to_string()),
            FlexibleText::Null(()) => None,
        }
    }
}

/// String or number rendered as text; null reads as empty
fn deserialize_flexible_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FlexibleText::deserialize(deserializer)?
        .into_string()
        .unwrap_or_default())
}

/// Optional text where an empty string counts as absent
fn deserialize_optional_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlexibleText>::deserialize(deserializer)?
        .and_then(FlexibleText::into_string)
        .filter(|s| !s.trim().is_empty()))
}

/// Timestamp as RFC 3339 text, epoch milliseconds, or `{seconds, nanoseconds}`
fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        Parts {
            seconds: i64,
            #[serde(default)]
            nanoseconds: u32,
        },
        Null(()),
    }

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None | Some(RawTimestamp::Null(())) => Ok(None),
        Some(RawTimestamp::Text(s)) if s.is_empty() => Ok(None),
        Some(RawTimestamp::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(RawTimestamp::Millis(ms)) => Ok(Utc.timestamp_millis_opt(ms).single()),
        Some(RawTimestamp::Parts { seconds, nanoseconds }) => {
            Ok(Utc.timestamp_opt(seconds, nanoseconds).single())
        }
    }
}

// ============================================================================
// Car
// ============================================================================

/// Analysed car with precomputed profit metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(default)]
    pub car_id: String,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub make_model: String,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub full_title: String,
    #[serde(default, deserialize_with = "deserialize_flexible_string")]
    pub year: String,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub end_auction_price: f64,
    /// Auction price minus total cost, stored by the pipeline
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub profit: f64,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub profit_percentage: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub auto1_link: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub autovit_link: Option<String>,
    /// Legacy name of `auto1_link`
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub details: CarDetails,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub last_analyzed: Option<DateTime<Utc>>,
}

/// Extended attributes shown on the car detail view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDetails {
    // Auto1 pricing
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub minimum_bid_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub delivery_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub total_roti_price: Option<f64>,

    // Autovit market data
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub autovit_average_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_u32", skip_serializing_if = "Option::is_none")]
    pub autovit_listings_count: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub autovit_max_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub autovit_median_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub autovit_min_price: Option<f64>,

    // Vehicle
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub cylinder_capacity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub odometer_reading: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub trim_level: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub country_of_registration: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub engine_size: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_u32", skip_serializing_if = "Option::is_none")]
    pub doors: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_u32", skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub first_registration: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub technical_inspection_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub emission_class: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub co2_emission: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64", skip_serializing_if = "Option::is_none")]
    pub fuel_consumption: Option<f64>,

    // Listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub seller_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub damage_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_u32", skip_serializing_if = "Option::is_none")]
    pub previous_owners: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub service_history: Option<String>,
}

impl Car {
    /// Decode a store document, using the document id as `car_id`
    pub fn from_document(doc: &Document) -> Result<Self> {
        let mut car: Car = doc.decode_with_id("carId")?;
        car.apply_link_alias();
        Ok(car)
    }

    /// Older records keep the Auto1 listing under `url`; it wins when present
    pub fn apply_link_alias(&mut self) {
        if let Some(url) = self.url.as_ref() {
            self.auto1_link = Some(url.clone());
        }
    }

    /// Whether the stored profit is strictly positive
    pub fn is_profitable(&self) -> bool {
        self.profit > 0.0
    }
}

// ============================================================================
// Batch Run
// ============================================================================

/// Ingestion batch run status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Running,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Summary of one ingestion batch, produced by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRun {
    #[serde(default)]
    pub batch_run_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_flexible_u64")]
    pub total_cars: u64,
    #[serde(default, deserialize_with = "deserialize_flexible_u64")]
    pub successful_cars: u64,
    #[serde(default, deserialize_with = "deserialize_flexible_u64")]
    pub failed_cars: u64,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub average_profit: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub total_profit: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub highest_profit: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_u64")]
    pub profitable_cars: u64,
    #[serde(default)]
    pub status: BatchStatus,
}

impl BatchRun {
    /// Decode a store document, using the document id as `batch_run_id`
    pub fn from_document(doc: &Document) -> Result<Self> {
        doc.decode_with_id("batchRunId")
    }

    /// Wall-clock duration, once the run has finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

// ============================================================================
// Contact
// ============================================================================

/// Required contact form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Message,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::Name,
        ContactField::Email,
        ContactField::Phone,
        ContactField::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Message => "message",
        }
    }
}

/// Validated contact submission; never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: serde_json::Value) -> Document {
        Document::new(id, value.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_car_lenient_decoding() {
        let car = Car::from_document(&doc(
            "abc",
            json!({
                "makeModel": "VW Golf",
                "year": 2019,
                "totalCost": "8500.50",
                "endAuctionPrice": 10000,
                "profit": null,
                "profitPercentage": "",
                "mileage": "120000",
                "features": ["Navi", "Heated seats"],
                "createdAt": "2025-06-01T10:00:00Z",
                "somethingNew": {"nested": true}
            }),
        ))
        .unwrap();

        assert_eq!(car.car_id, "abc");
        assert_eq!(car.year, "2019");
        assert_eq!(car.total_cost, 8500.5);
        assert_eq!(car.end_auction_price, 10000.0);
        assert_eq!(car.profit, 0.0);
        assert_eq!(car.profit_percentage, None);
        assert_eq!(car.details.mileage, Some(120000.0));
        assert_eq!(car.details.features.as_ref().map(Vec::len), Some(2));
        assert!(car.created_at.is_some());
        assert_eq!(car.full_title, "");
    }

    #[test]
    fn test_url_aliases_auto1_link() {
        let car = Car::from_document(&doc(
            "a",
            json!({"url": "https://auto1.example/1", "auto1Link": "https://old.example"}),
        ))
        .unwrap();
        assert_eq!(car.auto1_link.as_deref(), Some("https://auto1.example/1"));

        let car = Car::from_document(&doc("b", json!({"auto1Link": "https://auto1.example/2"}))).unwrap();
        assert_eq!(car.auto1_link.as_deref(), Some("https://auto1.example/2"));

        let car = Car::from_document(&doc("c", json!({"url": ""}))).unwrap();
        assert_eq!(car.auto1_link, None);
    }

    #[test]
    fn test_timestamp_forms() {
        let car = Car::from_document(&doc(
            "t",
            json!({
                "createdAt": 1_700_000_000_000i64,
                "updatedAt": {"seconds": 1_700_000_000, "nanoseconds": 0},
                "lastAnalyzed": null
            }),
        ))
        .unwrap();
        assert_eq!(car.created_at, car.updated_at);
        assert_eq!(car.last_analyzed, None);
    }

    #[test]
    fn test_batch_run_status_and_duration() {
        let run = BatchRun::from_document(&doc(
            "run-1",
            json!({
                "startTime": "2025-06-01T10:00:00Z",
                "endTime": "2025-06-01T10:30:00Z",
                "totalCars": 40,
                "successfulCars": "38",
                "failedCars": 2,
                "status": "completed"
            }),
        ))
        .unwrap();
        assert_eq!(run.batch_run_id, "run-1");
        assert_eq!(run.status, BatchStatus::Completed);
        assert_eq!(run.successful_cars, 38);
        assert_eq!(run.duration(), Some(chrono::Duration::minutes(30)));

        let run = BatchRun::from_document(&doc("run-2", json!({"status": "paused"}))).unwrap();
        assert_eq!(run.status, BatchStatus::Unknown);
        assert_eq!(run.duration(), None);
    }
}
