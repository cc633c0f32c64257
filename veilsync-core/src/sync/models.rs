//! Wire models for the vector-database REST contract and the engine's
//! structured results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The cluster wraps every response body in `{ "result": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsResult {
    pub collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionDescription {
    pub name: String,
}

/// `GET /collections/{name}` detail payload.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionInfo {
    #[serde(default)]
    pub points_count: Option<u64>,
    #[serde(default)]
    pub config: Option<CollectionConfig>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionConfig {
    pub params: CollectionParams,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionParams {
    #[serde(default)]
    pub vectors: Option<VectorParams>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VectorParams {
    pub size: u64,
}

impl CollectionInfo {
    /// Configured vector dimension, 0 when the cluster does not report one.
    pub fn dimension(&self) -> u64 {
        self.config
            .as_ref()
            .and_then(|c| c.params.vectors.as_ref())
            .map(|v| v.size)
            .unwrap_or(0)
    }
}

/// A point identifier: a 64-bit integer or an opaque string.
///
/// The wire representation is preserved when the point is re-written; the
/// canonical string form (`to_string`) feeds the crypto derivations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Str(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// One point as carried by scroll and upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

/// One page of a cursor-paginated scroll.
#[derive(Debug, Deserialize)]
pub struct ScrollPage {
    #[serde(default)]
    pub points: Vec<PointRecord>,
    /// Opaque continuation cursor; `None` signals exhaustion.
    #[serde(default)]
    pub next_page_offset: Option<Value>,
}

/// Point count and vector dimension for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub points: u64,
    /// 0 = unknown.
    pub dimension: u64,
}

/// Liveness snapshot of one cluster endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EndpointHealth {
    pub online: bool,
    pub collections: u64,
}

/// Result of the status operation across both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub local: EndpointHealth,
    pub cloud_configured: bool,
    pub cloud: EndpointHealth,
}

/// One row of the cloud collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub points: u64,
    pub dimension: u64,
}

/// Public parameters of the active key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInfo {
    pub curve: String,
    pub mode: String,
    pub fingerprint: String,
    pub public_key: String,
}

/// Per-collection result of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub collection: String,
    /// Points seen in the local collection (parseable points only).
    pub points: u64,
    pub synced: u64,
    pub failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub(crate) fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            points: 0,
            synced: 0,
            failed: 0,
            error: None,
        }
    }

    /// Outcome for a collection that failed as a whole: every known point
    /// counts as failed, nothing as synced.
    pub(crate) fn whole_collection_failed(collection: &str, points: u64, error: String) -> Self {
        Self {
            collection: collection.to_string(),
            points,
            synced: 0,
            failed: points,
            error: Some(error),
        }
    }
}

/// Per-collection result of a verify run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub collection: String,
    pub points: u64,
    pub intact: u64,
    pub corrupted: u64,
    /// Points carrying no integrity tag at all.
    pub missing: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyOutcome {
    pub(crate) fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            points: 0,
            intact: 0,
            corrupted: 0,
            missing: 0,
            error: None,
        }
    }

    pub(crate) fn whole_collection_failed(collection: &str, error: String) -> Self {
        Self {
            collection: collection.to_string(),
            error: Some(error),
            ..Self::new(collection)
        }
    }
}

/// Aggregate result of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub collections: Vec<SyncOutcome>,
    pub total_points: u64,
    pub total_synced: u64,
    pub total_failed: u64,
}

impl SyncReport {
    pub fn from_outcomes(collections: Vec<SyncOutcome>) -> Self {
        let total_points = collections.iter().map(|o| o.points).sum();
        let total_synced = collections.iter().map(|o| o.synced).sum();
        let total_failed = collections.iter().map(|o| o.failed).sum();
        Self {
            collections,
            total_points,
            total_synced,
            total_failed,
        }
    }
}

/// Aggregate result of a verify run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub collections: Vec<VerifyOutcome>,
    pub total_points: u64,
    pub total_intact: u64,
    pub total_corrupted: u64,
    pub total_missing: u64,
}

impl VerifyReport {
    pub fn from_outcomes(collections: Vec<VerifyOutcome>) -> Self {
        let total_points = collections.iter().map(|o| o.points).sum();
        let total_intact = collections.iter().map(|o| o.intact).sum();
        let total_corrupted = collections.iter().map(|o| o.corrupted).sum();
        let total_missing = collections.iter().map(|o| o.missing).sum();
        Self {
            collections,
            total_points,
            total_intact,
            total_corrupted,
            total_missing,
        }
    }
}

/// Coerce a payload to plain scalar/string/bool fields.
///
/// Scalars, strings, and bools pass through; nested arrays and objects are
/// stringified to JSON text; nulls are dropped.
pub(crate) fn sanitize_payload(payload: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(payload) = payload else {
        return out;
    };
    for (key, value) in payload {
        match value {
            Value::Null => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                out.insert(key, value);
            }
            nested => {
                out.insert(key, Value::String(nested.to_string()));
            }
        }
    }
    out
}
