//! HTTP client for one vector-database cluster.

use crate::sync::models::{
    ApiEnvelope, CollectionInfo, CollectionStats, CollectionsResult, PointRecord, ScrollPage,
};
use crate::{Result, VectorSyncError};
use serde_json::{json, Value};
use std::time::Duration;

/// Per-request timeout, shared by both clusters.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// REST client for a single cluster endpoint (local or cloud).
///
/// Connection-pooled and long-lived; construct one per endpoint and reuse it
/// for the process lifetime.
pub struct ClusterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ClusterClient {
    /// Create a client for the given base URL; `api_key`, when present, is
    /// sent as the `api-key` header on every request.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VectorSyncError::Io(std::io::Error::other(e.to_string())))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List collection names via `GET /collections`.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let body = self
            .send(self.request(reqwest::Method::GET, "/collections"))
            .await?;
        let envelope: ApiEnvelope<CollectionsResult> = decode(&body)?;
        Ok(envelope
            .result
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Fetch point count and vector dimension via `GET /collections/{name}`.
    pub async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        let path = format!("/collections/{}", collection);
        let body = self.send(self.request(reqwest::Method::GET, &path)).await?;
        let envelope: ApiEnvelope<CollectionInfo> = decode(&body)?;
        Ok(CollectionStats {
            points: envelope.result.points_count.unwrap_or(0),
            dimension: envelope.result.dimension(),
        })
    }

    /// Whether a collection exists on the cluster (404 → false).
    pub async fn collection_exists(&self, collection: &str) -> Result<bool> {
        match self.collection_stats(collection).await {
            Ok(_) => Ok(true),
            Err(VectorSyncError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a collection with the given dimension and cosine distance via
    /// `PUT /collections/{name}`.
    pub async fn create_collection(&self, collection: &str, dimension: u64) -> Result<()> {
        let path = format!("/collections/{}", collection);
        let body = json!({ "vectors": { "size": dimension, "distance": "Cosine" } });
        self.send(self.request(reqwest::Method::PUT, &path).json(&body))
            .await?;
        Ok(())
    }

    /// Fetch one page of points with vectors and payloads via
    /// `POST /collections/{name}/points/scroll`.
    ///
    /// A transport failure or non-success status is an error; exhaustion is
    /// only ever signaled by a `null` continuation cursor.
    pub async fn scroll_points(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<&Value>,
    ) -> Result<ScrollPage> {
        let path = format!("/collections/{}/points/scroll", collection);
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": true,
        });
        if let Some(offset) = offset {
            body["offset"] = offset.clone();
        }

        let bytes = self
            .send(self.request(reqwest::Method::POST, &path).json(&body))
            .await?;
        let envelope: ApiEnvelope<ScrollPage> = decode(&bytes)?;
        Ok(envelope.result)
    }

    /// Batched upsert via `PUT /collections/{name}/points`.
    pub async fn upsert_points(&self, collection: &str, points: &[PointRecord]) -> Result<()> {
        let path = format!("/collections/{}/points", collection);
        let body = json!({ "points": points });
        self.send(self.request(reqwest::Method::PUT, &path).json(&body))
            .await?;
        Ok(())
    }

    // --- Internal helpers ---

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>> {
        let response = request
            .send()
            .await
            .map_err(|e| VectorSyncError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(VectorSyncError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| VectorSyncError::Unreachable(e.to_string()))
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| VectorSyncError::InvalidInput(format!("Invalid cluster response: {}", e)))
}
