//! Sync engine: orchestrates collection creation, scrolling, encryption,
//! batched writes, and integrity verification.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::crypto::{self, KeyMaterial};
use crate::sync::client::ClusterClient;
use crate::sync::config::SyncSettings;
use crate::sync::diff::{diff_collections, DiffReport};
use crate::sync::models::{
    sanitize_payload, ClusterStatus, CollectionStats, CollectionSummary, EndpointHealth, KeyInfo,
    PointRecord, SyncOutcome, SyncReport, VerifyOutcome, VerifyReport,
};
use crate::sync::stats::{collect_stats, probe};
use crate::{Result, VectorSyncError};

/// Points per scroll page and per upsert batch.
pub const SYNC_BATCH_SIZE: usize = 100;
/// Dimension used when creating a cloud collection whose local dimension is
/// unknown.
pub const DEFAULT_DIMENSION: u64 = 1536;
/// Payload field carrying the integrity tag.
pub const HMAC_PAYLOAD_FIELD: &str = "vector_hmac";

/// Collections whose names start with this prefix are mirrored by default.
const SYNC_PREFIX: &str = "agent_";
/// Well-known collections mirrored by default regardless of prefix.
const WELL_KNOWN_COLLECTIONS: &[&str] = &["memories", "conversations", "knowledge", "personality"];

/// Orchestrates the mirroring lifecycle between the local and cloud clusters.
///
/// Collections are processed one at a time, and pages within a collection one
/// at a time; partial failures are isolated per collection and reported in
/// the structured results rather than thrown.
pub struct SyncEngine {
    local: ClusterClient,
    cloud: Option<ClusterClient>,
    keys: Option<Arc<KeyMaterial>>,
}

impl SyncEngine {
    /// Build an engine from explicit parts.
    pub fn new(
        local: ClusterClient,
        cloud: Option<ClusterClient>,
        keys: Option<Arc<KeyMaterial>>,
    ) -> Self {
        Self { local, cloud, keys }
    }

    /// Build an engine from settings.
    ///
    /// Cloud access stays unconfigured unless the endpoint, API key, and
    /// enable flag are all present; key material comes from `sync_key` when
    /// set. An invalid key is a fatal configuration error.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        let local = ClusterClient::new(&settings.local_url, None)?;
        let cloud = match settings.require_cloud() {
            Ok((url, key)) => Some(ClusterClient::new(url, Some(key))?),
            Err(_) => None,
        };
        let keys = match settings.sync_key.as_deref() {
            Some(encoded) => Some(Arc::new(KeyMaterial::from_base64(encoded)?)),
            None => None,
        };
        Ok(Self::new(local, cloud, keys))
    }

    fn cloud(&self) -> Result<&ClusterClient> {
        self.cloud.as_ref().ok_or_else(|| {
            VectorSyncError::NotConfigured(
                "cloud endpoint, API key, and enable flag must all be set".to_string(),
            )
        })
    }

    fn keys(&self) -> Result<&Arc<KeyMaterial>> {
        self.keys.as_ref().ok_or_else(|| {
            VectorSyncError::NotConfigured("sync key material is not configured".to_string())
        })
    }

    /// Probe both endpoints independently. Never errors: an unreachable
    /// endpoint reports offline, an unconfigured cloud reports offline and
    /// unconfigured.
    pub async fn status(&self) -> ClusterStatus {
        let local = probe(&self.local).await;
        let (cloud_configured, cloud) = match &self.cloud {
            Some(client) => (true, probe(client).await),
            None => (false, EndpointHealth::default()),
        };
        ClusterStatus {
            local,
            cloud_configured,
            cloud,
        }
    }

    /// Diff collections between the two clusters.
    pub async fn diff(&self) -> Result<DiffReport> {
        let cloud = self.cloud()?;
        let local_stats = collect_stats(&self.local).await?;
        let cloud_stats = collect_stats(cloud).await?;
        Ok(DiffReport::from_entries(diff_collections(
            &local_stats,
            &cloud_stats,
        )))
    }

    /// List cloud collections with their point counts and dimensions.
    pub async fn list_cloud_collections(&self) -> Result<Vec<CollectionSummary>> {
        let cloud = self.cloud()?;
        let stats = collect_stats(cloud).await?;
        Ok(stats
            .into_iter()
            .map(|(name, s)| CollectionSummary {
                name,
                points: s.points,
                dimension: s.dimension,
            })
            .collect())
    }

    /// Public parameters of the active key pair.
    pub fn key_info(&self) -> Result<KeyInfo> {
        let keys = self.keys()?;
        Ok(KeyInfo {
            curve: "P-256".to_string(),
            mode: "XOR keystream (HKDF-SHA256 per element), HMAC-SHA256 integrity tags"
                .to_string(),
            fingerprint: keys.fingerprint(),
            public_key: keys.public_key_base64(),
        })
    }

    /// Mirror local collections to the cloud cluster.
    ///
    /// `target` selects a single collection by case-insensitive name;
    /// without it, every local collection matching the mirroring policy is
    /// processed. A collection-level failure is recorded in that
    /// collection's outcome and processing continues with its siblings.
    pub async fn sync(&self, target: Option<&str>) -> Result<SyncReport> {
        let cloud = self.cloud()?;
        let keys = Arc::clone(self.keys()?);

        let local_stats = collect_stats(&self.local).await?;
        let mut outcomes = Vec::new();
        for (name, stats) in select_collections(&local_stats, target) {
            info!("Syncing collection {} ({} points)", name, stats.points);
            let outcome = match self.sync_collection(cloud, &keys, name, stats).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("Collection {} failed: {}", name, err);
                    SyncOutcome::whole_collection_failed(name, stats.points, err.to_string())
                }
            };
            outcomes.push(outcome);
        }
        Ok(SyncReport::from_outcomes(outcomes))
    }

    async fn sync_collection(
        &self,
        cloud: &ClusterClient,
        keys: &KeyMaterial,
        name: &str,
        stats: CollectionStats,
    ) -> Result<SyncOutcome> {
        self.ensure_cloud_collection(cloud, name, stats.dimension)
            .await?;

        let mut outcome = SyncOutcome::new(name);
        if stats.points == 0 {
            return Ok(outcome);
        }

        let mut cursor: Option<Value> = None;
        loop {
            let page = self
                .local
                .scroll_points(name, SYNC_BATCH_SIZE, cursor.as_ref())
                .await?;

            let mut batch = Vec::with_capacity(page.points.len());
            for point in page.points {
                // Points without a vector are skipped, counted neither way.
                let Some(vector) = point.vector else { continue };
                outcome.points += 1;

                let id = point.id.to_string();
                let encrypted = crypto::encrypt_vector(keys, &vector, &id);
                let tag = crypto::compute_vector_hmac(keys, &vector, &id);

                let mut payload = sanitize_payload(point.payload);
                payload.insert(HMAC_PAYLOAD_FIELD.to_string(), Value::String(tag));

                batch.push(PointRecord {
                    id: point.id,
                    vector: Some(encrypted),
                    payload: Some(payload),
                });
            }

            if !batch.is_empty() {
                match cloud.upsert_points(name, &batch).await {
                    Ok(()) => outcome.synced += batch.len() as u64,
                    Err(err) => {
                        // Failed batches count as failed points; no retry.
                        warn!(
                            "Batch write of {} points to {} failed: {}",
                            batch.len(),
                            name,
                            err
                        );
                        outcome.failed += batch.len() as u64;
                    }
                }
            }

            match page.next_page_offset {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(outcome)
    }

    async fn ensure_cloud_collection(
        &self,
        cloud: &ClusterClient,
        name: &str,
        dimension: u64,
    ) -> Result<()> {
        if cloud.collection_exists(name).await? {
            return Ok(());
        }
        let size = if dimension == 0 {
            DEFAULT_DIMENSION
        } else {
            dimension
        };
        info!("Creating cloud collection {} (dimension {})", name, size);
        cloud.create_collection(name, size).await
    }

    /// Verify integrity tags of cloud-stored points.
    ///
    /// Targets resolve from cloud stats with the same policy as sync. Each
    /// point is classified intact, corrupted, or missing-tag; a
    /// collection-level failure yields a zero-valued outcome with the error
    /// message.
    pub async fn verify(&self, target: Option<&str>) -> Result<VerifyReport> {
        let cloud = self.cloud()?;
        let keys = Arc::clone(self.keys()?);

        let cloud_stats = collect_stats(cloud).await?;
        let mut outcomes = Vec::new();
        for (name, stats) in select_collections(&cloud_stats, target) {
            info!("Verifying collection {} ({} points)", name, stats.points);
            let outcome = match self.verify_collection(cloud, &keys, name, stats).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("Verification of {} failed: {}", name, err);
                    VerifyOutcome::whole_collection_failed(name, err.to_string())
                }
            };
            outcomes.push(outcome);
        }
        Ok(VerifyReport::from_outcomes(outcomes))
    }

    async fn verify_collection(
        &self,
        cloud: &ClusterClient,
        keys: &KeyMaterial,
        name: &str,
        stats: CollectionStats,
    ) -> Result<VerifyOutcome> {
        let mut outcome = VerifyOutcome::new(name);
        if stats.points == 0 {
            return Ok(outcome);
        }

        let mut cursor: Option<Value> = None;
        loop {
            let page = cloud
                .scroll_points(name, SYNC_BATCH_SIZE, cursor.as_ref())
                .await?;

            for point in page.points {
                outcome.points += 1;

                let id = point.id.to_string();
                let tag = point
                    .payload
                    .as_ref()
                    .and_then(|p| p.get(HMAC_PAYLOAD_FIELD))
                    .and_then(Value::as_str);
                let Some(tag) = tag else {
                    outcome.missing += 1;
                    continue;
                };

                // The stored vector is ciphertext; recover the plaintext
                // before recomputing the tag.
                let intact = point
                    .vector
                    .as_deref()
                    .map(|stored| {
                        let plaintext = crypto::decrypt_vector(keys, stored, &id);
                        crypto::verify_vector_hmac(keys, &plaintext, &id, tag)
                    })
                    .unwrap_or(false);

                if intact {
                    outcome.intact += 1;
                } else {
                    outcome.corrupted += 1;
                }
            }

            match page.next_page_offset {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(outcome)
    }
}

/// Resolve which collections an operation processes: the single named
/// collection (case-insensitive), or every collection matching the mirroring
/// policy (name prefix or well-known name).
fn select_collections<'a>(
    stats: &'a BTreeMap<String, CollectionStats>,
    target: Option<&str>,
) -> Vec<(&'a str, CollectionStats)> {
    stats
        .iter()
        .filter(|(name, _)| match target {
            Some(wanted) => name.eq_ignore_ascii_case(wanted),
            None => {
                name.starts_with(SYNC_PREFIX) || WELL_KNOWN_COLLECTIONS.contains(&name.as_str())
            }
        })
        .map(|(name, s)| (name.as_str(), *s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_map(names: &[(&str, u64)]) -> BTreeMap<String, CollectionStats> {
        names
            .iter()
            .map(|(name, points)| {
                (
                    name.to_string(),
                    CollectionStats {
                        points: *points,
                        dimension: 8,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn named_target_matches_case_insensitively() {
        let stats = stats_map(&[("Memories", 10), ("other", 5)]);

        let selected = select_collections(&stats, Some("memories"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, "Memories");
    }

    #[test]
    fn unknown_target_selects_nothing() {
        let stats = stats_map(&[("memories", 10)]);
        assert!(select_collections(&stats, Some("nope")).is_empty());
    }

    #[test]
    fn default_selection_uses_prefix_and_allow_list() {
        let stats = stats_map(&[
            ("agent_cache", 1),
            ("agent_notes", 2),
            ("memories", 3),
            ("scratch", 4),
            ("telemetry", 5),
        ]);

        let selected: Vec<&str> = select_collections(&stats, None)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(selected, vec!["agent_cache", "agent_notes", "memories"]);
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        // Only the exact prefix is mirrored by default; targeting by name
        // remains case-insensitive.
        let stats = stats_map(&[("Agent_notes", 1)]);
        assert!(select_collections(&stats, None).is_empty());
        assert_eq!(select_collections(&stats, Some("agent_NOTES")).len(), 1);
    }

    #[test]
    fn engine_without_cloud_rejects_cloud_operations() {
        let local = ClusterClient::new("http://localhost:6333", None).unwrap();
        let engine = SyncEngine::new(local, None, None);

        assert!(matches!(
            engine.cloud(),
            Err(VectorSyncError::NotConfigured(_))
        ));
        assert!(matches!(
            engine.key_info(),
            Err(VectorSyncError::NotConfigured(_))
        ));
    }

    #[test]
    fn engine_from_settings_rejects_invalid_key() {
        let settings = SyncSettings {
            sync_key: Some("!!!".to_string()),
            ..SyncSettings::default()
        };
        assert!(matches!(
            SyncEngine::from_settings(&settings),
            Err(VectorSyncError::Crypto(_))
        ));
    }

    #[test]
    fn key_info_reports_curve_and_fingerprint() {
        let local = ClusterClient::new("http://localhost:6333", None).unwrap();
        let keys = Arc::new(KeyMaterial::generate());
        let engine = SyncEngine::new(local, None, Some(Arc::clone(&keys)));

        let info = engine.key_info().unwrap();
        assert_eq!(info.curve, "P-256");
        assert_eq!(info.fingerprint, keys.fingerprint());
        assert_eq!(info.public_key, keys.public_key_base64());
    }
}
