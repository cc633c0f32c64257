//! Endpoint liveness probe and per-collection stats collection.

use std::collections::BTreeMap;
use tracing::warn;

use crate::sync::client::ClusterClient;
use crate::sync::models::{CollectionStats, EndpointHealth};
use crate::Result;

/// Best-effort liveness check: one collection-listing read.
///
/// Transport failures and error statuses degrade to offline; this never
/// errors.
pub async fn probe(client: &ClusterClient) -> EndpointHealth {
    match client.list_collections().await {
        Ok(collections) => EndpointHealth {
            online: true,
            collections: collections.len() as u64,
        },
        Err(_) => EndpointHealth {
            online: false,
            collections: 0,
        },
    }
}

/// Collect point count and vector dimension for every collection on a
/// cluster, keyed by name.
///
/// A listing failure propagates: the cluster is unreachable and no baseline
/// can be established. A failure on one collection's detail fetch records
/// `(0, 0)` for that collection and the scan continues; partial information
/// beats total failure.
pub async fn collect_stats(client: &ClusterClient) -> Result<BTreeMap<String, CollectionStats>> {
    let names = client.list_collections().await?;

    let mut stats = BTreeMap::new();
    for name in names {
        let detail = match client.collection_stats(&name).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!("Stats fetch failed for collection {}: {}", name, err);
                CollectionStats::default()
            }
        };
        stats.insert(name, detail);
    }
    Ok(stats)
}
