//! Encrypted mirroring of vector collections to a cloud cluster.
//!
//! Implements the full mirroring lifecycle:
//! - Endpoint probing and per-collection stats collection
//! - Four-state collection diff (local_only / cloud_only / synced / diverged)
//! - Cursor-paginated scroll, per-vector encryption, batched upsert
//! - Integrity verification of cloud-stored vectors

pub mod client;
pub mod config;
pub mod diff;
pub mod engine;
pub mod models;
pub mod stats;

pub use client::ClusterClient;
pub use config::SyncSettings;
pub use diff::{diff_collections, DiffEntry, DiffReport, DiffStatus};
pub use engine::SyncEngine;
pub use models::{
    ClusterStatus, CollectionStats, CollectionSummary, EndpointHealth, KeyInfo, PointId,
    PointRecord, ScrollPage, SyncOutcome, SyncReport, VerifyOutcome, VerifyReport,
};
pub use stats::{collect_stats, probe};
