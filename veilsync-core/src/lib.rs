//! VeilSync Core Library
//!
//! Mirrors vector-database collections from a local cluster to a cloud
//! cluster, encrypting every vector before it leaves the process and tagging
//! it for later integrity verification. The cloud never holds plaintext
//! vectors long-term.

pub mod crypto;
pub mod sync;

pub use crypto::{
    compute_vector_hmac, decrypt_vector, encrypt_vector, verify_vector_hmac, CryptoError,
    KeyMaterial,
};
pub use sync::client::ClusterClient;
pub use sync::config::SyncSettings;
pub use sync::diff::{diff_collections, DiffEntry, DiffReport, DiffStatus};
pub use sync::engine::SyncEngine;
pub use sync::models::{
    ClusterStatus, CollectionStats, CollectionSummary, EndpointHealth, KeyInfo, PointId,
    PointRecord, SyncOutcome, SyncReport, VerifyOutcome, VerifyReport,
};

use thiserror::Error;

/// Result type for mirroring operations
pub type Result<T> = std::result::Result<T, VectorSyncError>;

/// General error type for mirroring operations
#[derive(Error, Debug)]
pub enum VectorSyncError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Cloud sync not configured: {0}")]
    NotConfigured(String),

    #[error("Cluster unreachable: {0}")]
    Unreachable(String),

    #[error("Cluster returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
