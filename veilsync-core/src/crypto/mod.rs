//! Cryptographic primitives for vector mirroring.
//!
//! This module provides:
//! - P-256 key material with an ECDH self-agreement root secret
//! - Deterministic HKDF-SHA256 keystream encryption of float vectors
//! - HMAC-SHA256 vector integrity tags

pub mod material;
pub mod vector;

pub use material::KeyMaterial;
pub use vector::{compute_vector_hmac, decrypt_vector, encrypt_vector, verify_vector_hmac};

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Key derivation failed: {0}")]
    KdfFailed(String),
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;
