//! P-256 key material and the self-agreement root secret.

use crate::crypto::{CryptoError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdh;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Elliptic-curve key material for the mirroring engine.
///
/// Owns a NIST P-256 key pair and the root secret derived from it by
/// self-agreement: the standard ECDH primitive applied to the pair's own
/// private scalar and its own public point. The root secret is stable for the
/// lifetime of the key pair, never leaves the process, and is the sole input
/// key material for every keystream and tag derivation.
///
/// Deliberately not `Clone`; share one instance behind an `Arc`.
pub struct KeyMaterial {
    secret: SecretKey,
    root: RootSecret,
}

/// The 32-byte self-agreement secret, zeroized on drop.
struct RootSecret([u8; 32]);

impl Drop for RootSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl KeyMaterial {
    /// Generate fresh key material from a random P-256 scalar.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut rand::thread_rng());
        Self::from_secret(secret)
    }

    /// Load key material from a raw 32-byte private scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("Invalid P-256 scalar: {}", e)))?;
        Ok(Self::from_secret(secret))
    }

    /// Load key material from a base64-encoded 32-byte private scalar.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("Invalid base64 key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        let mut root = [0u8; 32];
        root.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Self {
            secret,
            root: RootSecret(root),
        }
    }

    /// The self-agreement root secret. Only the vector crypto reads it.
    pub(crate) fn root_secret(&self) -> &[u8; 32] {
        &self.root.0
    }

    /// Public key as an uncompressed SEC1 point, base64-encoded.
    pub fn public_key_base64(&self) -> String {
        let point = self.secret.public_key().to_encoded_point(false);
        STANDARD.encode(point.as_bytes())
    }

    /// Truncated fingerprint: first 8 bytes of SHA-256 over the SEC1 point,
    /// lowercase hex.
    pub fn fingerprint(&self) -> String {
        let point = self.secret.public_key().to_encoded_point(false);
        hex::encode(&Sha256::digest(point.as_bytes())[..8])
    }

    /// Private scalar, base64-encoded. For the keygen operation only; never
    /// logged or transmitted.
    pub fn secret_key_base64(&self) -> String {
        STANDARD.encode(self.secret.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_ne!(a.public_key_base64(), b.public_key_base64());
        assert_ne!(a.root_secret(), b.root_secret());
    }

    #[test]
    fn root_secret_is_deterministic_for_a_scalar() {
        let keys = KeyMaterial::generate();
        let encoded = keys.secret_key_base64();

        let reloaded = KeyMaterial::from_base64(&encoded).unwrap();
        assert_eq!(keys.root_secret(), reloaded.root_secret());
        assert_eq!(keys.public_key_base64(), reloaded.public_key_base64());
        assert_eq!(keys.fingerprint(), reloaded.fingerprint());
    }

    #[test]
    fn public_key_is_uncompressed_sec1() {
        let keys = KeyMaterial::generate();
        let bytes = STANDARD.decode(keys.public_key_base64()).unwrap();
        // 0x04 prefix plus two 32-byte coordinates
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let keys = KeyMaterial::generate();
        let fp = keys.fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn invalid_base64_rejected() {
        assert!(KeyMaterial::from_base64("not base64!!!").is_err());
    }

    #[test]
    fn wrong_scalar_length_rejected() {
        assert!(KeyMaterial::from_bytes(&[0xAAu8; 16]).is_err());
    }

    #[test]
    fn zero_scalar_rejected() {
        assert!(KeyMaterial::from_bytes(&[0u8; 32]).is_err());
    }
}
