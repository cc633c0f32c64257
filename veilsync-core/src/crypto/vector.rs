//! Deterministic keystream encryption and integrity tags for float vectors.
//!
//! Every element index gets its own 4-byte HKDF-SHA256 keystream chunk,
//! derived from the root secret (ikm), the point id (salt), and the element
//! index under a fixed context label (info). The chunk is XORed with the
//! element's little-endian IEEE-754 bytes; XOR is self-inverse, so decryption
//! is the identical walk. Encryption is fully deterministic for a fixed
//! (key, point id, index, value) tuple: re-running a sync rewrites identical
//! ciphertext, which keeps mirroring idempotent, but repeated plaintexts under
//! the same id are observable to anyone comparing snapshots.

use crate::crypto::KeyMaterial;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Context label for per-element keystream derivation.
const KEYSTREAM_INFO: &[u8] = b"veilsync-keystream-v1";
/// Context label for per-point HMAC key derivation.
const HMAC_KEY_INFO: &[u8] = b"veilsync-hmac-key-v1";

/// Encrypt a vector element-wise with the point's keystream.
///
/// Never fails for well-formed input; non-finite floats pass through as raw
/// bits like any other element.
pub fn encrypt_vector(keys: &KeyMaterial, vector: &[f32], point_id: &str) -> Vec<f32> {
    let hk = Hkdf::<Sha256>::new(Some(point_id.as_bytes()), keys.root_secret());
    vector
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let chunk = keystream_chunk(&hk, index);
            let mut bytes = value.to_le_bytes();
            for (b, k) in bytes.iter_mut().zip(chunk) {
                *b ^= k;
            }
            f32::from_le_bytes(bytes)
        })
        .collect()
}

/// Decrypt a vector encrypted with [`encrypt_vector`] under the same point id.
pub fn decrypt_vector(keys: &KeyMaterial, vector: &[f32], point_id: &str) -> Vec<f32> {
    // XOR is self-inverse: the same walk recovers the plaintext.
    encrypt_vector(keys, vector, point_id)
}

/// HMAC-SHA256 integrity tag over the vector's plaintext bytes, keyed by a
/// per-point key derived from the root secret. Lowercase hex.
pub fn compute_vector_hmac(keys: &KeyMaterial, vector: &[f32], point_id: &str) -> String {
    let mut mac = vector_mac(keys, point_id);
    for value in vector {
        mac.update(&value.to_le_bytes());
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the tag for `vector` under `point_id` and compare it to `tag`
/// in constant time.
pub fn verify_vector_hmac(keys: &KeyMaterial, vector: &[f32], point_id: &str, tag: &str) -> bool {
    let Ok(expected) = hex::decode(tag.trim()) else {
        return false;
    };
    let mut mac = vector_mac(keys, point_id);
    for value in vector {
        mac.update(&value.to_le_bytes());
    }
    mac.verify_slice(&expected).is_ok()
}

fn keystream_chunk(hk: &Hkdf<Sha256>, index: usize) -> [u8; 4] {
    let mut info = [0u8; KEYSTREAM_INFO.len() + 4];
    info[..KEYSTREAM_INFO.len()].copy_from_slice(KEYSTREAM_INFO);
    info[KEYSTREAM_INFO.len()..].copy_from_slice(&(index as u32).to_le_bytes());

    let mut chunk = [0u8; 4];
    // A 4-byte output is always within the HKDF-SHA256 expand limit.
    hk.expand(&info, &mut chunk)
        .expect("HKDF expand of 4 bytes cannot fail");
    chunk
}

fn vector_mac(keys: &KeyMaterial, point_id: &str) -> HmacSha256 {
    let hk = Hkdf::<Sha256>::new(Some(point_id.as_bytes()), keys.root_secret());
    let mut key = [0u8; 32];
    // A 32-byte output is always within the HKDF-SHA256 expand limit.
    hk.expand(HMAC_KEY_INFO, &mut key)
        .expect("HKDF expand of 32 bytes cannot fail");
    let mac = HmacSha256::new_from_slice(&key).expect("HMAC-SHA256 accepts any key length");
    key.zeroize();
    mac
}
