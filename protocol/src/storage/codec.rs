//! # Header Codec
//!
//! Deterministic byte encoding of the fields that a block hash commits to,
//! and the hash over that encoding.
//!
//! ## Layout
//!
//! ```text
//! timestamp    i64 LE          8 bytes
//! data_len     u64 LE          8 bytes
//! data         data_len bytes
//! prev_len     u64 LE          8 bytes   (0 for genesis, 32 otherwise)
//! prev_hash    prev_len bytes
//! difficulty   u32 LE          4 bytes
//! nonce        u64 LE          8 bytes
//! ```
//!
//! Both variable-length fields carry a length prefix, so two distinct
//! field tuples can never encode to the same bytes. The nonce is the last
//! field: everything before it is the "prefix", fixed for the whole
//! proof-of-work search.

use crate::crypto::hash::{sha256_array, sha256_multi};

use super::block::BlockHash;

/// Encode every header field except the nonce.
pub fn encode_prefix(
    timestamp: i64,
    data: &[u8],
    prev_hash: Option<&BlockHash>,
    difficulty: u32,
) -> Vec<u8> {
    let prev: &[u8] = prev_hash.map(|h| h.as_slice()).unwrap_or_default();

    let mut out = Vec::with_capacity(36 + data.len() + prev.len());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&(prev.len() as u64).to_le_bytes());
    out.extend_from_slice(prev);
    out.extend_from_slice(&difficulty.to_le_bytes());
    out
}

/// Encode the full header: `prefix || nonce`.
pub fn encode_header(
    timestamp: i64,
    data: &[u8],
    prev_hash: Option<&BlockHash>,
    difficulty: u32,
    nonce: u64,
) -> Vec<u8> {
    let mut out = encode_prefix(timestamp, data, prev_hash, difficulty);
    out.extend_from_slice(&nonce.to_le_bytes());
    out
}

/// SHA-256 over an encoded header.
pub fn hash(encoded: &[u8]) -> BlockHash {
    sha256_array(encoded)
}

/// Hash a prefix produced by [`encode_prefix`] with a candidate nonce.
///
/// Equal to `hash(encode_header(..))` for the same fields, without
/// re-encoding the prefix on every attempt.
pub fn hash_with_nonce(prefix: &[u8], nonce: u64) -> BlockHash {
    sha256_multi(&[prefix, &nonce.to_le_bytes()])
}

/// Encode and hash in one step.
pub fn header_hash(
    timestamp: i64,
    data: &[u8],
    prev_hash: Option<&BlockHash>,
    difficulty: u32,
    nonce: u64,
) -> BlockHash {
    hash(&encode_header(timestamp, data, prev_hash, difficulty, nonce))
}
