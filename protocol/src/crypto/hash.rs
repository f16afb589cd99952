//! # Hashing Utilities
//!
//! SHA-256 is the only hash function in powchain. Block identities, the
//! proof-of-work puzzle, and the store keys are all SHA-256 digests.
//!
//! Outputs are never truncated: the proof-of-work target is expressed
//! against the full 256-bit value.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Block hashes are stored and compared as `[u8; 32]`, so this returns a
/// fixed-size array rather than a `Vec<u8>`.
///
/// # Example
///
/// ```
/// use powchain_protocol::crypto::sha256_array;
///
/// let hash = sha256_array(b"powchain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenating them first.
///
/// Feeding the parts sequentially into one hasher gives the same digest
/// as hashing their concatenation.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
