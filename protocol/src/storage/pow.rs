//! # Proof-of-Work
//!
//! A block is sealed by searching for a nonce whose header hash, read as a
//! big-endian unsigned integer, is strictly below `2^(256 - difficulty)`.
//!
//! The target is kept as a 32-byte big-endian array. Byte arrays compare
//! lexicographically, which for equal-length big-endian values is exactly
//! numeric order, so no big-integer type is needed. Being below
//! `2^(256 - d)` is the same as having at least `d` leading zero bits.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{Difficulty, HASH_BITS, HASH_OUTPUT_LENGTH};

use super::block::BlockHash;
use super::codec;

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Upper bound (exclusive) a block hash must stay below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target([u8; HASH_OUTPUT_LENGTH]);

impl Target {
    /// `2^(256 - difficulty)` as a big-endian 32-byte value.
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        // Bit position counted from the least significant end. Always in
        // [1, 255] because `Difficulty` is validated.
        let bit = (HASH_BITS - difficulty.bits()) as usize;
        let mut target = [0u8; HASH_OUTPUT_LENGTH];
        target[HASH_OUTPUT_LENGTH - 1 - bit / 8] = 1 << (bit % 8);
        Self(target)
    }

    /// `true` when `hash < target`.
    pub fn is_met_by(&self, hash: &BlockHash) -> bool {
        hash < &self.0
    }

    /// Big-endian bytes of the target.
    pub fn as_bytes(&self) -> &[u8; HASH_OUTPUT_LENGTH] {
        &self.0
    }
}

/// Number of leading zero bits in a hash.
pub fn leading_zero_bits(hash: &BlockHash) -> u32 {
    let mut total = 0;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Check a stored hash against a raw difficulty value.
///
/// Out-of-range difficulties never validate.
pub fn meets_difficulty(hash: &BlockHash, difficulty_bits: u32) -> bool {
    match Difficulty::new(difficulty_bits) {
        Ok(d) => Target::from_difficulty(d).is_met_by(hash),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Result of a successful proof-of-work search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealOutcome {
    /// The winning nonce.
    pub nonce: u64,
    /// Header hash produced with `nonce`.
    pub hash: BlockHash,
    /// Number of hashes computed, including the winning one.
    pub attempts: u64,
    /// Wall-clock time spent searching.
    pub elapsed: Duration,
}

/// Search for the first nonce, starting at zero, that satisfies the target.
///
/// The search runs until it succeeds. Hash outputs are uniformly
/// distributed, so at difficulty `d` it takes about `2^d` attempts. The
/// `u64` nonce range is only a defensive ceiling: the counter wraps
/// rather than failing, and exhausting it is not a reachable state for any
/// difficulty that finishes in practice.
pub fn seal(
    timestamp: i64,
    data: &[u8],
    prev_hash: Option<&BlockHash>,
    difficulty: Difficulty,
) -> SealOutcome {
    let target = Target::from_difficulty(difficulty);
    let prefix = codec::encode_prefix(timestamp, data, prev_hash, difficulty.bits());
    let started = Instant::now();

    let mut nonce: u64 = 0;
    let mut attempts: u64 = 0;
    loop {
        let hash = codec::hash_with_nonce(&prefix, nonce);
        attempts = attempts.wrapping_add(1);
        if target.is_met_by(&hash) {
            let elapsed = started.elapsed();
            debug!(
                nonce,
                attempts,
                difficulty = difficulty.bits(),
                elapsed_ms = elapsed.as_millis() as u64,
                hash = %hex::encode(hash),
                "proof-of-work found"
            );
            return SealOutcome {
                nonce,
                hash,
                attempts,
                elapsed,
            };
        }
        nonce = nonce.wrapping_add(1);
    }
}
