//! # Block Structure
//!
//! A block is one record of the chain: an opaque payload, a link to the
//! block before it, and a proof-of-work seal over both.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  timestamp: i64          (Unix seconds)      │
//! │  data: Vec<u8>           (opaque payload)    │
//! │  prev_hash: Option<[u8; 32]>  (None=genesis) │
//! │  hash: [u8; 32]          (SHA-256 of header) │
//! │  nonce: u64              (proof-of-work)     │
//! │  difficulty: u32         (leading zero bits) │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Blocks are immutable after construction. Both constructors seal the
//! block before returning it, so there is no such thing as an unsealed
//! `Block` value.
//!
//! ## Storage Encoding
//!
//! Blocks are stored with bincode (fixed-width integers, trailing bytes
//! rejected). The encoding carries all six fields, so a stored block can
//! be decoded and its hash re-derived bit-for-bit.

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Difficulty, GENESIS_DATA};

use super::codec;
use super::pow;

/// A block identifier: the SHA-256 of its encoded header.
pub type BlockHash = [u8; 32];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Stored bytes that do not parse into a block or a tip hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bincode payload is truncated or malformed.
    #[error("malformed block encoding: {0}")]
    Bincode(String),

    /// The tip sentinel holds a value that is not a 32-byte hash.
    #[error("tip value has {0} bytes, expected 32")]
    TipLength(usize),
}

/// A decoded block whose contents contradict its own seal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    /// The stored hash is not the hash of the stored fields.
    #[error("hash mismatch: stored={stored}, computed={computed}")]
    HashMismatch {
        /// Hex of the hash carried by the block.
        stored: String,
        /// Hex of the hash re-derived from the fields.
        computed: String,
    },

    /// Difficulty outside the accepted range.
    #[error("invalid difficulty {0}")]
    InvalidDifficulty(u32),

    /// The hash is not below the target for the block's difficulty.
    #[error("hash does not satisfy difficulty {0}")]
    InsufficientWork(u32),
}

fn storage_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A sealed chain record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unix timestamp (seconds) at construction.
    pub timestamp: i64,
    /// Caller-supplied payload.
    pub data: Vec<u8>,
    /// Hash of the previous tip. `None` only for genesis.
    pub prev_hash: Option<BlockHash>,
    /// Header hash found by the proof-of-work search.
    pub hash: BlockHash,
    /// Nonce that produced `hash`.
    pub nonce: u64,
    /// Leading zero bits required of `hash`.
    pub difficulty: u32,
}

impl Block {
    /// Mine the genesis block.
    pub fn genesis(difficulty: Difficulty) -> Self {
        Self::with_timestamp(now(), GENESIS_DATA.to_vec(), None, difficulty)
    }

    /// Mine a block on top of `prev_hash`.
    pub fn new(data: Vec<u8>, prev_hash: BlockHash, difficulty: Difficulty) -> Self {
        Self::with_timestamp(now(), data, Some(prev_hash), difficulty)
    }

    /// Mine a block with an explicit timestamp.
    ///
    /// Sealing is deterministic, so the same inputs always yield the same
    /// nonce and hash.
    pub fn with_timestamp(
        timestamp: i64,
        data: Vec<u8>,
        prev_hash: Option<BlockHash>,
        difficulty: Difficulty,
    ) -> Self {
        let sealed = pow::seal(timestamp, &data, prev_hash.as_ref(), difficulty);
        Block {
            timestamp,
            data,
            prev_hash,
            hash: sealed.hash,
            nonce: sealed.nonce,
            difficulty: difficulty.bits(),
        }
    }

    /// Re-derive the hash from the stored fields.
    pub fn compute_hash(&self) -> BlockHash {
        codec::header_hash(
            self.timestamp,
            &self.data,
            self.prev_hash.as_ref(),
            self.difficulty,
            self.nonce,
        )
    }

    /// Check the block against its own seal.
    ///
    /// 1. The difficulty is within range.
    /// 2. The stored hash matches the recomputed hash.
    /// 3. The hash satisfies the difficulty.
    ///
    /// Chain linkage is not checked here; that needs the neighbouring block.
    pub fn verify(&self) -> Result<(), BlockError> {
        if Difficulty::new(self.difficulty).is_err() {
            return Err(BlockError::InvalidDifficulty(self.difficulty));
        }

        let computed = self.compute_hash();
        if self.hash != computed {
            return Err(BlockError::HashMismatch {
                stored: hex::encode(self.hash),
                computed: hex::encode(computed),
            });
        }

        if !pow::meets_difficulty(&self.hash, self.difficulty) {
            return Err(BlockError::InsufficientWork(self.difficulty));
        }

        Ok(())
    }

    /// Serialize for storage.
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        storage_options()
            .serialize(self)
            .map_err(|e| DecodeError::Bincode(e.to_string()))
    }

    /// Parse a stored block. Truncated or padded buffers are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        storage_options()
            .deserialize(bytes)
            .map_err(|e| DecodeError::Bincode(e.to_string()))
    }

    /// `true` for the block with no predecessor.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }

    /// Return the block hash as a hex string.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Return the previous hash as a hex string; empty for genesis.
    pub fn prev_hash_hex(&self) -> String {
        self.prev_hash.map(hex::encode).unwrap_or_default()
    }

    /// The payload as text, with invalid UTF-8 replaced.
    pub fn data_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DIFFICULTY: u32 = 8;

    fn difficulty() -> Difficulty {
        Difficulty::new(TEST_DIFFICULTY).unwrap()
    }

    #[test]
    fn genesis_block_properties() {
        let genesis = Block::genesis(difficulty());
        assert!(genesis.is_genesis());
        assert_eq!(genesis.prev_hash, None);
        assert_eq!(genesis.data, GENESIS_DATA);
        assert_eq!(genesis.difficulty, TEST_DIFFICULTY);
        assert!(genesis.timestamp > 0);
        assert!(genesis.verify().is_ok());
    }

    #[test]
    fn new_block_links_to_parent() {
        let genesis = Block::genesis(difficulty());
        let block = Block::new(b"A".to_vec(), genesis.hash, difficulty());

        assert!(!block.is_genesis());
        assert_eq!(block.prev_hash, Some(genesis.hash));
        assert_eq!(block.prev_hash_hex(), genesis.hash_hex());
        assert!(block.verify().is_ok());
    }

    #[test]
    fn hash_is_rederivable_from_fields() {
        let block = Block::with_timestamp(1_700_000_000, b"payload".to_vec(), None, difficulty());
        let recomputed = codec::hash(&codec::encode_header(
            block.timestamp,
            &block.data,
            block.prev_hash.as_ref(),
            block.difficulty,
            block.nonce,
        ));
        assert_eq!(recomputed, block.hash);
        assert_eq!(block.compute_hash(), block.hash);
    }

    #[test]
    fn hash_meets_difficulty() {
        let block = Block::with_timestamp(5, b"x".to_vec(), Some([1u8; 32]), difficulty());
        assert!(pow::leading_zero_bits(&block.hash) >= TEST_DIFFICULTY);
    }

    #[test]
    fn tampered_data_fails_verification() {
        let mut block = Block::with_timestamp(5, b"honest".to_vec(), None, difficulty());
        block.data = b"forged".to_vec();
        assert!(matches!(
            block.verify(),
            Err(BlockError::HashMismatch { .. })
        ));
    }

    #[test]
    fn tampered_nonce_fails_verification() {
        let mut block = Block::with_timestamp(5, b"honest".to_vec(), None, difficulty());
        block.nonce = block.nonce.wrapping_add(1);
        assert!(block.verify().is_err());
    }

    #[test]
    fn rehashed_forgery_lacks_work() {
        // Consistent hash but no search: almost surely above the target.
        let mut block = Block::with_timestamp(5, b"honest".to_vec(), None, difficulty());
        block.data = b"forged".to_vec();
        let mut nonce = 0u64;
        loop {
            block.nonce = nonce;
            block.hash = block.compute_hash();
            if !pow::meets_difficulty(&block.hash, TEST_DIFFICULTY) {
                break;
            }
            nonce += 1;
        }
        assert_eq!(
            block.verify(),
            Err(BlockError::InsufficientWork(TEST_DIFFICULTY))
        );
    }

    #[test]
    fn out_of_range_difficulty_fails_verification() {
        let mut block = Block::with_timestamp(5, b"x".to_vec(), None, difficulty());
        block.difficulty = 300;
        assert_eq!(block.verify(), Err(BlockError::InvalidDifficulty(300)));
    }

    #[test]
    fn storage_encoding_roundtrip() {
        let genesis = Block::genesis(difficulty());
        let block = Block::new(b"roundtrip".to_vec(), genesis.hash, difficulty());
        for b in [genesis, block] {
            let bytes = b.encode().unwrap();
            let back = Block::decode(&bytes).unwrap();
            assert_eq!(back, b);
            assert!(back.verify().is_ok());
        }
    }

    #[test]
    fn truncated_buffer_is_a_decode_error() {
        let block = Block::with_timestamp(5, b"truncate me".to_vec(), Some([2u8; 32]), difficulty());
        let bytes = block.encode().unwrap();
        for len in [0, 1, 8, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(Block::decode(&bytes[..len]), Err(DecodeError::Bincode(_))),
                "prefix of length {len} decoded"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_a_decode_error() {
        let block = Block::with_timestamp(5, b"x".to_vec(), None, difficulty());
        let mut bytes = block.encode().unwrap();
        bytes.push(0);
        assert!(Block::decode(&bytes).is_err());
    }

    #[test]
    fn data_lossy_renders_text() {
        let block = Block::with_timestamp(5, b"hello".to_vec(), None, difficulty());
        assert_eq!(block.data_lossy(), "hello");
    }
}
