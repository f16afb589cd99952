//! # Chain Management
//!
//! `Chain` owns a [`ChainStore`] and the cached tip hash. It is the only
//! component that creates blocks: genesis once, when a store is first
//! initialized, and one block per `append` afterwards.
//!
//! ## Append Pipeline
//!
//! ```text
//! 1. READ    - take the current tip hash
//! 2. SEAL    - build a block on top of it and run the proof-of-work search
//! 3. COMMIT  - write block + new tip in one atomic batch
//! 4. ADVANCE - update the in-memory tip
//! ```
//!
//! ## Thread Safety
//!
//! A `Chain` is shared via `Arc` and all methods take `&self`. Appends are
//! serialized by an internal mutex held across all four steps, so two
//! callers can never mine on top of the same tip. Readers (`tip`, `iter`)
//! never touch that mutex; they only take the tip `RwLock` for the instant
//! it takes to copy 32 bytes, so a long proof-of-work search does not
//! block them.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, Difficulty};

use super::block::{Block, BlockError, BlockHash, DecodeError};
use super::db::{ChainStore, StoreError};
use super::iter::ChainIterator;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Everything that can go wrong creating, extending, or reading a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The store failed to read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Stored bytes do not parse.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid difficulty or a difficulty that conflicts with the store.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A reachable hash has no stored block. The store is corrupt.
    #[error("block {hash} not found in store")]
    NotFound {
        /// Hex of the missing hash.
        hash: String,
    },

    /// `load` was called on a store that holds no chain.
    #[error("store holds no chain; initialize it with an explicit difficulty first")]
    Uninitialized,

    /// A record is stored under a key that is not its own hash.
    #[error("block stored under {expected} has hash {found}")]
    BrokenLink {
        /// Hex of the key the record was reached through.
        expected: String,
        /// Hex of the hash the record carries.
        found: String,
    },

    /// A stored block fails its own seal check.
    #[error("invalid block {hash}: {source}")]
    InvalidBlock {
        /// Hex of the offending block's hash.
        hash: String,
        /// What the check found.
        #[source]
        source: BlockError,
    },
}

pub type ChainResult<T> = Result<T, ChainError>;

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// A persistent proof-of-work hash chain with a single logical writer.
pub struct Chain {
    /// Durable block records and tip sentinel.
    store: Arc<dyn ChainStore>,

    /// Fixed for the lifetime of the chain.
    difficulty: Difficulty,

    /// Cached copy of the durable tip. Equal to it after every completed
    /// append.
    tip: RwLock<BlockHash>,

    /// Held across read-tip / seal / commit.
    append_lock: Mutex<()>,
}

impl Chain {
    /// Open a chain on `store`, creating it if the store is empty.
    ///
    /// On an empty store this mines the genesis block and commits it
    /// together with the tip. On an initialized store it loads the tip and
    /// never mines again. The difficulty is validated before anything
    /// else happens, and must match the stored chain's difficulty.
    pub fn init(store: Arc<dyn ChainStore>, difficulty: u32) -> ChainResult<Self> {
        let difficulty = Difficulty::new(difficulty)?;

        let tip = match store.tip()? {
            Some(tip) => {
                let head = fetch(store.as_ref(), &tip)?;
                if head.difficulty != difficulty.bits() {
                    return Err(ConfigError::DifficultyMismatch {
                        stored: head.difficulty,
                        requested: difficulty.bits(),
                    }
                    .into());
                }
                info!(tip = %hex::encode(tip), %difficulty, "loaded existing chain");
                tip
            }
            None => {
                let genesis = Block::genesis(difficulty);
                store.put_block_and_advance_tip(&genesis.hash, &genesis.encode()?)?;
                info!(
                    hash = %genesis.hash_hex(),
                    nonce = genesis.nonce,
                    %difficulty,
                    "genesis block created"
                );
                genesis.hash
            }
        };

        Ok(Self::with_tip(store, difficulty, tip))
    }

    /// Open an already-initialized chain, adopting its stored difficulty.
    pub fn load(store: Arc<dyn ChainStore>) -> ChainResult<Self> {
        let tip = store.tip()?.ok_or(ChainError::Uninitialized)?;
        let head = fetch(store.as_ref(), &tip)?;
        let difficulty = Difficulty::new(head.difficulty)?;
        info!(tip = %hex::encode(tip), %difficulty, "loaded existing chain");
        Ok(Self::with_tip(store, difficulty, tip))
    }

    fn with_tip(store: Arc<dyn ChainStore>, difficulty: Difficulty, tip: BlockHash) -> Self {
        Self {
            store,
            difficulty,
            tip: RwLock::new(tip),
            append_lock: Mutex::new(()),
        }
    }

    /// Mine `data` into a new block on top of the current tip and persist
    /// it.
    ///
    /// On failure the chain is exactly as it was: the block and the tip
    /// update are committed together or not at all, and the cached tip is
    /// only advanced after a successful commit.
    pub fn append(&self, data: impl Into<Vec<u8>>) -> ChainResult<Block> {
        let _writer = self.append_lock.lock();

        let prev = *self.tip.read();
        let block = Block::new(data.into(), prev, self.difficulty);
        let encoded = block.encode()?;

        if let Err(e) = self.store.put_block_and_advance_tip(&block.hash, &encoded) {
            warn!(hash = %block.hash_hex(), error = %e, "failed to commit block");
            return Err(e.into());
        }
        *self.tip.write() = block.hash;

        info!(
            hash = %block.hash_hex(),
            prev = %hex::encode(prev),
            nonce = block.nonce,
            bytes = block.data.len(),
            "block appended"
        );
        Ok(block)
    }

    /// Hash of the newest block.
    pub fn tip(&self) -> BlockHash {
        *self.tip.read()
    }

    /// The chain's proof-of-work difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn ChainStore> {
        &self.store
    }

    /// Walk the chain from the current tip back to genesis.
    pub fn iter(&self) -> ChainIterator {
        ChainIterator::new(Arc::clone(&self.store), Some(self.tip()))
    }

    /// Re-check every stored block from tip to genesis.
    ///
    /// Each block must be stored under its own hash, carry a valid seal,
    /// and use the chain's difficulty. Returns the number of blocks.
    pub fn verify_chain(&self) -> ChainResult<usize> {
        let mut expected = self.tip();
        let mut count = 0usize;

        for block in self.iter() {
            let block = block?;
            if block.hash != expected {
                return Err(ChainError::BrokenLink {
                    expected: hex::encode(expected),
                    found: block.hash_hex(),
                });
            }
            if let Err(source) = block.verify() {
                warn!(hash = %block.hash_hex(), error = %source, "stored block failed verification");
                return Err(ChainError::InvalidBlock {
                    hash: block.hash_hex(),
                    source,
                });
            }
            if block.difficulty != self.difficulty.bits() {
                return Err(ConfigError::DifficultyMismatch {
                    stored: block.difficulty,
                    requested: self.difficulty.bits(),
                }
                .into());
            }

            count += 1;
            if let Some(prev) = block.prev_hash {
                expected = prev;
            }
        }

        Ok(count)
    }
}

/// Load a block that must exist.
fn fetch(store: &dyn ChainStore, hash: &BlockHash) -> ChainResult<Block> {
    store
        .load_block(hash)?
        .ok_or_else(|| ChainError::NotFound {
            hash: hex::encode(hash),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
