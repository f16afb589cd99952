//! # Chain Store
//!
//! The persistence layer for powchain. The chain only needs a durable
//! key-value space with one atomic multi-key write, so that is all the
//! [`ChainStore`] trait asks for. [`SledStore`] provides it on top of
//! sled's embedded database.
//!
//! ## Key Layout
//!
//! A single sled tree, `blocks`:
//!
//! | Key               | Value             |
//! |-------------------|-------------------|
//! | block hash (32 B) | `bincode(Block)`  |
//! | `b"tip"` (3 B)    | tip hash (32 B)   |
//!
//! The tip sentinel is three bytes long, so it can never be mistaken for a
//! block hash.
//!
//! ## Atomicity
//!
//! Appending a block writes the block record and the new tip in a single
//! `Batch`, which sled applies atomically within a tree. Either both land
//! or neither does: readers never see a block without its tip update, or
//! a tip pointing at a block that is not there. Every write is flushed
//! before returning.

use std::path::Path;

use sled::{Batch, Db, Tree};
use thiserror::Error;

use crate::config::{BLOCKS_TREE, TIP_KEY};

use super::block::{Block, BlockHash, DecodeError};
use super::chain::ChainError;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// I/O or transaction failure in the underlying store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// ChainStore
// ---------------------------------------------------------------------------

/// Durable key-value space backing a chain.
///
/// Implementations must make `put` and `put_block_and_advance_tip`
/// durable before returning, and the latter atomic.
pub trait ChainStore: Send + Sync {
    /// Read a raw value.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Write a raw value and flush it.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Store an encoded block under its hash and point the tip at it, as
    /// one atomic write.
    fn put_block_and_advance_tip(&self, hash: &BlockHash, encoded: &[u8]) -> StoreResult<()>;

    /// Current tip hash, or `None` for an uninitialized store.
    fn tip(&self) -> Result<Option<BlockHash>, ChainError> {
        match self.get(TIP_KEY)? {
            Some(bytes) => {
                let hash: BlockHash = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| DecodeError::TipLength(bytes.len()))?;
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    /// Fetch and decode the block stored under `hash`.
    fn load_block(&self, hash: &BlockHash) -> Result<Option<Block>, ChainError> {
        match self.get(hash)? {
            Some(bytes) => Ok(Some(Block::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// sled-backed [`ChainStore`].
///
/// sled supports lock-free concurrent reads alongside serialized writes,
/// so a `SledStore` can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SledStore {
    /// The underlying sled database handle.
    db: Db,
    /// Block records and the tip sentinel.
    blocks: Tree,
}

impl SledStore {
    /// Open or create a store at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a store that lives in a temporary location and is removed
    /// when dropped. Used by tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let blocks = db.open_tree(BLOCKS_TREE)?;
        Ok(Self { db, blocks })
    }

    /// Number of block records, excluding the tip sentinel.
    pub fn block_count(&self) -> StoreResult<usize> {
        let total = self.blocks.len();
        if self.blocks.contains_key(TIP_KEY)? {
            Ok(total - 1)
        } else {
            Ok(total)
        }
    }

    /// Force all pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ChainStore for SledStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blocks.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.blocks.insert(key, value)?;
        self.flush()
    }

    fn put_block_and_advance_tip(&self, hash: &BlockHash, encoded: &[u8]) -> StoreResult<()> {
        let mut batch = Batch::default();
        batch.insert(&hash[..], encoded);
        batch.insert(TIP_KEY, &hash[..]);
        self.blocks.apply_batch(batch)?;

        self.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
