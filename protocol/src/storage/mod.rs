//! # Storage Module
//!
//! The chain itself: blocks, their proof-of-work seal, and the persistent
//! store that keeps them across restarts.
//!
//! ## Architecture
//!
//! ```text
//! codec.rs - deterministic header encoding and hashing
//! pow.rs   - difficulty target and nonce search
//! block.rs - Block structure, genesis, verify, storage encoding
//! db.rs    - ChainStore trait and the sled-backed store
//! chain.rs - init / load / append, the single writer
//! iter.rs  - tip-to-genesis traversal
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! data → Block::new → pow::seal → codec (header bytes → SHA-256)
//!                        ↓
//!         ChainStore::put_block_and_advance_tip
//!                        ↓
//!            ChainIterator (tip → genesis)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **SHA-256 over a fixed header layout.** Little-endian fixed-width
//!    integers, length-prefixed variable fields, nonce last. The hash is
//!    reproducible from the stored fields alone.
//!
//! 2. **One sled tree.** Blocks and the tip sentinel share a tree so a
//!    single `Batch` can commit both atomically.
//!
//! 3. **Bincode for on-disk serialization.** Compact and deterministic.

pub mod block;
pub mod chain;
pub mod codec;
pub mod db;
pub mod iter;
pub mod pow;

pub use block::{Block, BlockError, BlockHash, DecodeError};
pub use chain::{Chain, ChainError, ChainResult};
pub use db::{ChainStore, SledStore, StoreError};
pub use iter::ChainIterator;
