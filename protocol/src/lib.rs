// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # powchain Protocol: Core Library
//!
//! An append-only chain of proof-of-work sealed records, persisted in an
//! embedded key-value store. Each record carries an opaque payload and the
//! hash of the record before it. Sealing a record means finding a nonce
//! whose SHA-256 header hash has a configured number of leading zero bits.
//!
//! ## Architecture
//!
//! - **config** - Constants, storage keys, and the validated `Difficulty`.
//! - **crypto** - SHA-256 helpers.
//! - **storage** - Blocks, the proof-of-work seal, the sled store, and the
//!   chain that ties them together.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use powchain_protocol::storage::{Chain, SledStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SledStore::open("blocks")?);
//! let chain = Chain::init(store, 16)?;
//! chain.append("Send 1 BTC to Ivan")?;
//!
//! for block in chain.iter() {
//!     let block = block?;
//!     println!("{} {}", block.hash_hex(), block.data_lossy());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod storage;
