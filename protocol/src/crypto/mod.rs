//! # Cryptographic Primitives
//!
//! powchain needs exactly one primitive: a 256-bit cryptographic hash.
//! Everything here is a thin wrapper around the audited `sha2` crate.

pub mod hash;

pub use hash::{sha256_array, sha256_multi};
