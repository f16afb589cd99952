//! # Protocol Configuration & Constants
//!
//! Every fixed parameter of a powchain chain lives here, along with the
//! one value that must be supplied at runtime: the proof-of-work
//! difficulty.
//!
//! There is deliberately no default difficulty. A chain's difficulty is
//! fixed for its whole lifetime, so it is either given explicitly when the
//! chain is first created or read back from the stored tip block.

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hash output length in bytes. SHA-256 produces 32-byte digests.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Total number of bits in a block hash.
pub const HASH_BITS: u32 = (HASH_OUTPUT_LENGTH * 8) as u32;

// ---------------------------------------------------------------------------
// Proof-of-Work
// ---------------------------------------------------------------------------

/// Smallest accepted difficulty (leading zero bits).
pub const MIN_DIFFICULTY: u32 = 1;

/// Largest accepted difficulty. At 256 the target `2^(256 - d)` collapses
/// to 1 and no hash but all-zeros could ever qualify.
pub const MAX_DIFFICULTY: u32 = HASH_BITS - 1;

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Payload of the genesis block.
pub const GENESIS_DATA: &[u8] = b"Genesis Block";

/// Reserved store key holding the current tip hash. Three bytes long, so
/// it can never collide with a 32-byte block hash.
pub const TIP_KEY: &[u8] = b"tip";

/// Name of the sled tree that holds block records and the tip sentinel.
pub const BLOCKS_TREE: &str = "blocks";

/// Default on-disk location of the chain database, relative to the
/// working directory.
pub const DEFAULT_DATA_DIR: &str = "blocks";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid chain configuration. Always raised before any mining starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Difficulty outside `[MIN_DIFFICULTY, MAX_DIFFICULTY]`.
    #[error("difficulty {0} is outside the accepted range [1, 255]")]
    DifficultyOutOfRange(u32),

    /// The store already holds a chain mined at another difficulty.
    #[error("stored chain uses difficulty {stored}, but difficulty {requested} was requested")]
    DifficultyMismatch {
        /// Difficulty recorded in the stored tip block.
        stored: u32,
        /// Difficulty supplied by the caller.
        requested: u32,
    },
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Number of leading zero bits a block hash must have.
///
/// Constructing one is the only validation point: every `Difficulty` in
/// circulation is within `[MIN_DIFFICULTY, MAX_DIFFICULTY]`, which is what
/// lets the proof-of-work search assume its target is reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u32);

impl Difficulty {
    /// Validate a raw bit count.
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(ConfigError::DifficultyOutOfRange(bits))
        }
    }

    /// The raw number of leading zero bits.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
