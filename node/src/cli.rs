//! # CLI Interface
//!
//! Defines the command-line argument structure for `powchain` using
//! `clap` derive. Supports five subcommands: `init`, `addblock`,
//! `printchain`, `verify`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use powchain_protocol::config::DEFAULT_DATA_DIR;

use crate::logging::LogFormat;

/// powchain: an append-only proof-of-work chain.
///
/// Every record is sealed with a SHA-256 proof-of-work and linked to the
/// one before it. The chain lives in a sled database directory.
#[derive(Parser, Debug)]
#[command(
    name = "powchain",
    about = "Append-only proof-of-work chain",
    version,
    propagate_version = true
)]
pub struct PowchainCli {
    /// Path to the chain database directory.
    ///
    /// Created on first use if it does not exist.
    #[arg(
        long,
        short = 'd',
        env = "POWCHAIN_DATA_DIR",
        default_value = DEFAULT_DATA_DIR,
        global = true
    )]
    pub data_dir: PathBuf,

    /// Log output format: pretty or json.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the powchain binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the chain (mining its genesis block) or re-open an existing
    /// one, and print the tip.
    Init(InitArgs),
    /// Mine a new block holding the given data and append it.
    #[command(name = "addblock")]
    AddBlock(AddBlockArgs),
    /// Print every block, newest first.
    #[command(name = "printchain")]
    PrintChain(PrintChainArgs),
    /// Re-check every stored block's seal and link.
    Verify,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Required leading zero bits of every block hash, in [1, 255].
    #[arg(long)]
    pub difficulty: u32,
}

/// Arguments for the `addblock` subcommand.
#[derive(Parser, Debug)]
pub struct AddBlockArgs {
    /// Payload to store in the block.
    #[arg(long)]
    pub data: String,

    /// Difficulty to initialize a fresh chain with.
    ///
    /// Ignored on an existing chain unless it conflicts with the stored
    /// difficulty, which is an error.
    #[arg(long)]
    pub difficulty: Option<u32>,
}

/// Arguments for the `printchain` subcommand.
#[derive(Parser, Debug)]
pub struct PrintChainArgs {
    /// Difficulty to initialize a fresh chain with.
    #[arg(long)]
    pub difficulty: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        PowchainCli::command().debug_assert();
    }

    #[test]
    fn parses_addblock() {
        let cli = PowchainCli::try_parse_from([
            "powchain",
            "--data-dir",
            "/tmp/chain",
            "addblock",
            "--data",
            "Send 1 BTC to Ivan",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, PathBuf::from("/tmp/chain"));
        match cli.command {
            Commands::AddBlock(args) => {
                assert_eq!(args.data, "Send 1 BTC to Ivan");
                assert_eq!(args.difficulty, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = PowchainCli::try_parse_from([
            "powchain",
            "printchain",
            "--difficulty",
            "12",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, "warn");
        assert!(matches!(
            cli.command,
            Commands::PrintChain(PrintChainArgs {
                difficulty: Some(12)
            })
        ));
    }

    #[test]
    fn init_requires_difficulty() {
        assert!(PowchainCli::try_parse_from(["powchain", "init"]).is_err());
    }
}
