// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # powchain
//!
//! Entry point for the `powchain` binary. Parses CLI arguments, initializes
//! logging, opens the chain in the data directory, and runs one command.
//!
//! The binary supports five subcommands:
//!
//! - `init`       - create the chain or re-open it, print the tip
//! - `addblock`   - mine and append a block
//! - `printchain` - print every block, newest first
//! - `verify`     - re-check every stored block
//! - `version`    - print build version information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use powchain_protocol::storage::{Block, Chain, ChainStore, SledStore};

use cli::{Commands, PowchainCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = PowchainCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Init(args) => init_chain(&cli.data_dir, args),
        Commands::AddBlock(args) => add_block(&cli.data_dir, args).await,
        Commands::PrintChain(args) => print_chain(&cli.data_dir, args),
        Commands::Verify => verify_chain(&cli.data_dir),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens the store in `data_dir` and the chain inside it.
///
/// With a difficulty the chain is created if the store is empty. Without
/// one the store must already hold a chain.
fn open_chain(data_dir: &Path, difficulty: Option<u32>) -> Result<Chain> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let store = SledStore::open(data_dir)
        .with_context(|| format!("failed to open database at {}", data_dir.display()))?;
    let store: Arc<dyn ChainStore> = Arc::new(store);
    tracing::info!(path = %data_dir.display(), "database opened");

    let chain = match difficulty {
        Some(bits) => Chain::init(store, bits),
        None => Chain::load(store),
    };
    chain.with_context(|| match difficulty {
        Some(bits) => format!(
            "failed to open chain at {} with difficulty {}",
            data_dir.display(),
            bits
        ),
        None => format!(
            "failed to open chain at {} (pass --difficulty to create one)",
            data_dir.display()
        ),
    })
}

/// Creates the chain if needed and prints its tip.
fn init_chain(data_dir: &Path, args: cli::InitArgs) -> Result<()> {
    let chain = open_chain(data_dir, Some(args.difficulty))?;

    println!("Chain ready.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Difficulty     : {}", chain.difficulty());
    println!("  Tip            : {}", hex::encode(chain.tip()));

    Ok(())
}

/// Mines a block holding `args.data` on a blocking worker.
async fn add_block(data_dir: &Path, args: cli::AddBlockArgs) -> Result<()> {
    let chain = open_chain(data_dir, args.difficulty)?;
    let data = args.data.into_bytes();

    let block = tokio::task::spawn_blocking(move || chain.append(data))
        .await
        .context("mining task panicked")?
        .context("failed to add block")?;

    println!("Success!");
    println!("{}", block.hash_hex());
    Ok(())
}

/// Prints every block from the tip back to genesis.
fn print_chain(data_dir: &Path, args: cli::PrintChainArgs) -> Result<()> {
    let chain = open_chain(data_dir, args.difficulty)?;

    for block in chain.iter() {
        let block = block.context("failed to read chain")?;
        println!("{}", render_block(&block));
    }
    Ok(())
}

/// Re-checks every stored block and prints the count.
fn verify_chain(data_dir: &Path) -> Result<()> {
    let chain = open_chain(data_dir, None)?;
    let count = chain.verify_chain().context("chain verification failed")?;

    println!("Chain OK: {} blocks, difficulty {}", count, chain.difficulty());
    Ok(())
}

/// Human-readable block listing used by `printchain`.
fn render_block(block: &Block) -> String {
    let mut out = String::new();
    let when = chrono::DateTime::from_timestamp(block.timestamp, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Timestamp: {} ({})", block.timestamp, when);
    let _ = writeln!(out, "Data: {}", block.data_lossy());
    let _ = writeln!(out, "Prev. hash: {}", block.prev_hash_hex());
    let _ = writeln!(out, "Hash: {}", block.hash_hex());
    let _ = writeln!(out, "Nonce: {}", block.nonce);
    let _ = writeln!(out, "Difficulty: {}", block.difficulty);
    let _ = writeln!(out, "PoW: {}", block.verify().is_ok());
    out
}

/// Prints version information to stdout.
fn print_version() {
    println!("powchain {}", env!("CARGO_PKG_VERSION"));
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_protocol::config::Difficulty;

    #[test]
    fn fresh_store_needs_difficulty() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_chain(dir.path(), None).err().expect("must fail");
        assert!(format!("{err:#}").contains("--difficulty"));
    }

    #[test]
    fn reopen_uses_stored_difficulty() {
        let dir = tempfile::tempdir().unwrap();
        let tip = {
            let chain = open_chain(dir.path(), Some(6)).unwrap();
            chain.append("A").unwrap().hash
        };

        {
            let chain = open_chain(dir.path(), None).unwrap();
            assert_eq!(chain.difficulty().bits(), 6);
            assert_eq!(chain.tip(), tip);
        }

        let err = open_chain(dir.path(), Some(7)).err().expect("must fail");
        assert!(format!("{err:#}").contains("stored chain uses difficulty 6"));
    }

    #[test]
    fn render_lists_fields() {
        let block = Block::with_timestamp(0, b"A".to_vec(), None, Difficulty::new(4).unwrap());
        let text = render_block(&block);
        assert!(text.contains("Timestamp: 0 (1970-01-01T00:00:00+00:00)"));
        assert!(text.contains("Data: A\n"));
        assert!(text.contains("Prev. hash: \n"));
        assert!(text.contains(&format!("Hash: {}", block.hash_hex())));
        assert!(text.contains("PoW: true"));
    }
}
