//! UTXO miner command-line entry point
//!
//! Loads every JSON transaction in a mempool directory, mines one block and
//! writes the block artifact plus a rejection log.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use utxo_miner::encoding::display_hash;
use utxo_miner::ingest::ingest_directory;
use utxo_miner::output::RejectionLog;
use utxo_miner::{MemoryPool, Miner, MinerConfig};

#[derive(Parser)]
#[command(name = "utxo-miner")]
#[command(version)]
#[command(about = "Select pending transactions and mine a block", long_about = None)]
struct Cli {
    /// Directory of transaction JSON files
    #[arg(short, long, default_value = "mempool")]
    mempool: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block artifact path (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rejection log path (overrides the config file)
    #[arg(short, long)]
    rejected: Option<PathBuf>,

    /// Worker threads for ingestion and mining (overrides the config file)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => MinerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MinerConfig::default(),
    };
    if let Some(path) = cli.output {
        config.output_path = path;
    }
    if let Some(path) = cli.rejected {
        config.rejection_log_path = path;
    }
    if let Some(workers) = cli.workers {
        config.mining_workers = workers;
        config.ingest_workers = workers;
    }
    config.validate().context("invalid configuration")?;

    let rejections = RejectionLog::create(&config.rejection_log_path).with_context(|| {
        format!("creating rejection log {}", config.rejection_log_path.display())
    })?;
    let pool = MemoryPool::new(config.pool.clone());

    let report = ingest_directory(&cli.mempool, &pool, config.ingest_workers, &rejections)
        .with_context(|| format!("reading mempool {}", cli.mempool.display()))?;

    let miner = Miner::new(&pool, config, &rejections)?;
    let mined = miner.run().context("mining failed")?;

    println!(
        "Mined block {} with {} transactions ({} ingested, {} rejected at ingest, {} rejected at selection)",
        display_hash(&mined.hash()),
        mined.txids.len(),
        report.accepted,
        report.rejected,
        mined.candidate.rejected
    );
    println!("  nonce:  {}", mined.header.nonce);
    println!("  fees:   {}", mined.candidate.fees);
    println!("  weight: {}", mined.candidate.weight);
    println!("  output: {}", miner.config().output_path.display());

    Ok(())
}
