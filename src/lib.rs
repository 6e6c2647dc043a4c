//! # UTXO Miner
//!
//! Block template assembly and proof-of-work search for a UTXO ledger.
//!
//! Pending transactions are loaded into a pool store, selected by fee,
//! checked against the standard script templates, wrapped with a coinbase
//! that commits to their witnesses, and mined against a compact target.
//!
//! ## Architecture
//!
//! Leaf modules first:
//! - `encoding`, `hashing`: little-endian codec, compact sizes, SHA256d/HASH160
//! - `transaction`, `sighash`: canonical serialization, ids, weight, signature preimages
//! - `script`, `signature`, `validation`: assembly decoding, ECDSA, template dispatch
//! - `mempool`, `ingest`, `selection`: pool store, bulk loading, fee-ordered selection
//! - `block`, `mining`, `miner`, `output`: header, Merkle root, coinbase, nonce search, artifact
//!
//! ## Design Principles
//!
//! 1. **One codec**: every byte layout goes through `ByteEncoder`
//! 2. **Explicit errors**: decode, script, signature, conflict and resource failures are distinct
//! 3. **No globals**: configuration, pool and rejection log are passed to constructors
//! 4. **Exact Version Pinning**: consensus-critical cryptography pinned to exact versions
//!
//! ## Usage
//!
//! ```no_run
//! use utxo_miner::config::MinerConfig;
//! use utxo_miner::ingest::ingest_directory;
//! use utxo_miner::mempool::MemoryPool;
//! use utxo_miner::miner::Miner;
//! use utxo_miner::output::RejectionLog;
//!
//! # fn main() -> utxo_miner::Result<()> {
//! let config = MinerConfig::default();
//! let rejections = RejectionLog::create(&config.rejection_log_path)?;
//! let pool = MemoryPool::new(config.pool.clone());
//!
//! ingest_directory("mempool", &pool, config.ingest_workers, &rejections)?;
//! let mined = Miner::new(&pool, config, &rejections)?.run()?;
//! println!("nonce {}", mined.header.nonce);
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod encoding;
pub mod hashing;
pub mod transaction;
pub mod sighash;
pub mod script;
pub mod signature;
pub mod validation;
pub mod mempool;
pub mod ingest;
pub mod selection;
pub mod block;
pub mod mining;
pub mod miner;
pub mod output;
pub mod config;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{MinerError, Result};
pub use config::MinerConfig;
pub use mempool::{MemoryPool, PoolStore};
pub use miner::{MinedBlock, Miner};
