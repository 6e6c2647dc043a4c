//! Configuration for the miner
//!
//! Every tunable the pool, the block assembler and the worker pools read lives
//! here. Values come from a TOML file or from `Default`, and missing keys fall
//! back to the defaults individually.

use crate::block::Target;
use crate::constants::*;
use crate::encoding::decode_hex;
use crate::error::{MinerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pool admission limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of pending transactions held at once
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Minimum accepted fee in satoshis; a fee equal to this is accepted
    #[serde(default = "default_dust")]
    pub dust: u64,
}

fn default_max_pool_size() -> usize {
    DEFAULT_MAX_POOL_SIZE
}

fn default_dust() -> u64 {
    DEFAULT_DUST
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            dust: DEFAULT_DUST,
        }
    }
}

/// Block template parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    /// Selection stops once accumulated weight reaches this budget
    #[serde(default = "default_max_weight")]
    pub max_weight: u64,

    #[serde(default = "default_version")]
    pub version: i32,

    /// Compact difficulty target (nBits)
    #[serde(default = "default_bits")]
    pub bits: u32,

    /// Height pushed into the coinbase unlocking script
    #[serde(default = "default_height")]
    pub height: u32,

    /// Locking script (hex) receiving the collected fees
    #[serde(default = "default_payout_script")]
    pub payout_script: String,
}

fn default_max_weight() -> u64 {
    DEFAULT_BLOCK_WEIGHT_BUDGET
}

fn default_version() -> i32 {
    DEFAULT_BLOCK_VERSION
}

fn default_bits() -> u32 {
    DEFAULT_BITS
}

fn default_height() -> u32 {
    DEFAULT_BLOCK_HEIGHT
}

fn default_payout_script() -> String {
    DEFAULT_PAYOUT_SCRIPT.to_string()
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_BLOCK_WEIGHT_BUDGET,
            version: DEFAULT_BLOCK_VERSION,
            bits: DEFAULT_BITS,
            height: DEFAULT_BLOCK_HEIGHT,
            payout_script: DEFAULT_PAYOUT_SCRIPT.to_string(),
        }
    }
}

/// Top-level miner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerConfig {
    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub block: BlockConfig,

    /// Threads used by the nonce search
    #[serde(default = "default_workers")]
    pub mining_workers: usize,

    /// Threads used to load transactions into the pool
    #[serde(default = "default_workers")]
    pub ingest_workers: usize,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_rejection_log_path")]
    pub rejection_log_path: PathBuf,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}

fn default_rejection_log_path() -> PathBuf {
    PathBuf::from("rejected.txt")
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            block: BlockConfig::default(),
            mining_workers: default_workers(),
            ingest_workers: default_workers(),
            output_path: default_output_path(),
            rejection_log_path: default_rejection_log_path(),
        }
    }
}

impl MinerConfig {
    /// Parse from TOML text; the result is validated
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MinerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; the result is validated
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings the miner cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.mining_workers == 0 || self.ingest_workers == 0 {
            return Err(MinerError::Config("worker counts must be at least 1".into()));
        }
        if self.block.max_weight == 0 {
            return Err(MinerError::Config("block weight budget must be positive".into()));
        }
        match decode_hex(&self.block.payout_script) {
            Ok(script) if !script.is_empty() => {}
            Ok(_) => return Err(MinerError::Config("payout script is empty".into())),
            Err(err) => return Err(MinerError::Config(format!("payout script: {}", err))),
        }
        if Target::from_compact(self.block.bits).is_zero() {
            return Err(MinerError::Config(format!(
                "bits 0x{:08x} expands to a zero target",
                self.block.bits
            )));
        }
        Ok(())
    }

    /// Decoded payout locking script
    pub fn payout_script(&self) -> Result<Vec<u8>> {
        Ok(decode_hex(&self.block.payout_script)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MinerConfig::default();
        assert_eq!(config.pool.max_pool_size, 10_000);
        assert_eq!(config.pool.dust, 1_000);
        assert_eq!(config.block.max_weight, 3_950_000);
        assert_eq!(config.block.bits, 0x1f00ffff);
        assert_eq!(config.block.height, 835_944);
        assert_eq!(config.output_path, PathBuf::from("output.txt"));
        assert!(config.mining_workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MinerConfig::from_toml_str(
            r#"
            mining_workers = 2

            [pool]
            dust = 500

            [block]
            max_weight = 100000
            "#,
        )
        .unwrap();
        assert_eq!(config.mining_workers, 2);
        assert_eq!(config.pool.dust, 500);
        assert_eq!(config.pool.max_pool_size, DEFAULT_MAX_POOL_SIZE);
        assert_eq!(config.block.max_weight, 100_000);
        assert_eq!(config.block.payout_script, DEFAULT_PAYOUT_SCRIPT);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = MinerConfig::from_toml_str("").unwrap();
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.block, BlockConfig::default());
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            MinerConfig::from_toml_str("mining_workers = 0"),
            Err(MinerError::Config(_))
        ));
        assert!(matches!(
            MinerConfig::from_toml_str("[block]\nmax_weight = 0"),
            Err(MinerError::Config(_))
        ));
        assert!(matches!(
            MinerConfig::from_toml_str("[block]\npayout_script = \"zz\""),
            Err(MinerError::Config(_))
        ));
        assert!(matches!(
            MinerConfig::from_toml_str("[block]\nbits = 0"),
            Err(MinerError::Config(_))
        ));
        assert!(matches!(
            MinerConfig::from_toml_str("mining_workers = \"four\""),
            Err(MinerError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.toml");
        std::fs::write(&path, "ingest_workers = 3\n").unwrap();
        let config = MinerConfig::from_file(&path).unwrap();
        assert_eq!(config.ingest_workers, 3);

        assert!(matches!(
            MinerConfig::from_file(dir.path().join("missing.toml")),
            Err(MinerError::Io(_))
        ));
    }
}
