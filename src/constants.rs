//! Consensus and policy constants used by the miner

/// Maximum block weight (consensus)
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Default selection budget: leaves room for header and coinbase below MAX_BLOCK_WEIGHT
pub const DEFAULT_BLOCK_WEIGHT_BUDGET: u64 = MAX_BLOCK_WEIGHT - 50_000;

/// Default maximum number of pending transactions held by the pool
pub const DEFAULT_MAX_POOL_SIZE: usize = 10_000;

/// Default minimum acceptable fee in satoshis
pub const DEFAULT_DUST: u64 = 1_000;

/// Witness scale factor: weight = 3 × base size + total size
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Fixed difficulty encoding of every mined header
pub const DEFAULT_BITS: u32 = 0x1f00ffff;

/// Block header version
pub const DEFAULT_BLOCK_VERSION: i32 = 2;

/// Height committed to in the coinbase unlocking script
pub const DEFAULT_BLOCK_HEIGHT: u32 = 835_944;

/// Fee payout script (P2PKH)
pub const DEFAULT_PAYOUT_SCRIPT: &str = "76a914536ffa992491508dca0354e52f32a3a7a679a53a88ac";

/// Coinbase transaction version
pub const COINBASE_VERSION: i32 = 2;

/// Coinbase input index
pub const COINBASE_VOUT: u32 = 0xffffffff;

/// Witness commitment output prefix: OP_RETURN, push 36, commitment header aa21a9ed
pub const WITNESS_COMMITMENT_PREFIX: [u8; 6] = [0x6a, 0x24, 0xaa, 0x21, 0xa9, 0xed];

/// Witness reserved value (coinbase witness and commitment suffix)
pub const WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Segwit serialization marker and flag bytes
pub const SEGWIT_MARKER: u8 = 0x00;
pub const SEGWIT_FLAG: u8 = 0x01;

/// Sighash flag bits
pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
