//! Error types for decoding, script validation, the pool store and the miner

use crate::types::OutPoint;
use thiserror::Error;

/// Malformed input bytes: never retried, always fatal to the operation in progress
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid hex '{value}': {source}")]
    Hex {
        value: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("compact size {0} does not fit in memory")]
    CompactSizeOverflow(u64),
}

/// Script classification and template failures
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("null-data output used as input")]
    OpReturnSpend,

    #[error("unknown script type")]
    UnknownScriptType,

    #[error("redeem script hash mismatch: expected {expected}, got {actual}")]
    RedeemScriptMismatch { expected: String, actual: String },

    #[error("witness script hash mismatch: expected {expected}, got {actual}")]
    WitnessScriptMismatch { expected: String, actual: String },

    #[error("missing redeem script")]
    MissingRedeemScript,

    #[error("missing witness script")]
    MissingWitnessScript,

    #[error("invalid witness length: expected 2 elements, got {0}")]
    InvalidWitnessLength(usize),

    #[error("input {0} has no prevout")]
    MissingPrevout(usize),

    #[error("unlocking script must push signature and public key")]
    MalformedScriptSig,

    #[error("malformed witness program in locking script")]
    MalformedWitnessProgram,

    #[error("unsupported sighash type 0x{0:02x}")]
    UnsupportedSighash(u8),

    #[error("empty signature")]
    EmptySignature,

    #[error("script assembly does not match script bytes")]
    AsmMismatch,
}

/// ECDSA verification failures
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("malformed DER signature: {0}")]
    MalformedSignature(#[source] secp256k1::Error),

    #[error("malformed public key: {0}")]
    MalformedPublicKey(#[source] secp256k1::Error),

    #[error("invalid signature")]
    Invalid,
}

/// Pool store admission and bookkeeping failures
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("transaction {0} already in pool")]
    Duplicate(String),

    #[error("fee {fee} below dust threshold {dust}")]
    FeeTooLow { fee: u64, dust: u64 },

    #[error("pool full: {0} transactions")]
    PoolFull(usize),

    #[error("outputs ({outputs}) exceed inputs ({inputs})")]
    Overspend { inputs: u64, outputs: u64 },

    #[error("input or output values overflow 64 bits")]
    ValueOverflow,

    #[error("coinbase transactions are not accepted into the pool")]
    Coinbase,

    #[error("no pool entry with id {0}")]
    UnknownEntry(u64),

    #[error("transaction {0} not in pool")]
    UnknownTransaction(String),

    #[error("pool store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Script validation failed: {0}")]
    Script(#[from] ScriptError),

    #[error("Signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Already spent: {0}")]
    AlreadySpent(OutPoint),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mining failed: {0}")]
    Mining(String),
}

impl MinerError {
    /// Per-transaction failures: the selection loop evicts the transaction and carries on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MinerError::Decode(_)
                | MinerError::Script(_)
                | MinerError::Signature(_)
                | MinerError::AlreadySpent(_)
        )
    }

    /// Outpoint double-spend, an expected outcome in a pending pool
    pub fn is_conflict(&self) -> bool {
        matches!(self, MinerError::AlreadySpent(_))
    }
}

impl From<toml::de::Error> for MinerError {
    fn from(err: toml::de::Error) -> Self {
        MinerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MinerError>;
