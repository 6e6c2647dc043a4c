//! Core ledger types shared by the codec, validator, pool and miner

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Hash type: 256-bit hash in internal (hash output) byte order
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Referenced output snapshot carried by an input
pub type Prevout = TxOut;

/// OutPoint: funding transaction hash × funding output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Hash,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", crate::encoding::display_hash(&self.txid), self.vout)
    }
}

/// Declared locking-script template of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScriptType {
    #[serde(rename = "p2pkh")]
    P2pkh,
    #[serde(rename = "p2sh")]
    P2sh,
    #[serde(rename = "v0_p2wpkh")]
    P2wpkh,
    #[serde(rename = "v0_p2wsh")]
    P2wsh,
    #[serde(rename = "v1_p2tr")]
    P2tr,
    #[serde(rename = "p2pk")]
    P2pk,
    #[serde(rename = "multisig")]
    Multisig,
    #[serde(rename = "op_return")]
    OpReturn,
    #[default]
    #[serde(rename = "unknown")]
    #[serde(other)]
    Unknown,
}

/// Transaction Output: value × locking script (hex)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxOut {
    #[serde(default, deserialize_with = "null_as_default")]
    pub scriptpubkey: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scriptpubkey_asm: String,
    #[serde(default)]
    pub scriptpubkey_type: ScriptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

impl TxOut {
    pub fn new(value: u64, scriptpubkey: impl Into<String>, script_type: ScriptType) -> Self {
        Self {
            scriptpubkey: scriptpubkey.into(),
            scriptpubkey_asm: String::new(),
            scriptpubkey_type: script_type,
            scriptpubkey_address: None,
            value,
        }
    }
}

/// Transaction Input
///
/// `txid` is the funding transaction id in display (reversed) hex. Scripts and
/// witness elements are raw hex; the assembly forms are whitespace-separated tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxIn {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub prevout: Option<Prevout>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scriptsig: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scriptsig_asm: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub witness: Vec<String>,
    #[serde(default)]
    pub is_coinbase: bool,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_redeemscript_asm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_witnessscript_asm: Option<String>,
}

/// Transaction: version × inputs × outputs × locktime
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub locktime: u32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
}

/// Block Header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
