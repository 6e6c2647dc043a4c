//! Signature hash functions for legacy and BIP143 segregated-witness inputs
//!
//! Both flavours build a preimage from the spending transaction and the
//! prevout snapshot of the input under test, then double-SHA256 it. Only the
//! sighash modes listed in `SighashType` are supported.

use crate::constants::*;
use crate::encoding::{decode_hex, ByteEncoder};
use crate::error::{Result, ScriptError};
use crate::hashing::hash256;
use crate::script::p2wpkh_script_code;
use crate::types::*;

/// Sighash mode selected by a signature's trailing byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SighashType {
    All = SIGHASH_ALL,
    AllAnyoneCanPay = SIGHASH_ALL | SIGHASH_ANYONECANPAY,
    SingleAnyoneCanPay = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
}

impl SighashType {
    const SUPPORTED: [SighashType; 3] = [
        SighashType::All,
        SighashType::AllAnyoneCanPay,
        SighashType::SingleAnyoneCanPay,
    ];

    pub fn from_u8(byte: u8) -> Result<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|mode| *mode as u8 == byte)
            .ok_or_else(|| ScriptError::UnsupportedSighash(byte).into())
    }

    /// Read the mode from the last byte of a serialized signature
    pub fn from_signature(signature: &[u8]) -> Result<Self> {
        match signature.last() {
            Some(&byte) => Self::from_u8(byte),
            None => Err(ScriptError::EmptySignature.into()),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn anyone_can_pay(self) -> bool {
        (self as u8) & SIGHASH_ANYONECANPAY != 0
    }

    pub fn is_single(self) -> bool {
        (self as u8) & 0x1f == SIGHASH_SINGLE
    }
}

/// Legacy preimage for input `index`
///
/// Works on a transient copy of `tx`:
/// 1. ALL: blank every unlocking script, then put the referenced locking
///    script in the input under test
/// 2. ALL|ANYONECANPAY: the input list becomes just the input under test,
///    carrying the referenced locking script
/// 3. Serialize without witness and append the 4-byte sighash type
pub fn legacy_preimage(tx: &Transaction, index: usize, sighash: SighashType) -> Result<Vec<u8>> {
    let prevout = prevout_of(tx, index)?;

    let mut copy = tx.clone();
    match sighash {
        SighashType::All => {
            for input in copy.vin.iter_mut() {
                input.scriptsig.clear();
            }
            copy.vin[index].scriptsig = prevout.scriptpubkey.clone();
        }
        SighashType::AllAnyoneCanPay => {
            let mut input = copy.vin.swap_remove(index);
            input.scriptsig = prevout.scriptpubkey.clone();
            copy.vin = vec![input];
        }
        SighashType::SingleAnyoneCanPay => {
            return Err(ScriptError::UnsupportedSighash(sighash as u8).into());
        }
    }

    let mut preimage = copy.serialize()?;
    preimage.extend_from_slice(&sighash.as_u32().to_le_bytes());
    Ok(preimage)
}

/// Legacy signing digest: SHA256d(legacy_preimage)
pub fn legacy_sighash(tx: &Transaction, index: usize, sighash: SighashType) -> Result<Hash> {
    Ok(hash256(&legacy_preimage(tx, index, sighash)?))
}

/// BIP143 preimage for a pay-to-witness-pubkey-hash input
///
/// version ‖ hashPrevouts ‖ hashSequence ‖ outpoint ‖ scriptCode ‖ value ‖
/// sequence ‖ hashOutputs ‖ locktime ‖ sighash type
pub fn segwit_preimage(tx: &Transaction, index: usize, sighash: SighashType) -> Result<Vec<u8>> {
    let prevout = prevout_of(tx, index)?;
    let input = &tx.vin[index];
    let script_code = p2wpkh_script_code(&decode_hex(&prevout.scriptpubkey)?)?;

    let hash_prevouts = if sighash.anyone_can_pay() {
        [0u8; 32]
    } else {
        let mut enc = ByteEncoder::with_capacity(tx.vin.len() * 36);
        for txin in &tx.vin {
            enc.put_bytes(&txin.outpoint()?.txid).put(txin.vout);
        }
        hash256(enc.as_bytes())
    };

    let hash_sequence = if sighash.anyone_can_pay() || sighash.is_single() {
        [0u8; 32]
    } else {
        let mut enc = ByteEncoder::with_capacity(tx.vin.len() * 4);
        for txin in &tx.vin {
            enc.put(txin.sequence);
        }
        hash256(enc.as_bytes())
    };

    let hash_outputs = match sighash {
        SighashType::All | SighashType::AllAnyoneCanPay => {
            hash256(&Transaction::serialize_outputs(&tx.vout)?)
        }
        SighashType::SingleAnyoneCanPay if index < tx.vout.len() => {
            hash256(&Transaction::serialize_outputs(&tx.vout[index..=index])?)
        }
        SighashType::SingleAnyoneCanPay => [0u8; 32],
    };

    let mut enc = ByteEncoder::with_capacity(156 + script_code.len());
    enc.put(tx.version)
        .put_bytes(&hash_prevouts)
        .put_bytes(&hash_sequence)
        .put_bytes(&input.outpoint()?.txid)
        .put(input.vout)
        .put_var_bytes(&script_code)
        .put(prevout.value)
        .put(input.sequence)
        .put_bytes(&hash_outputs)
        .put(tx.locktime)
        .put(sighash.as_u32());
    Ok(enc.into_bytes())
}

/// Segwit signing digest: SHA256d(segwit_preimage)
pub fn segwit_sighash(tx: &Transaction, index: usize, sighash: SighashType) -> Result<Hash> {
    Ok(hash256(&segwit_preimage(tx, index, sighash)?))
}

fn prevout_of(tx: &Transaction, index: usize) -> Result<&Prevout> {
    tx.vin
        .get(index)
        .and_then(|input| input.prevout.as_ref())
        .ok_or_else(|| ScriptError::MissingPrevout(index).into())
}
