//! Input script validation dispatched on the prevout's declared script type
//!
//! Only the standard templates are understood. Key-hash spends get full
//! signature checks, script-hash spends get their redeem/witness script
//! commitment checked, and the remaining known templates are accepted as-is.

use crate::encoding::decode_hex;
use crate::error::{Result, ScriptError};
use crate::hashing::{hash160, sha256};
use crate::script::{decode_asm, push_data};
use crate::sighash::{legacy_sighash, segwit_sighash, SighashType};
use crate::signature::verify_ecdsa;
use crate::types::*;
use log::debug;
use secp256k1::{Secp256k1, VerifyOnly};

/// Stateless input verifier; owns a verification-only secp256k1 context
pub struct ScriptVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Default for ScriptVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    /// Validate every input in order; the first failure rejects the transaction
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<()> {
        for index in 0..tx.vin.len() {
            self.validate_input(tx, index)?;
        }
        Ok(())
    }

    /// ValidateInput: 𝒯𝒳 × ℕ → {valid, invalid}
    ///
    /// 1. Look up the prevout snapshot of input `index`
    /// 2. Dispatch on its declared script type
    /// 3. Run the template check for that type
    pub fn validate_input(&self, tx: &Transaction, index: usize) -> Result<()> {
        let input = tx
            .vin
            .get(index)
            .ok_or(ScriptError::MissingPrevout(index))?;
        let prevout = input
            .prevout
            .as_ref()
            .ok_or(ScriptError::MissingPrevout(index))?;

        let result = match prevout.scriptpubkey_type {
            ScriptType::OpReturn => Err(ScriptError::OpReturnSpend.into()),
            ScriptType::P2pk | ScriptType::Multisig | ScriptType::P2tr => Ok(()),
            ScriptType::P2pkh => self.verify_p2pkh(tx, index, input),
            ScriptType::P2sh => verify_p2sh(input, prevout),
            ScriptType::P2wsh => verify_p2wsh(input, prevout),
            ScriptType::P2wpkh => self.verify_p2wpkh(tx, index, input),
            ScriptType::Unknown => Err(ScriptError::UnknownScriptType.into()),
        };

        if let Err(ref err) = result {
            debug!("input {}:{} failed validation: {}", input.txid, input.vout, err);
        }
        result
    }

    fn verify_p2pkh(&self, tx: &Transaction, index: usize, input: &TxIn) -> Result<()> {
        let pushes = push_data(&input.scriptsig_asm)?;
        let (signature, public_key) = match pushes.as_slice() {
            [.., signature, public_key] => (signature, public_key),
            _ => return Err(ScriptError::MalformedScriptSig.into()),
        };

        let sighash = SighashType::from_signature(signature)?;
        let digest = legacy_sighash(tx, index, sighash)?;
        self.check_signature(&digest, signature, public_key)
    }

    fn verify_p2wpkh(&self, tx: &Transaction, index: usize, input: &TxIn) -> Result<()> {
        if input.witness.len() != 2 {
            return Err(ScriptError::InvalidWitnessLength(input.witness.len()).into());
        }
        let signature = decode_hex(&input.witness[0])?;
        let public_key = decode_hex(&input.witness[1])?;

        let sighash = SighashType::from_signature(&signature)?;
        let digest = segwit_sighash(tx, index, sighash)?;
        self.check_signature(&digest, &signature, &public_key)
    }

    // signature still carries its sighash byte
    fn check_signature(&self, digest: &Hash, signature: &[u8], public_key: &[u8]) -> Result<()> {
        let der = signature
            .split_last()
            .map(|(_, der)| der)
            .ok_or(ScriptError::EmptySignature)?;
        verify_ecdsa(&self.secp, digest, der, public_key)?;
        Ok(())
    }
}

/// Redeem script must HASH160 to the hash in the locking script
fn verify_p2sh(input: &TxIn, prevout: &Prevout) -> Result<()> {
    let redeem_asm = input
        .inner_redeemscript_asm
        .as_deref()
        .ok_or(ScriptError::MissingRedeemScript)?;
    let actual = hash160(&decode_asm(redeem_asm)?);
    let expected = committed_hash(prevout)?;

    if actual[..] != expected[..] {
        return Err(ScriptError::RedeemScriptMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }
        .into());
    }
    Ok(())
}

/// Witness script must SHA256 to the program in the locking script
fn verify_p2wsh(input: &TxIn, prevout: &Prevout) -> Result<()> {
    let witness_asm = input
        .inner_witnessscript_asm
        .as_deref()
        .ok_or(ScriptError::MissingWitnessScript)?;
    let actual = sha256(&decode_asm(witness_asm)?);
    let expected = committed_hash(prevout)?;

    if actual[..] != expected[..] {
        return Err(ScriptError::WitnessScriptMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }
        .into());
    }
    Ok(())
}

// first data push of the locking script assembly
fn committed_hash(prevout: &Prevout) -> Result<Vec<u8>> {
    push_data(&prevout.scriptpubkey_asm)?
        .into_iter()
        .next()
        .ok_or_else(|| ScriptError::MalformedWitnessProgram.into())
}
