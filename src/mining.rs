//! Coinbase synthesis and the parallel nonce search

use crate::block::{Target, HEADER_SIZE};
use crate::constants::*;
use crate::hashing::hash256;
use crate::script::{null_data_script, script_number_push};
use crate::types::*;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;

/// Witness commitment output script: OP_RETURN 0x24 aa21a9ed ‖ commitment
pub fn witness_commitment_script(commitment: &Hash) -> Vec<u8> {
    let mut payload = Vec::with_capacity(36);
    payload.extend_from_slice(&WITNESS_COMMITMENT_PREFIX[2..]);
    payload.extend_from_slice(commitment);
    null_data_script(&payload)
}

/// CreateCoinbaseTransaction: ℕ × ℍ × ℕ × 𝕊 → 𝒯𝒳
///
/// 1. Single input spending the null outpoint, unlocking script = height push
/// 2. Witness = the 32-byte reserved value
/// 3. Output 0: zero-value witness commitment
/// 4. Output 1: collected fees to the payout script
pub fn create_coinbase_transaction(
    fees: u64,
    commitment: &Hash,
    height: u32,
    payout_script: &[u8],
) -> Transaction {
    let input = TxIn {
        txid: hex::encode([0u8; 32]),
        vout: COINBASE_VOUT,
        prevout: None,
        scriptsig: hex::encode(script_number_push(height)),
        witness: vec![hex::encode(WITNESS_RESERVED_VALUE)],
        is_coinbase: true,
        sequence: SEQUENCE_FINAL,
        ..TxIn::default()
    };

    Transaction {
        version: COINBASE_VERSION,
        locktime: 0,
        vin: vec![input],
        vout: vec![
            TxOut::new(0, hex::encode(witness_commitment_script(commitment)), ScriptType::OpReturn),
            TxOut::new(fees, hex::encode(payout_script), ScriptType::Unknown),
        ],
    }
}

/// Search the nonce space for a header hash below `target`
///
/// Workers claim nonces from one shared counter and hash the template with
/// the claimed nonce spliced in. The first worker to find a solution flips
/// `stop` and hands its nonce over a single-slot channel; every worker is
/// joined before this returns. When two workers succeed at once, whichever
/// flips `stop` first wins.
///
/// Returns `None` if `stop` was set by the caller or all 2^32 nonces failed.
pub fn search_nonce(
    template: &BlockHeader,
    target: &Target,
    workers: usize,
    stop: &AtomicBool,
) -> Option<BlockHeader> {
    let base = template.serialize();
    let next_nonce = AtomicU64::new(0);
    let (winner_tx, winner_rx) = mpsc::sync_channel::<u32>(1);

    let nonce = thread::scope(|scope| {
        for worker in 0..workers.max(1) {
            let winner_tx = winner_tx.clone();
            let base = &base;
            let next_nonce = &next_nonce;
            scope.spawn(move || {
                let mut bytes = [0u8; HEADER_SIZE];
                bytes.copy_from_slice(base);

                while !stop.load(Ordering::Relaxed) {
                    let claimed = next_nonce.fetch_add(1, Ordering::Relaxed);
                    let Ok(nonce) = u32::try_from(claimed) else {
                        break;
                    };
                    bytes[76..].copy_from_slice(&nonce.to_le_bytes());

                    if target.is_met_by(&hash256(&bytes)) {
                        if !stop.swap(true, Ordering::AcqRel) {
                            debug!("worker {} found nonce {}", worker, nonce);
                            let _ = winner_tx.try_send(nonce);
                        }
                        break;
                    }
                }
            });
        }
        drop(winner_tx);
        winner_rx.recv().ok()
    })?;

    Some(BlockHeader {
        nonce,
        ..template.clone()
    })
}
