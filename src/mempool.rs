//! Pending transaction pool
//!
//! `PoolStore` is the interface selection runs against; `MemoryPool` is the
//! in-process implementation. Admission derives fee and weight once, ranks
//! entries by fee and tracks spent outpoints for conflict detection.

use crate::config::PoolConfig;
use crate::encoding::{decode_hex, display_hash};
use crate::error::{MinerError, PoolError, Result, ScriptError};
use crate::script::check_asm_matches_hex;
use crate::types::*;
use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Admitted transaction with its derived identifiers, fee and weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolEntry {
    /// Store-assigned id, increasing in insertion order
    pub id: u64,
    pub txid: Hash,
    pub wtxid: Hash,
    pub fee: u64,
    pub weight: u64,
    pub tx: Transaction,
}

/// Input resolved against the output it spends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub input_index: usize,
    pub outpoint: OutPoint,
    pub value: u64,
    pub script_pubkey: String,
    pub script_type: ScriptType,
}

/// Pool store operations used by ingestion and selection
pub trait PoolStore: Send + Sync {
    /// Admit a transaction, returning its store id
    fn insert(&self, tx: Transaction) -> Result<u64>;

    /// Take the highest-fee remaining entry out of the ranking (ties: lowest id)
    ///
    /// The entry stays in the store until `delete`; it is never picked twice.
    fn pick_best(&self) -> Result<Option<MempoolEntry>>;

    /// Inputs of a pooled transaction, in input order
    fn inputs(&self, txid: &Hash) -> Result<Vec<InputRecord>>;

    /// Mark an outpoint spent; a repeat fails with `MinerError::AlreadySpent`
    fn mark_spent(&self, outpoint: &OutPoint) -> Result<()>;

    fn delete(&self, id: u64) -> Result<()>;

    /// Drop every entry and spent marker
    fn reset(&self) -> Result<()>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
struct PoolState {
    next_id: u64,
    entries: HashMap<u64, MempoolEntry>,
    by_txid: HashMap<Hash, u64>,
    ranking: BTreeSet<(Reverse<u64>, u64)>,
    spent: HashSet<OutPoint>,
}

/// In-memory pool store
pub struct MemoryPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl MemoryPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        self.state.lock().map_err(|_| PoolError::Poisoned.into())
    }

    /// Build an entry for `tx` without touching the store
    ///
    /// 1. Reject coinbase transactions
    /// 2. Check every script decodes and matches its assembly
    /// 3. Derive txid, wtxid, weight and fee
    /// 4. Reject fees below the dust threshold
    fn prepare(&self, tx: Transaction) -> Result<MempoolEntry> {
        if tx.is_coinbase() || tx.vin.iter().any(|input| input.is_coinbase) {
            return Err(PoolError::Coinbase.into());
        }

        check_scripts(&tx)?;

        let txid = tx.txid()?;
        let wtxid = tx.wtxid()?;
        let weight = tx.weight()?;
        let fee = tx.fee()?;

        if fee < self.config.dust {
            return Err(PoolError::FeeTooLow {
                fee,
                dust: self.config.dust,
            }
            .into());
        }

        Ok(MempoolEntry {
            id: 0,
            txid,
            wtxid,
            fee,
            weight,
            tx,
        })
    }
}

impl PoolStore for MemoryPool {
    fn insert(&self, tx: Transaction) -> Result<u64> {
        let mut entry = self.prepare(tx)?;

        let mut state = self.lock()?;
        if state.entries.len() >= self.config.max_pool_size {
            return Err(PoolError::PoolFull(self.config.max_pool_size).into());
        }
        if state.by_txid.contains_key(&entry.txid) {
            return Err(PoolError::Duplicate(display_hash(&entry.txid)).into());
        }

        state.next_id += 1;
        entry.id = state.next_id;
        let id = entry.id;

        debug!(
            "admitted {} fee={} weight={}",
            display_hash(&entry.txid),
            entry.fee,
            entry.weight
        );
        state.by_txid.insert(entry.txid, id);
        state.ranking.insert((Reverse(entry.fee), id));
        state.entries.insert(id, entry);
        Ok(id)
    }

    fn pick_best(&self) -> Result<Option<MempoolEntry>> {
        let mut state = self.lock()?;
        while let Some((_, id)) = state.ranking.pop_first() {
            if let Some(entry) = state.entries.get(&id) {
                return Ok(Some(entry.clone()));
            }
        }
        Ok(None)
    }

    fn inputs(&self, txid: &Hash) -> Result<Vec<InputRecord>> {
        let state = self.lock()?;
        let entry = state
            .by_txid
            .get(txid)
            .and_then(|id| state.entries.get(id))
            .ok_or_else(|| PoolError::UnknownTransaction(display_hash(txid)))?;

        entry
            .tx
            .vin
            .iter()
            .enumerate()
            .map(|(input_index, input)| -> Result<InputRecord> {
                let prevout = input
                    .prevout
                    .as_ref()
                    .ok_or(ScriptError::MissingPrevout(input_index))?;
                Ok(InputRecord {
                    input_index,
                    outpoint: input.outpoint()?,
                    value: prevout.value,
                    script_pubkey: prevout.scriptpubkey.clone(),
                    script_type: prevout.scriptpubkey_type,
                })
            })
            .collect()
    }

    fn mark_spent(&self, outpoint: &OutPoint) -> Result<()> {
        let mut state = self.lock()?;
        if !state.spent.insert(*outpoint) {
            return Err(MinerError::AlreadySpent(*outpoint));
        }
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<()> {
        let mut state = self.lock()?;
        let entry = state
            .entries
            .remove(&id)
            .ok_or(PoolError::UnknownEntry(id))?;
        state.by_txid.remove(&entry.txid);
        state.ranking.remove(&(Reverse(entry.fee), id));
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.lock()? = PoolState::default();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.lock()?.entries.len())
    }
}

/// Every unlocking and locking script must be valid hex; when an assembly
/// form is present it must encode to the same bytes
fn check_scripts(tx: &Transaction) -> Result<()> {
    for (index, input) in tx.vin.iter().enumerate() {
        let prevout = input
            .prevout
            .as_ref()
            .ok_or(ScriptError::MissingPrevout(index))?;
        check_script(&input.scriptsig_asm, &input.scriptsig)?;
        check_script(&prevout.scriptpubkey_asm, &prevout.scriptpubkey)?;
        for item in &input.witness {
            decode_hex(item)?;
        }
    }
    for output in &tx.vout {
        check_script(&output.scriptpubkey_asm, &output.scriptpubkey)?;
    }
    Ok(())
}

fn check_script(asm: &str, script_hex: &str) -> Result<()> {
    if asm.trim().is_empty() {
        decode_hex(script_hex)?;
        return Ok(());
    }
    check_asm_matches_hex(asm, script_hex)
}
