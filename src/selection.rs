//! Fee-ordered transaction selection with outpoint conflict tracking

use crate::encoding::display_hash;
use crate::error::Result;
use crate::mempool::{MempoolEntry, PoolStore};
use crate::output::RejectionLog;
use crate::types::Hash;
use crate::validation::ScriptVerifier;
use log::{debug, info};

/// Transactions chosen for the next block, in selection order (no coinbase)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockCandidate {
    pub txids: Vec<Hash>,
    pub wtxids: Vec<Hash>,
    pub fees: u64,
    pub weight: u64,
    /// Transactions evicted during selection, conflicts included
    pub rejected: usize,
    /// Evictions caused by an already-spent outpoint
    pub conflicts: usize,
}

impl BlockCandidate {
    pub fn len(&self) -> usize {
        self.txids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txids.is_empty()
    }

    fn accept(&mut self, entry: &MempoolEntry) {
        self.txids.push(entry.txid);
        self.wtxids.push(entry.wtxid);
        self.fees += entry.fee;
        self.weight += entry.weight;
    }
}

/// SelectTransactions: 𝒫 × ℕ → 𝒯𝒳*
///
/// While the accumulated weight is below `budget`:
/// 1. Pick the highest-fee remaining entry; stop when the pool is exhausted
/// 2. For each input in order, mark its outpoint spent, then validate it
/// 3. Accepted: delete from the pool and accumulate id, fee and weight
/// 4. Recoverable failure: delete from the pool and record the rejection
/// 5. Any other failure aborts selection
///
/// The last accepted transaction may carry the weight past `budget`.
pub fn select_transactions<P: PoolStore + ?Sized>(
    pool: &P,
    verifier: &ScriptVerifier,
    budget: u64,
    rejections: &RejectionLog,
) -> Result<BlockCandidate> {
    let mut candidate = BlockCandidate::default();

    while candidate.weight < budget {
        let Some(entry) = pool.pick_best()? else {
            debug!("pool exhausted");
            break;
        };

        match spend_inputs(pool, verifier, &entry) {
            Ok(()) => {
                pool.delete(entry.id)?;
                debug!(
                    "selected {} fee={} weight={}",
                    display_hash(&entry.txid),
                    entry.fee,
                    entry.weight
                );
                candidate.accept(&entry);
            }
            Err(err) if err.is_recoverable() => {
                pool.delete(entry.id)?;
                debug!("rejected {}: {}", display_hash(&entry.txid), err);
                rejections.record(display_hash(&entry.txid), &err)?;
                candidate.rejected += 1;
                if err.is_conflict() {
                    candidate.conflicts += 1;
                }
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        "selected {} transactions: fees={} weight={} rejected={} conflicts={}",
        candidate.len(),
        candidate.fees,
        candidate.weight,
        candidate.rejected,
        candidate.conflicts
    );
    Ok(candidate)
}

// outpoints stay marked even if a later input fails
fn spend_inputs<P: PoolStore + ?Sized>(
    pool: &P,
    verifier: &ScriptVerifier,
    entry: &MempoolEntry,
) -> Result<()> {
    for input in pool.inputs(&entry.txid)? {
        pool.mark_spent(&input.outpoint)?;
        verifier.validate_input(&entry.tx, input.input_index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::mempool::MemoryPool;
    use crate::types::*;

    #[test]
    fn test_selects_in_fee_order() {
        let (pool, log, _dir) = create_test_pool();
        let fees = [3_000u64, 8_000, 1_500, 5_000];
        for (seed, fee) in fees.iter().enumerate() {
            pool.insert(create_test_transaction(seed as u8, 0, *fee, ScriptType::P2tr)).unwrap();
        }

        let candidate = select_transactions(&pool, &ScriptVerifier::new(), u64::MAX, &log).unwrap();
        let expected: Vec<Hash> = [1u8, 3, 0, 2]
            .iter()
            .map(|seed| {
                create_test_transaction(*seed, 0, fees[*seed as usize], ScriptType::P2tr)
                    .txid()
                    .unwrap()
            })
            .collect();
        assert_eq!(candidate.txids, expected);
        assert_eq!(candidate.fees, 17_500);
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn test_budget_bounds_weight() {
        let (pool, log, _dir) = create_test_pool();
        for seed in 0..10u8 {
            pool.insert(create_test_transaction(seed, 0, 2_000 + seed as u64, ScriptType::P2tr)).unwrap();
        }
        let weight = create_test_transaction(0, 0, 2_000, ScriptType::P2tr).weight().unwrap();

        let budget = weight * 3 + 1;
        let candidate = select_transactions(&pool, &ScriptVerifier::new(), budget, &log).unwrap();
        assert_eq!(candidate.len(), 4);
        assert!(candidate.weight >= budget);
        assert!(candidate.weight < budget + weight);
        assert_eq!(pool.len().unwrap(), 6);
    }

    #[test]
    fn test_double_spend_is_conflict() {
        let (pool, log, _dir) = create_test_pool();
        // same outpoint, different outputs
        pool.insert(create_test_transaction(7, 0, 4_000, ScriptType::P2tr)).unwrap();
        pool.insert(create_test_transaction(7, 0, 2_000, ScriptType::P2tr)).unwrap();

        let candidate = select_transactions(&pool, &ScriptVerifier::new(), u64::MAX, &log).unwrap();
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate.fees, 4_000);
        assert_eq!(candidate.rejected, 1);
        assert_eq!(candidate.conflicts, 1);
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn test_invalid_input_evicted_and_logged() {
        let (pool, log, dir) = create_test_pool();
        let bad = create_test_transaction(1, 0, 9_000, ScriptType::Unknown);
        let bad_txid = bad.txid().unwrap();
        pool.insert(bad).unwrap();
        pool.insert(create_test_transaction(2, 0, 1_000, ScriptType::P2pk)).unwrap();

        let candidate = select_transactions(&pool, &ScriptVerifier::new(), u64::MAX, &log).unwrap();
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate.rejected, 1);
        assert_eq!(candidate.conflicts, 0);

        log.flush().unwrap();
        let text = std::fs::read_to_string(dir.path().join("rejected.txt")).unwrap();
        assert_eq!(
            text.trim_end(),
            format!("{} Reason: Script validation failed: unknown script type", display_hash(&bad_txid))
        );
    }

    #[test]
    fn test_rejected_outpoints_stay_spent() {
        let (pool, log, _dir) = create_test_pool();
        // two inputs: the first is marked, the second fails validation
        let mut bad = create_test_transaction(3, 0, 9_000, ScriptType::P2tr);
        let mut second = bad.vin[0].clone();
        second.vout = 1;
        second.prevout.as_mut().unwrap().scriptpubkey_type = ScriptType::OpReturn;
        second.prevout.as_mut().unwrap().value = 0;
        bad.vin.push(second);
        pool.insert(bad).unwrap();
        pool.insert(create_test_transaction(3, 0, 1_000, ScriptType::P2tr)).unwrap();

        let candidate = select_transactions(&pool, &ScriptVerifier::new(), u64::MAX, &log).unwrap();
        assert!(candidate.is_empty());
        assert_eq!(candidate.rejected, 2);
        assert_eq!(candidate.conflicts, 1);
    }

    #[test]
    fn test_empty_pool() {
        let (pool, log, _dir) = create_test_pool();
        let candidate = select_transactions(&pool, &ScriptVerifier::new(), u64::MAX, &log).unwrap();
        assert_eq!(candidate, BlockCandidate::default());
    }

    // ============================================================================
    // HELPER FUNCTIONS
    // ============================================================================

    fn create_test_pool() -> (MemoryPool, RejectionLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let log = RejectionLog::create(dir.path().join("rejected.txt")).unwrap();
        (MemoryPool::new(PoolConfig::default()), log, dir)
    }

    fn create_test_transaction(seed: u8, vout: u32, fee: u64, script_type: ScriptType) -> Transaction {
        Transaction {
            version: 2,
            locktime: 0,
            vin: vec![TxIn {
                txid: format!("{:02x}", seed).repeat(32),
                vout,
                prevout: Some(TxOut::new(50_000, "51", script_type)),
                sequence: 0xffffffff,
                ..TxIn::default()
            }],
            vout: vec![TxOut::new(50_000 - fee, "51", ScriptType::Unknown)],
        }
    }
}
