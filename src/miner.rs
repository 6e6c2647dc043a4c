//! Block assembly: select, build the coinbase, commit, mine and write

use crate::block::{merkle_root, witness_commitment, Target};
use crate::config::MinerConfig;
use crate::encoding::display_hash;
use crate::error::{MinerError, Result};
use crate::mempool::PoolStore;
use crate::mining::{create_coinbase_transaction, search_nonce};
use crate::output::{write_block, RejectionLog};
use crate::selection::{select_transactions, BlockCandidate};
use crate::types::*;
use crate::validation::ScriptVerifier;
use log::info;
use std::sync::atomic::AtomicBool;
use std::time::{SystemTime, UNIX_EPOCH};

/// A solved block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub header: BlockHeader,
    pub coinbase: Transaction,
    /// Coinbase txid first, then the selected transactions in selection order
    pub txids: Vec<Hash>,
    pub candidate: BlockCandidate,
}

impl MinedBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

/// Runs one mining round against a pool store
pub struct Miner<'a, P: PoolStore + ?Sized> {
    pool: &'a P,
    config: MinerConfig,
    verifier: ScriptVerifier,
    rejections: &'a RejectionLog,
}

impl<'a, P: PoolStore + ?Sized> Miner<'a, P> {
    pub fn new(pool: &'a P, config: MinerConfig, rejections: &'a RejectionLog) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            verifier: ScriptVerifier::new(),
            rejections,
        })
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine a block with the header timestamp set to now
    pub fn mine(&self) -> Result<MinedBlock> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| MinerError::Mining(err.to_string()))?;
        self.mine_at(now.as_secs() as u32)
    }

    /// MineBlock: 𝒫 × ℕ → ℬ
    ///
    /// 1. Select transactions up to the weight budget
    /// 2. Commit to their wtxids behind the coinbase's zero wtxid
    /// 3. Build the coinbase paying the collected fees
    /// 4. Merkle root over coinbase txid followed by the selected txids
    /// 5. Search for a nonce meeting the configured target
    pub fn mine_at(&self, timestamp: u32) -> Result<MinedBlock> {
        let block = &self.config.block;

        // 1. Selection
        let candidate = select_transactions(
            self.pool,
            &self.verifier,
            block.max_weight,
            self.rejections,
        )?;

        // 2. Witness commitment
        let mut wtxids = Vec::with_capacity(candidate.len() + 1);
        wtxids.push([0u8; 32]);
        wtxids.extend_from_slice(&candidate.wtxids);
        let commitment = witness_commitment(&wtxids);

        // 3. Coinbase
        let coinbase = create_coinbase_transaction(
            candidate.fees,
            &commitment,
            block.height,
            &self.config.payout_script()?,
        );

        // 4. Merkle root
        let mut txids = Vec::with_capacity(candidate.len() + 1);
        txids.push(coinbase.txid()?);
        txids.extend_from_slice(&candidate.txids);
        let root = merkle_root(&txids)
            .ok_or_else(|| MinerError::Mining("no transactions to commit".into()))?;

        // 5. Proof of work
        let template = BlockHeader::new(block.version, root, timestamp, block.bits);
        let target = Target::from_compact(block.bits);
        let stop = AtomicBool::new(false);
        let header = search_nonce(&template, &target, self.config.mining_workers, &stop)
            .ok_or_else(|| MinerError::Mining("nonce space exhausted".into()))?;

        info!(
            "mined block {} nonce={} txs={} fees={} weight={}",
            display_hash(&header.hash()),
            header.nonce,
            txids.len(),
            candidate.fees,
            candidate.weight
        );

        Ok(MinedBlock {
            header,
            coinbase,
            txids,
            candidate,
        })
    }

    /// Mine, write the artifact to the configured path and flush the rejection log
    pub fn run(&self) -> Result<MinedBlock> {
        let mined = self.mine()?;
        write_block(
            &self.config.output_path,
            &mined.header,
            &mined.coinbase,
            &mined.txids,
        )?;
        self.rejections.flush()?;
        info!("wrote {}", self.config.output_path.display());
        Ok(mined)
    }
}
