//! Output artifact and rejection log writers

use crate::encoding::display_hash;
use crate::error::{PoolError, Result};
use crate::types::*;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Write the mined block artifact, replacing any previous file
///
/// Line 1: serialized header (hex)
/// Line 2: serialized coinbase including witness (hex)
/// Then one display-order txid per line, coinbase first.
pub fn write_block(
    path: impl AsRef<Path>,
    header: &BlockHeader,
    coinbase: &Transaction,
    txids: &[Hash],
) -> Result<()> {
    let coinbase_bytes = coinbase.serialize_with_witness()?;

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", hex::encode(header.serialize()))?;
    writeln!(out, "{}", hex::encode(coinbase_bytes))?;
    for txid in txids {
        writeln!(out, "{}", display_hash(txid))?;
    }

    let file = out.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Append-only log of rejected transactions: `<id> Reason: <error>`
///
/// Shared by the ingestion workers and the selection loop.
pub struct RejectionLog {
    out: Mutex<BufWriter<File>>,
}

impl RejectionLog {
    /// Truncate or create the log
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_file(File::create(path)?))
    }

    /// Open the log for appending, creating it if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: File) -> Self {
        Self {
            out: Mutex::new(BufWriter::new(file)),
        }
    }

    pub fn record(&self, id: impl Display, reason: impl Display) -> Result<()> {
        let mut out = self.out.lock().map_err(|_| PoolError::Poisoned)?;
        writeln!(out, "{} Reason: {}", id, reason)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        let mut out = self.out.lock().map_err(|_| PoolError::Poisoned)?;
        out.flush()?;
        Ok(())
    }
}

impl Drop for RejectionLog {
    fn drop(&mut self) {
        if let Ok(out) = self.out.get_mut() {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_BITS;

    #[test]
    fn test_write_block_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");

        let header = BlockHeader::new(2, [0u8; 32], 0, DEFAULT_BITS);
        let coinbase = create_test_transaction();
        let mut txid = [0u8; 32];
        txid[0] = 0xab;

        std::fs::write(&path, "stale contents\n".repeat(10)).unwrap();
        write_block(&path, &header, &coinbase, &[txid]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 160);
        assert_eq!(lines[1], hex::encode(coinbase.serialize_with_witness().unwrap()));
        assert!(lines[2].ends_with("ab"));
        assert!(lines[2].starts_with("00"));
    }

    #[test]
    fn test_write_block_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("output.txt");
        let header = BlockHeader::new(2, [0u8; 32], 0, DEFAULT_BITS);
        assert!(matches!(
            write_block(&path, &header, &create_test_transaction(), &[]),
            Err(crate::error::MinerError::Io(_))
        ));
    }

    #[test]
    fn test_rejection_log_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rejected.txt");

        let log = RejectionLog::create(&path).unwrap();
        log.record("tx1.json", "Pool error: pool full: 3 transactions").unwrap();
        log.record("abcd", "Already spent").unwrap();
        log.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "tx1.json Reason: Pool error: pool full: 3 transactions\nabcd Reason: Already spent\n"
        );

        drop(log);
        let log = RejectionLog::open(&path).unwrap();
        log.record("efgh", "late").unwrap();
        drop(log);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("efgh Reason: late\n"));
    }

    // ============================================================================
    // HELPER FUNCTIONS
    // ============================================================================

    fn create_test_transaction() -> Transaction {
        Transaction {
            version: 2,
            locktime: 0,
            vin: vec![TxIn {
                txid: "00".repeat(32),
                vout: 0xffffffff,
                scriptsig: "0101".to_string(),
                witness: vec!["00".repeat(32)],
                sequence: 0xffffffff,
                ..TxIn::default()
            }],
            vout: vec![TxOut::new(0, "51", ScriptType::Unknown)],
        }
    }
}
