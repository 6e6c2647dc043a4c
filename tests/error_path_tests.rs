//! Tests for error paths and edge cases

use utxo_miner::error::{DecodeError, PoolError, ScriptError};
use utxo_miner::mempool::MemoryPool;
use utxo_miner::output::RejectionLog;
use utxo_miner::sighash::{segwit_sighash, SighashType};
use utxo_miner::validation::ScriptVerifier;
use utxo_miner::*;

#[test]
fn test_malformed_hex_is_decode_error() {
    let mut tx = create_test_transaction(ScriptType::P2tr);
    tx.vin[0].witness = vec!["abc".to_string()];

    let err = tx.wtxid().unwrap_err();
    assert!(matches!(err, MinerError::Decode(DecodeError::Hex { .. })));
    assert!(err.is_recoverable());
    assert!(!err.is_conflict());
}

#[test]
fn test_bad_txid_length() {
    let mut tx = create_test_transaction(ScriptType::P2tr);
    tx.vin[0].txid = "abcd".to_string();
    assert!(matches!(
        tx.txid(),
        Err(MinerError::Decode(DecodeError::InvalidLength { expected: 32, actual: 2 }))
    ));
}

#[test]
fn test_truncated_bytes() {
    assert!(matches!(
        Transaction::from_bytes(&[0x02, 0x00, 0x00]),
        Err(MinerError::Decode(DecodeError::UnexpectedEof { .. }))
    ));
    assert!(matches!(
        Transaction::from_bytes(&[]),
        Err(MinerError::Decode(DecodeError::UnexpectedEof { .. }))
    ));
}

#[test]
fn test_p2wpkh_with_legacy_prevout_script() {
    let mut tx = create_test_transaction(ScriptType::P2wpkh);
    tx.vin[0].witness = vec!["3001".to_string(), "02".to_string()];
    assert!(matches!(
        segwit_sighash(&tx, 0, SighashType::All),
        Err(MinerError::Script(ScriptError::MalformedWitnessProgram))
    ));
    assert!(matches!(
        ScriptVerifier::new().validate_transaction(&tx),
        Err(MinerError::Script(ScriptError::MalformedWitnessProgram))
    ));
}

#[test]
fn test_unsupported_sighash_byte() {
    let mut tx = create_test_transaction(ScriptType::P2wpkh);
    tx.vin[0].prevout.as_mut().unwrap().scriptpubkey = "0014".to_string() + &"11".repeat(20);
    tx.vin[0].witness = vec!["300102".to_string(), "02".to_string()];
    assert!(matches!(
        ScriptVerifier::new().validate_transaction(&tx),
        Err(MinerError::Script(ScriptError::UnsupportedSighash(0x02)))
    ));

    tx.vin[0].witness = vec![String::new(), "02".to_string()];
    assert!(matches!(
        ScriptVerifier::new().validate_transaction(&tx),
        Err(MinerError::Script(ScriptError::EmptySignature))
    ));
}

#[test]
fn test_legacy_single_anyonecanpay_rejected() {
    let mut tx = create_test_transaction(ScriptType::P2pkh);
    tx.vin[0].prevout.as_mut().unwrap().scriptpubkey =
        "76a914".to_string() + &"11".repeat(20) + "88ac";
    tx.vin[0].scriptsig_asm = format!("OP_PUSHBYTES_3 300183 OP_PUSHBYTES_33 02{}", "22".repeat(32));
    assert!(matches!(
        ScriptVerifier::new().validate_transaction(&tx),
        Err(MinerError::Script(ScriptError::UnsupportedSighash(0x83)))
    ));
}

#[test]
fn test_missing_witness_script() {
    let tx = create_test_transaction(ScriptType::P2wsh);
    assert!(matches!(
        ScriptVerifier::new().validate_transaction(&tx),
        Err(MinerError::Script(ScriptError::MissingWitnessScript))
    ));
}

#[test]
fn test_pool_errors_are_not_recoverable() {
    let pool = MemoryPool::new(config::PoolConfig { max_pool_size: 0, dust: 0 });
    let err = pool.insert(create_test_transaction(ScriptType::P2tr)).unwrap_err();
    assert!(matches!(err, MinerError::Pool(PoolError::PoolFull(0))));
    assert!(!err.is_recoverable());
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let log = RejectionLog::create(dir.path().join("rejected.txt")).unwrap();
    let pool = MemoryPool::new(config::PoolConfig::default());
    let config = MinerConfig {
        mining_workers: 1,
        output_path: dir.path().join("no-such-dir").join("output.txt"),
        ..MinerConfig::default()
    };

    let miner = Miner::new(&pool, config, &log).unwrap();
    assert!(matches!(miner.run(), Err(MinerError::Io(_))));
}

#[test]
fn test_rejection_log_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        RejectionLog::create(dir.path().join("a").join("b.txt")),
        Err(MinerError::Io(_))
    ));
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn create_test_transaction(script_type: ScriptType) -> Transaction {
    Transaction {
        version: 2,
        locktime: 0,
        vin: vec![TxIn {
            txid: "ef".repeat(32),
            vout: 0,
            prevout: Some(TxOut::new(5_000, "51", script_type)),
            sequence: 0xffffffff,
            ..TxIn::default()
        }],
        vout: vec![TxOut::new(1_000, "51", ScriptType::Unknown)],
    }
}
