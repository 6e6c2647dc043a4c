//! Bulk loading of JSON transaction files into a pool store
//!
//! A fixed number of scoped workers drain one shared list of files. Files
//! that fail to parse or are refused by the pool are written to the rejection
//! log under their file name and do not stop the run.

use crate::error::{MinerError, PoolError, Result};
use crate::mempool::PoolStore;
use crate::output::RejectionLog;
use crate::types::Transaction;
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Totals for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Parse one transaction from a JSON file
pub fn load_transaction(path: impl AsRef<Path>) -> Result<Transaction> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// `.json` files directly inside `dir`, sorted by name
pub fn list_transaction_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every transaction file in `dir` into `pool` using `workers` threads
pub fn ingest_directory<P: PoolStore + ?Sized>(
    dir: impl AsRef<Path>,
    pool: &P,
    workers: usize,
    rejections: &RejectionLog,
) -> Result<IngestReport> {
    let files = list_transaction_files(dir.as_ref())?;
    info!(
        "ingesting {} files from {} with {} workers",
        files.len(),
        dir.as_ref().display(),
        workers
    );

    let report = ingest_files(&files, pool, workers, rejections)?;
    info!(
        "ingested {} files: {} accepted, {} rejected",
        report.files, report.accepted, report.rejected
    );
    Ok(report)
}

/// Load the given files into `pool`; the worker count is clamped to the file count
pub fn ingest_files<P: PoolStore + ?Sized>(
    files: &[PathBuf],
    pool: &P,
    workers: usize,
    rejections: &RejectionLog,
) -> Result<IngestReport> {
    let cursor = AtomicUsize::new(0);
    let workers = workers.clamp(1, files.len().max(1));

    let totals = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| scope.spawn(|| ingest_worker(files, &cursor, pool, rejections)))
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(MinerError::Mining("ingest worker panicked".into())))
            })
            .collect::<Vec<_>>()
    });

    let mut report = IngestReport {
        files: files.len(),
        ..IngestReport::default()
    };
    for worker_totals in totals {
        let (accepted, rejected) = worker_totals?;
        report.accepted += accepted;
        report.rejected += rejected;
    }
    Ok(report)
}

fn ingest_worker<P: PoolStore + ?Sized>(
    files: &[PathBuf],
    cursor: &AtomicUsize,
    pool: &P,
    rejections: &RejectionLog,
) -> Result<(usize, usize)> {
    let mut accepted = 0;
    let mut rejected = 0;

    loop {
        let Some(path) = files.get(cursor.fetch_add(1, Ordering::Relaxed)) else {
            break;
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match load_transaction(path).and_then(|tx| pool.insert(tx)) {
            Ok(id) => {
                debug!("{} -> pool entry {}", name, id);
                accepted += 1;
            }
            Err(MinerError::Pool(PoolError::Poisoned)) => {
                return Err(PoolError::Poisoned.into());
            }
            Err(err) => {
                warn!("rejected {}: {}", name, err);
                rejections.record(&name, &err)?;
                rejected += 1;
            }
        }
    }

    Ok((accepted, rejected))
}
