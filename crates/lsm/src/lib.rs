//! # LSM engine
//!
//! The central orchestrator tying [`memtable`], [`wal`], and [`sstable`]
//! together into a log-structured key-value store.
//!
//! ```text
//! write path:  WAL append -> memtable mutate -> (threshold exceeded?) -> flush
//! read path:   memtable -> manifest readers, newest table first
//! ```
//!
//! Unlike the multi-level donor this crate grew out of, there is no L0/L1
//! split: [`manifest::Manifest`] keeps one flat, newest-first list of
//! tables, and compaction merges the oldest `N` of them at a time
//! (size-tiered, manual). See `SPEC_FULL.md` §4.7 for the full write/read/
//! compaction contract.

mod compaction;
mod manifest;
mod read;
mod recovery;
mod write;

use config::LsmConfig;
use kvcontract::{KvEngine, KvError};
use manifest::Manifest;
use memtable::Memtable;
use sstable::SsTableError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use wal::{WalError, WalWriter};

const WAL_FILENAME: &str = "wal.log";

/// The LSM engine. The memtable is internally synchronized; the WAL writer
/// and the manifest each sit behind their own lock, matching the donor's
/// "a dedicated lock per rotation/swap point" concurrency model.
pub struct LsmEngine {
    config: LsmConfig,
    memtable: Memtable,
    wal: Mutex<WalWriter>,
    manifest: RwLock<Manifest>,
    next_table_id: AtomicU64,
    started: AtomicBool,
    closed: AtomicBool,
}

impl LsmEngine {
    /// Builds an engine bound to `config`. No I/O happens until
    /// [`start`](KvEngine::start) — callers must call `start` before using
    /// this value, which is why `new` itself cannot fail.
    pub fn new(config: LsmConfig) -> Result<Self, KvError> {
        let memtable = Memtable::new();
        let wal_path = config.engine.data_directory.join(WAL_FILENAME);
        let wal = WalWriter::create(&wal_path, config.wal_sync_on_append).map_err(wal_error)?;
        let manifest = Manifest::load_or_create(&config.engine.data_directory).map_err(KvError::from)?;

        Ok(Self {
            config,
            memtable,
            wal: Mutex::new(wal),
            manifest: RwLock::new(manifest),
            next_table_id: AtomicU64::new(0),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), KvError> {
        if !self.started.load(Ordering::Acquire) || self.closed.load(Ordering::Acquire) {
            return Err(KvError::Lifecycle);
        }
        Ok(())
    }

    fn dir(&self) -> &std::path::Path {
        &self.config.engine.data_directory
    }

    fn next_table_id(&self) -> u64 {
        self.next_table_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl KvEngine for LsmEngine {
    fn start(&self) -> Result<(), KvError> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        std::fs::create_dir_all(self.dir())?;
        recovery::recover(self)?;
        self.started.store(true, Ordering::Release);
        tracing::info!(dir = %self.dir().display(), entries = self.memtable.len(), "lsm engine started");
        Ok(())
    }

    fn close(&self) -> Result<(), KvError> {
        self.ensure_open()?;
        self.wal.lock().unwrap().sync().map_err(wal_error)?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), KvError> {
        self.ensure_open()?;
        write::put(self, key, value)
    }

    fn batch_put(&self, items: Vec<(Vec<u8>, Vec<u8>)>) -> Result<usize, KvError> {
        self.ensure_open()?;
        write::batch_put(self, items)
    }

    fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.ensure_open()?;
        write::delete(self, key)
    }

    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.ensure_open()?;
        read::read(self, key)
    }

    fn read_range(&self, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        self.ensure_open()?;
        read::read_range(self, start, end, limit)
    }

    fn compact(&self) -> Result<u64, KvError> {
        self.ensure_open()?;
        compaction::compact(self)
    }
}

/// Maps a leaf sorted-table error onto the shared contract's error type.
/// A local function rather than `impl From` — neither type is defined in
/// this crate, so a trait impl would violate the orphan rule.
pub(crate) fn sstable_error(err: SsTableError) -> KvError {
    match err {
        SsTableError::Io(e) => KvError::Io(e),
        SsTableError::CorruptFooter | SsTableError::DuplicateKey => KvError::CorruptFooter,
    }
}

/// Maps a leaf WAL error onto the shared contract's error type.
pub(crate) fn wal_error(err: WalError) -> KvError {
    match err {
        WalError::Io(e) => KvError::Io(e),
    }
}

#[cfg(test)]
mod tests;
