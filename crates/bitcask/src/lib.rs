//! # Bitcask engine
//!
//! Append-only log storage: every write lands in the active segment, an
//! in-memory index tracks each live key's most recent `(segment_id,
//! offset)`, and compaction periodically rewrites the live set into a fresh
//! segment to reclaim space held by superseded and deleted entries.
//!
//! Grounded on the sibling example `rskv`'s `engines::bitcask` (`DashMap`
//! index, per-writer mutex, compaction by live-set rewrite), restructured
//! into the donor project's module-per-concern layout and onto this core's
//! own `(segment_id, offset)` position model.

mod compaction;
mod read;
mod recovery;
mod write;

use config::BitcaskConfig;
use dashmap::DashMap;
use kvcontract::{KvEngine, KvError};
use segment::{Position, SegmentWriter};
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The Bitcask engine. Every method takes `&self`; interior mutability
/// comes from the `DashMap` index and a `Mutex`-guarded active segment
/// writer, the same shape the donor-sibling `rskv::Bitcask` uses. The
/// writer and the fsync "stop" flag are `Arc`-wrapped so the periodic
/// fsync thread can share them without borrowing `self`.
pub struct BitcaskEngine {
    config: BitcaskConfig,
    index: DashMap<Vec<u8>, Position>,
    writer: Arc<Mutex<Option<SegmentWriter>>>,
    next_segment_id: AtomicU64,
    started: AtomicBool,
    closed: AtomicBool,
    fsync_stop: Arc<AtomicBool>,
    fsync_thread: Mutex<Option<JoinHandle<()>>>,
}

impl BitcaskEngine {
    /// Builds an engine bound to `config`. No I/O happens until [`start`](Self::start).
    pub fn new(config: BitcaskConfig) -> Self {
        Self {
            config,
            index: DashMap::new(),
            writer: Arc::new(Mutex::new(None)),
            next_segment_id: AtomicU64::new(0),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fsync_stop: Arc::new(AtomicBool::new(false)),
            fsync_thread: Mutex::new(None),
        }
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
}

impl KvEngine for BitcaskEngine {
    fn start(&self) -> Result<(), KvError> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        fs::create_dir_all(self.dir())?;

        let recovered = recovery::recover(self.dir(), &self.index)?;
        self.next_segment_id.store(recovered.next_segment_id, Ordering::SeqCst);

        let active_id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
        let active_writer = SegmentWriter::create(self.dir(), active_id)?;
        *self.writer.lock().unwrap() = Some(active_writer);

        self.started.store(true, Ordering::Release);
        self.fsync_stop.store(false, Ordering::SeqCst);
        *self.fsync_thread.lock().unwrap() = spawn_fsync_thread(
            self.config.fsync_interval_ms,
            self.writer.clone(),
            self.fsync_stop.clone(),
        );
        tracing::info!(dir = %self.dir().display(), keys = self.index.len(), "bitcask engine started");
        Ok(())
    }

    fn close(&self) -> Result<(), KvError> {
        self.ensure_open()?;
        self.fsync_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.fsync_thread.lock().unwrap().take() {
            handle.join().expect("fsync thread panicked");
        }
        if let Some(writer) = self.writer.lock().unwrap().take() {
            writer.fsync()?;
            writer.close();
        }
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

/// Spawns the periodic fsync thread described in spec.md §4.6/§5: a plain OS
/// thread sleeping in `fsync_interval_ms` steps, fsyncing whatever segment is
/// currently active on each tick, until `stop` is flipped by `close()`. An
/// interval of `0` disables the task entirely (returns `None`).
fn spawn_fsync_thread(
    fsync_interval_ms: u64,
    writer: Arc<Mutex<Option<SegmentWriter>>>,
    stop: Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    if fsync_interval_ms == 0 {
        return None;
    }
    let interval = Duration::from_millis(fsync_interval_ms);
    Some(thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            thread::sleep(interval);
            if stop.load(Ordering::SeqCst) {
                break;
            }
            if let Some(active) = writer.lock().unwrap().as_ref() {
                if let Err(err) = active.fsync() {
                    tracing::warn!(%err, "periodic bitcask fsync failed");
                }
            }
        }
    }))
}
