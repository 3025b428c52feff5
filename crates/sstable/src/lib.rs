//! # Sorted table
//!
//! Immutable, on-disk, key-sorted storage files for the LSM engine.
//!
//! A table is produced once, by a memtable flush or by compaction, and never
//! modified afterwards — only superseded and eventually deleted. Layout, in
//! order:
//!
//! 1. **Data block**: `[klen: u32 BE][vlen: u32 BE][key][value]` entries,
//!    sorted ascending by key, no duplicate keys. A zero-length value is a
//!    tombstone carried through from the memtable or a compaction.
//! 2. **Sparse index block**: `[klen: u32 BE][key][offset: u64 BE]` — one
//!    entry per `N`th data entry (entry 0 always included), pointing at that
//!    entry's offset in the data block.
//! 3. **Footer** (20 bytes, see [`format`]).

mod format;
mod merge;
mod reader;
mod writer;

pub use merge::k_way_merge;
pub use reader::{SsTableReader, TableLookup};
pub use writer::write_table;

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A value slot as stored in a table: `Some(bytes)` for a live value,
/// `None` for a tombstone.
pub type Slot = Option<Vec<u8>>;

/// Errors surfaced by sorted-table I/O.
///
/// Mid-iteration corruption (a short header, a short payload) is never one
/// of these — it terminates a scan cleanly with whatever was already
/// collected. A bad footer is the one thing that is a hard error, because
/// without it the table can't be located within the file at all.
#[derive(Debug, Error)]
pub enum SsTableError {
    #[error("sstable io error: {0}")]
    Io(#[from] io::Error),
    #[error("sstable footer is corrupt or has the wrong magic")]
    CorruptFooter,
    #[error("duplicate key in sorted table input")]
    DuplicateKey,
}

/// The on-disk filename for table `id`.
pub fn table_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("sst-{id:020}.sst"))
}
