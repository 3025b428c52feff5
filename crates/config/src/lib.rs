//! # Config
//!
//! Typed configuration shared by the `bitcask` and `lsm` engine crates.
//!
//! Every field here corresponds to one of the "recognized options" of the
//! storage core: where data lives on disk, and the thresholds that govern
//! rotation, flushing, and the sparse index. Defaults match the documented
//! production defaults, not arbitrary test-friendly values.

use std::path::PathBuf;

/// 128 MiB, the default Bitcask segment rotation threshold.
pub const DEFAULT_SEGMENT_BYTE_LIMIT: u64 = 128 * 1024 * 1024;

/// 16 MiB, the default LSM memtable flush threshold.
pub const DEFAULT_MEMTABLE_BYTE_LIMIT: usize = 16 * 1024 * 1024;

/// 20ms, the default Bitcask periodic fsync interval.
pub const DEFAULT_FSYNC_INTERVAL_MS: u64 = 20;

/// One sparse index entry per 64 data entries, by default.
pub const DEFAULT_SPARSE_INDEX_STRIDE: usize = 64;

/// Number of oldest tables picked per LSM compaction round.
pub const DEFAULT_COMPACTION_FAN_IN: usize = 3;

/// Settings shared by both engine families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding all of this engine's on-disk files. Created if absent.
    pub data_directory: PathBuf,
}

impl EngineConfig {
    /// Creates a config rooted at `data_directory`.
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
        }
    }
}

/// Bitcask-specific tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcaskConfig {
    pub engine: EngineConfig,
    /// Rotate to a new segment once the active segment reaches this size.
    pub segment_byte_limit: u64,
    /// Period between background fsyncs of the active segment. `0` disables
    /// the periodic fsync task entirely.
    pub fsync_interval_ms: u64,
}

impl BitcaskConfig {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineConfig::new(data_directory),
            segment_byte_limit: DEFAULT_SEGMENT_BYTE_LIMIT,
            fsync_interval_ms: DEFAULT_FSYNC_INTERVAL_MS,
        }
    }
}

/// LSM-specific tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsmConfig {
    pub engine: EngineConfig,
    /// Flush the memtable once its approximate byte footprint reaches this size.
    pub memtable_byte_limit: usize,
    /// Emit one sparse-index entry per this many sorted-table data entries.
    pub sparse_index_stride: usize,
    /// Number of oldest tables a manual `compact()` call merges at a time.
    pub compaction_fan_in: usize,
    /// If true, fsync the WAL after every append (stronger durability, slower
    /// writes). Off by default: spec.md leaves per-append fsync to the
    /// implementer, favoring rotation/flush-time fsyncs only.
    pub wal_sync_on_append: bool,
}

impl LsmConfig {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineConfig::new(data_directory),
            memtable_byte_limit: DEFAULT_MEMTABLE_BYTE_LIMIT,
            sparse_index_stride: DEFAULT_SPARSE_INDEX_STRIDE,
            compaction_fan_in: DEFAULT_COMPACTION_FAN_IN,
            wal_sync_on_append: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitcask_defaults_match_spec() {
        let cfg = BitcaskConfig::new("/tmp/db");
        assert_eq!(cfg.segment_byte_limit, 128 * 1024 * 1024);
        assert_eq!(cfg.fsync_interval_ms, 20);
    }

    #[test]
    fn lsm_defaults_match_spec() {
        let cfg = LsmConfig::new("/tmp/db");
        assert_eq!(cfg.memtable_byte_limit, 16 * 1024 * 1024);
        assert_eq!(cfg.sparse_index_stride, 64);
    }
}
