//! # kvcontract
//!
//! The abstract key-value contract both engine families implement, and the
//! error type that crosses that boundary.
//!
//! `KvEngine` is `Send + Sync` with every method taking `&self` — each
//! request is served by an independently scheduled thread (donor-sibling
//! `rskv::KvsEngine`'s `Clone + Send` pattern of cheaply-cloneable,
//! internally-`Arc`'d handles, generalized here to `Send + Sync` since
//! neither engine needs `Clone` on the trait itself).

use std::io;
use thiserror::Error;

/// Errors that cross the `KvEngine` boundary.
///
/// Missing keys, an out-of-range offset, or an empty batch are never errors
/// — they are ordinary results (a miss, an empty range, a zero count).
#[derive(Debug, Error)]
pub enum KvError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("sorted table footer is corrupt or has the wrong magic")]
    CorruptFooter,
    #[error("operation invoked before start() or after close()")]
    Lifecycle,
}

/// The shared operations both the Bitcask and LSM engines expose.
///
/// All operations are blocking from the caller's perspective and may
/// signal an I/O failure. `read` reports a miss for an absent key, a
/// tombstoned key, or (Bitcask only) a position that no longer decodes
/// cleanly.
pub trait KvEngine: Send + Sync {
    /// Opens the engine's data directory, replaying whatever durable state
    /// it finds. Must be called before any other operation.
    fn start(&self) -> Result<(), KvError>;

    /// Flushes and releases resources. Operations after `close` fail with
    /// [`KvError::Lifecycle`].
    fn close(&self) -> Result<(), KvError>;

    /// Writes `value` for `key`, replacing any prior value.
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), KvError>;

    /// Writes every `(key, value)` pair in `items`, in order. When the same
    /// key appears more than once, the last occurrence wins. Returns the
    /// number of pairs written (zero for an empty batch — not an error).
    fn batch_put(&self, items: Vec<(Vec<u8>, Vec<u8>)>) -> Result<usize, KvError>;

    /// Reads the current value for `key`, or `None` on a miss.
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError>;

    /// Returns live entries with `start <= key <= end`, in ascending key
    /// order, capped at `limit` entries.
    fn read_range(&self, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError>;

    /// Removes `key`. A delete of an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), KvError>;

    /// Reclaims space occupied by superseded data. Returns the number of
    /// bytes reclaimed (zero or more, never negative).
    fn compact(&self) -> Result<u64, KvError>;
}

#[cfg(test)]
mod tests;
