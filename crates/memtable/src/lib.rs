//! # Memtable
//!
//! The LSM engine's in-memory, sorted, concurrent write buffer.
//!
//! Every write lands here first: `put` installs a value, `delete` installs
//! the tombstone sentinel (`None`), both in ascending key order so a flush
//! can stream the contents straight into a sorted table. Lookups and range
//! scans are concurrent with writes via an `RwLock` around the underlying
//! `BTreeMap` — the same "concurrent ordered map, lock-free-ish get, one
//! flusher guards the flush critical section" shape the donor project's
//! sibling storage engines use for their memtables.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// An entry's value slot: `Some(bytes)` for a live value, `None` for a
/// tombstone. Compared by variant, never by content, so a real empty value
/// (`Some(vec![])`) is never mistaken for a delete.
pub type Slot = Option<Vec<u8>>;

/// An in-memory ordered write buffer backed by a `BTreeMap` behind an
/// `RwLock`, with an approximate byte-size counter used to decide when to
/// flush.
#[derive(Debug)]
pub struct Memtable {
    map: RwLock<BTreeMap<Vec<u8>, Slot>>,
    approx_size: AtomicUsize,
}

impl Memtable {
    /// Creates a new, empty memtable.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
            approx_size: AtomicUsize::new(0),
        }
    }

    /// Inserts a live value for `key`.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.upsert(key, Some(value));
    }

    /// Installs a tombstone for `key`, shadowing any older value.
    pub fn delete(&self, key: Vec<u8>) {
        self.upsert(key, None);
    }

    fn upsert(&self, key: Vec<u8>, value: Slot) {
        let mut map = self.map.write().unwrap();
        let added = value.as_ref().map_or(0, Vec::len);
        match map.insert(key.clone(), value) {
            Some(old) => {
                let removed = old.as_ref().map_or(0, Vec::len);
                self.adjust_size(added, removed);
            }
            None => {
                self.adjust_size(key.len() + added, 0);
            }
        }
    }

    fn adjust_size(&self, added: usize, removed: usize) {
        if added >= removed {
            self.approx_size.fetch_add(added - removed, Ordering::Relaxed);
        } else {
            self.approx_size.fetch_sub(removed - added, Ordering::Relaxed);
        }
    }

    /// Looks up `key`. `None` means the key has no entry in this memtable at
    /// all (the caller must consult older sources); `Some(None)` is a
    /// tombstone (a definitive miss); `Some(Some(value))` is a hit.
    pub fn get(&self, key: &[u8]) -> Option<Slot> {
        self.map.read().unwrap().get(key).cloned()
    }

    /// Returns every entry in `[start, end)` (end exclusive when present, or
    /// unbounded above) in ascending key order, snapshot-cloned under the
    /// read lock.
    pub fn range(&self, start: &[u8], end: Option<&[u8]>) -> Vec<(Vec<u8>, Slot)> {
        let map = self.map.read().unwrap();
        let lower = Bound::Included(start.to_vec());
        let upper = match end {
            Some(e) => Bound::Excluded(e.to_vec()),
            None => Bound::Unbounded,
        };
        map.range((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns every entry (including tombstones) in ascending key order.
    /// Used by flush to stream the whole memtable into a sorted table.
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Slot)> {
        self.map
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of entries, including tombstones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().unwrap().len()
    }

    /// `true` if the memtable holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().unwrap().is_empty()
    }

    /// Approximate footprint in bytes: sum of key and value byte lengths.
    /// Used by the engine to decide when to flush.
    #[must_use]
    pub fn approx_size(&self) -> usize {
        self.approx_size.load(Ordering::Relaxed)
    }

    /// Removes all entries and resets the size counter, for reuse after a
    /// flush instead of allocating a fresh memtable.
    pub fn clear(&self) {
        self.map.write().unwrap().clear();
        self.approx_size.store(0, Ordering::Relaxed);
    }
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
