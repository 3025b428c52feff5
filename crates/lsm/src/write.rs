use kvcontract::KvError;
use wal::WalEntry;

use crate::{sstable_error, wal_error, LsmEngine};

pub fn put(engine: &LsmEngine, key: Vec<u8>, value: Vec<u8>) -> Result<(), KvError> {
    append_and_apply(engine, WalEntry::Put { key: key.clone(), value: value.clone() }, || engine.memtable.put(key, value))
}

pub fn delete(engine: &LsmEngine, key: &[u8]) -> Result<(), KvError> {
    append_and_apply(engine, WalEntry::Delete { key: key.to_vec() }, || engine.memtable.delete(key.to_vec()))
}

pub fn batch_put(engine: &LsmEngine, items: Vec<(Vec<u8>, Vec<u8>)>) -> Result<usize, KvError> {
    if items.is_empty() {
        return Ok(0);
    }

    let mut wal = engine.wal.lock().unwrap();
    for (key, value) in &items {
        wal.append(&WalEntry::Put { key: key.clone(), value: value.clone() }).map_err(wal_error)?;
    }
    drop(wal);

    for (key, value) in items.iter().cloned() {
        engine.memtable.put(key, value);
    }

    maybe_flush(engine)?;
    Ok(items.len())
}

fn append_and_apply(engine: &LsmEngine, entry: WalEntry, apply: impl FnOnce()) -> Result<(), KvError> {
    engine.wal.lock().unwrap().append(&entry).map_err(wal_error)?;
    apply();
    maybe_flush(engine)
}

fn maybe_flush(engine: &LsmEngine) -> Result<(), KvError> {
    if engine.memtable.approx_size() >= engine.config.memtable_byte_limit {
        flush(engine)?;
    }
    Ok(())
}

/// Snapshots the memtable in key order, clears it, writes a new sorted
/// table (tombstones encoded as zero-length values), rotates the WAL, and
/// prepends the table to the manifest. The manifest is not persisted until
/// the table file and its directory are durable — already guaranteed by
/// [`sstable::write_table`].
pub fn flush(engine: &LsmEngine) -> Result<(), KvError> {
    if engine.memtable.is_empty() {
        return Ok(());
    }

    let entries = engine.memtable.snapshot();
    engine.memtable.clear();

    let table_id = engine.next_table_id();
    let path = sstable::write_table(engine.dir(), table_id, entries, engine.config.sparse_index_stride).map_err(sstable_error)?;
    let filename = path.file_name().unwrap().to_str().unwrap().to_string();

    let mut manifest = engine.manifest.write().unwrap();
    manifest.add_head(filename)?;
    manifest.store_atomic()?;
    drop(manifest);

    let timestamp = table_id;
    engine.wal.lock().unwrap().rotate(timestamp).map_err(wal_error)?;

    tracing::info!(table_id, "lsm memtable flushed");
    Ok(())
}
