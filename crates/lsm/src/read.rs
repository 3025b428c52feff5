use kvcontract::KvError;
use sstable::k_way_merge;

use crate::{sstable_error, LsmEngine};

/// Looks up a key: memtable first (a tombstone there is a definitive miss),
/// then each manifest table newest to oldest. The first hit wins.
pub fn read(engine: &LsmEngine, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
    if let Some(slot) = engine.memtable.get(key) {
        return Ok(slot);
    }

    let manifest = engine.manifest.read().unwrap();
    for reader in manifest.readers_newest_first() {
        match reader.get(key).map_err(sstable_error)? {
            sstable::TableLookup::Found(value) => return Ok(Some(value)),
            sstable::TableLookup::Tombstone => return Ok(None),
            sstable::TableLookup::NotFound => continue,
        }
    }
    Ok(None)
}

/// Merges the memtable's sub-range with every table's range, newest source
/// winning ties, and returns up to `limit` live entries in key order.
pub fn read_range(engine: &LsmEngine, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
    if limit == 0 || start > end {
        return Ok(Vec::new());
    }

    // The memtable's range is exclusive of `end`; sorted-table ranges are
    // inclusive on both ends (see sstable::SsTableReader::range). Append the
    // exact-`end` memtable entry, if any, so both sources agree on the
    // upper bound before merging.
    let mut memtable_range = engine.memtable.range(start, Some(end));
    if let Some(slot) = engine.memtable.get(end) {
        memtable_range.push((end.to_vec(), slot));
    }
    let mut sources = vec![memtable_range];

    let manifest = engine.manifest.read().unwrap();
    for reader in manifest.readers_newest_first() {
        sources.push(reader.range(start, end).map_err(sstable_error)?);
    }

    Ok(k_way_merge(sources, Some(limit)))
}
