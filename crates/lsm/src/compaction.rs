use kvcontract::KvError;
use std::collections::BTreeMap;

use crate::{sstable_error, LsmEngine};

/// Merges the oldest `compaction_fan_in` tables into one. A no-op if fewer
/// than two tables exist. Newer-wins semantics: inputs are applied oldest
/// first, then overwritten by newer ones, so a tombstone from a
/// newer-of-the-merged-set input correctly shadows an older value — and is
/// itself preserved in the output rather than dropped, since a table
/// outside this compaction round may still be older still and need it to
/// keep shadowing a stale value.
pub fn compact(engine: &LsmEngine) -> Result<u64, KvError> {
    let mut manifest = engine.manifest.write().unwrap();
    if manifest.len() < 2 {
        return Ok(0);
    }

    let fan_in = engine.config.compaction_fan_in.max(2);
    let oldest = manifest.oldest_n(fan_in);
    if oldest.len() < 2 {
        return Ok(0);
    }

    let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = BTreeMap::new();
    let mut input_size = 0u64;

    // Apply oldest to newest so later entries overwrite earlier ones.
    for filename in oldest.iter().rev() {
        let path = engine.dir().join(filename);
        input_size += path.metadata().map(|m| m.len()).unwrap_or(0);
        let reader = sstable::SsTableReader::open(&path).map_err(sstable_error)?;
        for (key, value) in reader.scan_all().map_err(sstable_error)? {
            merged.insert(key, value);
        }
    }

    let table_id = engine.next_table_id();
    let entries: Vec<(Vec<u8>, Option<Vec<u8>>)> = merged.into_iter().collect();
    let output_path = sstable::write_table(engine.dir(), table_id, entries, engine.config.sparse_index_stride)
        .map_err(sstable_error)?;
    let output_filename = output_path.file_name().unwrap().to_str().unwrap().to_string();

    manifest.replace(&oldest, output_filename)?;
    manifest.store_atomic()?;
    drop(manifest);

    for filename in &oldest {
        let _ = std::fs::remove_file(engine.dir().join(filename));
    }

    tracing::info!(table_id, inputs = oldest.len(), "lsm compaction complete");
    Ok(input_size)
}
