use dashmap::DashMap;
use kvcontract::KvError;
use segment::Position;
use std::path::Path;

pub struct Recovered {
    pub next_segment_id: u64,
}

/// Replays every existing segment, oldest to newest, into `index`: a put
/// installs the key's position, a tombstone removes the key from the index
/// entirely (per the data model's invariant — the index never holds a
/// position for a deleted key).
pub fn recover(dir: &Path, index: &DashMap<Vec<u8>, Position>) -> Result<Recovered, KvError> {
    let ids = segment::list_segment_ids(dir)?;

    for &id in &ids {
        segment::replay_segment(dir, id, |offset, record| {
            if record.is_tombstone() {
                index.remove(&record.key);
            } else {
                index.insert(record.key.clone(), Position { segment_id: id, offset });
            }
        })?;
    }

    let next_segment_id = ids.iter().max().map_or(0, |max| max + 1);
    tracing::debug!(segments = ids.len(), keys = index.len(), "bitcask recovery complete");
    Ok(Recovered { next_segment_id })
}
