use kvcontract::KvError;

use crate::BitcaskEngine;

pub fn read(engine: &BitcaskEngine, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
    let position = match engine.index.get(key) {
        Some(entry) => *entry,
        None => return Ok(None),
    };

    match segment::read_at(engine.dir(), position)? {
        Some(record) if record.is_tombstone() => Ok(None),
        Some(record) => Ok(record.value),
        None => Ok(None),
    }
}

/// `DashMap` keeps no key ordering, so a range read collects every live key
/// in range, sorts it, and only then reads values off disk — O(n log n) over
/// the index rather than a true ordered-map range scan.
pub fn read_range(
    engine: &BitcaskEngine,
    start: &[u8],
    end: &[u8],
    limit: usize,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
    if limit == 0 || start > end {
        return Ok(Vec::new());
    }

    let mut matching: Vec<(Vec<u8>, segment::Position)> = engine
        .index
        .iter()
        .filter(|entry| entry.key().as_slice() >= start && entry.key().as_slice() <= end)
        .map(|entry| (entry.key().clone(), *entry.value()))
        .collect();
    matching.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = Vec::with_capacity(matching.len().min(limit));
    for (key, position) in matching {
        if out.len() >= limit {
            break;
        }
        if let Some(record) = segment::read_at(engine.dir(), position)? {
            if let Some(value) = record.value {
                out.push((key, value));
            }
        }
    }
    Ok(out)
}
