use kvcontract::KvError;
use record::Record;
use segment::SegmentWriter;

use crate::BitcaskEngine;

pub fn put(engine: &BitcaskEngine, key: Vec<u8>, value: Vec<u8>) -> Result<(), KvError> {
    let record = Record::put(key.clone(), value);
    let mut guard = engine.writer.lock().unwrap();
    let writer = guard.as_mut().ok_or(KvError::Lifecycle)?;
    let position = writer.append(&record)?;
    maybe_rotate(engine, &mut guard)?;
    drop(guard);

    engine.index.insert(key, position);
    Ok(())
}

pub fn delete(engine: &BitcaskEngine, key: &[u8]) -> Result<(), KvError> {
    let record = Record::tombstone(key.to_vec());
    let mut guard = engine.writer.lock().unwrap();
    let writer = guard.as_mut().ok_or(KvError::Lifecycle)?;
    writer.append(&record)?;
    maybe_rotate(engine, &mut guard)?;
    drop(guard);

    engine.index.remove(key);
    Ok(())
}

/// Writes every pair in `items`, in order, as a single batch append; when a
/// key repeats, the later occurrence's position overwrites the earlier in
/// the index, so the last occurrence wins.
pub fn batch_put(engine: &BitcaskEngine, items: Vec<(Vec<u8>, Vec<u8>)>) -> Result<usize, KvError> {
    if items.is_empty() {
        return Ok(0);
    }

    let records: Vec<Record> = items
        .iter()
        .map(|(k, v)| Record::put(k.clone(), v.clone()))
        .collect();

    let mut guard = engine.writer.lock().unwrap();
    let writer = guard.as_mut().ok_or(KvError::Lifecycle)?;
    let positions = writer.append_many(&records)?;
    maybe_rotate(engine, &mut guard)?;
    drop(guard);

    for ((key, _), position) in items.iter().zip(positions) {
        engine.index.insert(key.clone(), position);
    }
    Ok(items.len())
}

fn maybe_rotate(engine: &BitcaskEngine, writer: &mut Option<SegmentWriter>) -> Result<(), KvError> {
    let current_size = writer.as_ref().map(SegmentWriter::size).unwrap_or(0);
    if current_size < engine.config.segment_byte_limit {
        return Ok(());
    }

    let old = writer.take().expect("segment writer present during rotation");
    old.fsync()?;
    old.close();

    let new_id = engine
        .next_segment_id
        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let fresh = SegmentWriter::create(engine.dir(), new_id)?;
    tracing::info!(segment_id = new_id, "bitcask rotated to a new segment");
    *writer = Some(fresh);
    Ok(())
}
