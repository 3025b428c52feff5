use kvcontract::KvError;
use wal::WalEntry;

use crate::{wal_error, LsmEngine};

/// Replays the WAL into the memtable: a put installs the value, a delete
/// installs the tombstone sentinel. The manifest was already loaded by
/// [`LsmEngine::new`], so recovery here only concerns the memtable — tables
/// on disk are already durable and need no replay.
pub fn recover(engine: &LsmEngine) -> Result<(), KvError> {
    let wal_path = engine.wal.lock().unwrap().path().to_path_buf();
    let memtable = &engine.memtable;

    wal::replay(&wal_path, |entry| match entry {
        WalEntry::Put { key, value } => memtable.put(key, value),
        WalEntry::Delete { key } => memtable.delete(key),
    })
    .map_err(wal_error)?;

    Ok(())
}
