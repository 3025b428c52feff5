//! # Segment
//!
//! The Bitcask append-only segment writer and its companion free functions
//! for reading and replaying segment files.
//!
//! A segment is one numbered, append-only file of [`record::Record`]s named
//! `%020d.seg`. [`SegmentWriter`] owns the active segment's write handle and
//! tracks its size locally; every read opens a **fresh** read-only handle
//! (spec.md §4.2/§9 — writer and readers never share a file position).

use record::{ReadOutcome, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A pointer to one record: which segment, and the byte offset of its header.
///
/// Positions are created once and never mutated. A position can become
/// stale (superseded by a newer write to the same key) without becoming
/// invalid — the bytes it points at are still a well-formed record until
/// that segment is deleted by compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub segment_id: u64,
    pub offset: u64,
}

/// Returns the on-disk filename for segment `id`: a zero-padded 20-digit
/// decimal id with a `.seg` suffix.
pub fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id:020}.seg"))
}

/// Lists every segment id present in `dir`, ascending.
///
/// Segment ids are strictly monotonically increasing across the engine's
/// lifetime, so filename order and numeric order coincide.
pub fn list_segment_ids(dir: &Path) -> io::Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("seg") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if let Ok(id) = stem.parse::<u64>() {
                ids.push(id);
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Append-only writer for one segment file.
///
/// `append` and `append_many` are not internally synchronized — callers
/// that share a `SegmentWriter` across threads must wrap it (the `bitcask`
/// engine crate holds it behind an `Arc<Mutex<_>>`, per spec.md §4.2/§5).
/// What `SegmentWriter` itself guarantees is that every position it returns
/// points at that record's own start offset, including inside a batch: a
/// past bug assigned every record in a batch the same (batch-start) offset,
/// and `append_many` is built specifically so that cannot recur.
pub struct SegmentWriter {
    id: u64,
    file: File,
    size: u64,
}

impl SegmentWriter {
    /// Opens (creating if necessary) the segment file for id `id` in `dir`
    /// for append-only writing. The tracked size is initialized from the
    /// file's current length, so re-opening an existing segment picks up
    /// where it left off.
    pub fn create(dir: &Path, id: u64) -> io::Result<Self> {
        let path = segment_path(dir, id);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self { id, file, size })
    }

    /// The id of the segment this writer owns.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Appends one record, returning its position.
    pub fn append(&mut self, record: &Record) -> io::Result<Position> {
        let offset = self.size;
        let buf = record.encode();
        self.file.write_all(&buf)?;
        self.size += buf.len() as u64;
        Ok(Position {
            segment_id: self.id,
            offset,
        })
    }

    /// Appends every record in `records` as a single write, returning one
    /// position per record, each pointing at that record's own offset (not
    /// the offset of the batch as a whole).
    pub fn append_many(&mut self, records: &[Record]) -> io::Result<Vec<Position>> {
        let mut positions = Vec::with_capacity(records.len());
        let mut buf = Vec::new();
        let mut offset = self.size;

        for record in records {
            positions.push(Position {
                segment_id: self.id,
                offset,
            });
            let encoded = record.encode();
            offset += encoded.len() as u64;
            buf.extend_from_slice(&encoded);
        }

        self.file.write_all(&buf)?;
        self.size = offset;
        Ok(positions)
    }

    /// Flushes data and metadata to stable storage.
    pub fn fsync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Current tracked size of the segment in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Releases the file handle. The file itself is left intact for readers.
    pub fn close(self) {
        drop(self);
    }
}

/// Reads a single record at `position`, opening a fresh read-only handle.
///
/// Returns `Ok(None)` for a torn tail or a clean end-of-file at that offset
/// (both mean "nothing readable here"); `Ok(Some(record))` otherwise.
pub fn read_at(dir: &Path, position: Position) -> io::Result<Option<Record>> {
    let path = segment_path(dir, position.segment_id);
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(position.offset))?;
    let mut reader = BufReader::new(file);
    match Record::read_from(&mut reader)? {
        ReadOutcome::Complete(record, _) => Ok(Some(record)),
        ReadOutcome::Torn | ReadOutcome::Eof => Ok(None),
    }
}

/// Replays every record of segment `id` from the start, in order, calling
/// `apply(offset, record)` for each one that fully decodes.
///
/// Stops at the first torn tail or at clean end-of-file, whichever comes
/// first — both are normal, silent termination conditions, never errors.
pub fn replay_segment<F>(dir: &Path, id: u64, mut apply: F) -> io::Result<()>
where
    F: FnMut(u64, Record),
{
    let file = File::open(segment_path(dir, id))?;
    let mut reader = BufReader::new(file);
    let mut offset = 0u64;

    loop {
        match Record::read_from(&mut reader)? {
            ReadOutcome::Complete(record, len) => {
                apply(offset, record);
                offset += len as u64;
            }
            ReadOutcome::Torn | ReadOutcome::Eof => break,
        }
    }

    Ok(())
}

/// Opens a fresh read handle and reads the full segment into `(offset,
/// record)` pairs, in order, stopping at the first torn tail.
///
/// Convenience wrapper over [`replay_segment`] for callers (compaction,
/// tests) that want the whole segment materialized rather than streamed.
pub fn read_all(dir: &Path, id: u64) -> io::Result<Vec<(u64, Record)>> {
    let mut out = Vec::new();
    replay_segment(dir, id, |offset, record| out.push((offset, record)))?;
    Ok(out)
}

/// Copies the raw encoded bytes of every record at `positions`, in order,
/// into `writer`. Used by compaction to avoid decode/re-encode churn; any
/// position whose record cannot be read cleanly is skipped (defensive —
/// positions in a live index should always be readable).
pub fn copy_records<W: Write>(dir: &Path, positions: &[Position], writer: &mut W) -> io::Result<u64> {
    let mut total = 0u64;
    for &pos in positions {
        if let Some(record) = read_at(dir, pos)? {
            let buf = record.encode();
            writer.write_all(&buf)?;
            total += buf.len() as u64;
        }
    }
    Ok(total)
}
