use byteorder::{BigEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{decode_footer, FOOTER_LEN};
use crate::{Slot, SsTableError};

/// The outcome of [`SsTableReader::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLookup {
    Found(Vec<u8>),
    Tombstone,
    NotFound,
}

/// A read-only handle onto a sorted table: its path and its fully-loaded
/// sparse index. Every `get`/`range` call opens its own fresh file handle
/// for the data-block scan, so a reader never races a writer or another
/// reader over a shared file position.
#[derive(Debug)]
pub struct SsTableReader {
    path: PathBuf,
    index: Vec<(Vec<u8>, u64)>,
}

impl SsTableReader {
    /// Opens `path`, parses and validates its footer, and loads the sparse
    /// index into memory. A bad magic or a corrupt index checksum is a hard
    /// error — without a trustworthy footer the table can't be located.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SsTableError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < FOOTER_LEN as u64 {
            return Err(SsTableError::CorruptFooter);
        }

        file.seek(SeekFrom::End(-(FOOTER_LEN as i64)))?;
        let mut footer_buf = [0u8; FOOTER_LEN];
        file.read_exact(&mut footer_buf)?;
        let footer = decode_footer(&footer_buf)?;

        let index_len = len - FOOTER_LEN as u64 - footer.index_start;
        file.seek(SeekFrom::Start(footer.index_start))?;
        let mut index_buf = vec![0u8; index_len as usize];
        file.read_exact(&mut index_buf)?;

        let mut hasher = Crc32::new();
        hasher.update(&index_buf);
        if hasher.finalize() != footer.index_crc32 {
            return Err(SsTableError::CorruptFooter);
        }

        let index = parse_index(&index_buf, footer.index_count)?;
        Ok(Self { path, index })
    }

    /// The path of the table file backing this reader.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of sparse index entries.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// `true` if the table has no data entries at all.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks up `key` by binary-searching the sparse index for the greatest
    /// index key `<= key`, then scanning the data block forward from there.
    pub fn get(&self, key: &[u8]) -> Result<TableLookup, SsTableError> {
        let Some(start_offset) = self.floor_offset(key) else {
            return Ok(TableLookup::NotFound);
        };

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(start_offset))?;

        loop {
            match read_data_entry(&mut file)? {
                Some((entry_key, value)) => {
                    if entry_key.as_slice() == key {
                        return Ok(match value {
                            Some(v) => TableLookup::Found(v),
                            None => TableLookup::Tombstone,
                        });
                    }
                    if entry_key.as_slice() > key {
                        return Ok(TableLookup::NotFound);
                    }
                }
                None => return Ok(TableLookup::NotFound),
            }
        }
    }

    /// Returns every entry with key in `[start, end]` (both inclusive), in
    /// ascending order, tombstones included as `None` slots.
    pub fn range(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Slot)>, SsTableError> {
        let mut out = Vec::new();
        let Some(start_offset) = self.floor_offset(start) else {
            return Ok(out);
        };

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(start_offset))?;

        loop {
            match read_data_entry(&mut file)? {
                Some((entry_key, value)) => {
                    if entry_key.as_slice() > end {
                        break;
                    }
                    if entry_key.as_slice() >= start {
                        out.push((entry_key, value));
                    }
                }
                None => break,
            }
        }
        Ok(out)
    }

    /// Returns every entry in the table, in ascending order. Used by
    /// compaction to read a whole table's contents.
    pub fn scan_all(&self) -> Result<Vec<(Vec<u8>, Slot)>, SsTableError> {
        let mut out = Vec::new();
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(0))?;
        while let Some(entry) = read_data_entry(&mut file)? {
            out.push(entry);
        }
        Ok(out)
    }

    /// Byte offset of the data entry the index's floor search lands on for
    /// `key` — the greatest index key `<= key`, or the first data entry if
    /// every index key exceeds `key`.
    ///
    /// Used for both `get` and `range`: the index's literal "first index key
    /// >= start" wording would skip live entries sharing a stride block with
    /// `start` when `start` falls strictly between two index checkpoints;
    /// floor search never does, since it always starts scanning at or before
    /// the target.
    fn floor_offset(&self, key: &[u8]) -> Option<u64> {
        if self.index.is_empty() {
            return None;
        }
        match self.index.binary_search_by(|(k, _)| k.as_slice().cmp(key)) {
            Ok(pos) => Some(self.index[pos].1),
            Err(0) => Some(self.index[0].1),
            Err(pos) => Some(self.index[pos - 1].1),
        }
    }
}

fn parse_index(buf: &[u8], expected_count: u32) -> Result<Vec<(Vec<u8>, u64)>, SsTableError> {
    let mut r = buf;
    let mut out = Vec::with_capacity(expected_count as usize);
    while !r.is_empty() {
        let klen = r.read_u32::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)? as usize;
        if r.len() < klen + 8 {
            return Err(SsTableError::CorruptFooter);
        }
        let key = r[..klen].to_vec();
        r = &r[klen..];
        let offset = r.read_u64::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)?;
        out.push((key, offset));
    }
    Ok(out)
}

/// Reads one data-block entry at the reader's current position.
///
/// `Ok(None)` means a clean stop: either exact end-of-file at an entry
/// boundary, or a short header/payload mid-read — both terminate a scan
/// silently, with no error raised.
fn read_data_entry(file: &mut File) -> Result<Option<(Vec<u8>, Slot)>, SsTableError> {
    let mut header = [0u8; 8];
    match read_fill(file, &mut header)? {
        Fill::Empty | Fill::Partial => return Ok(None),
        Fill::Full => {}
    }
    let mut h = &header[..];
    let klen = h.read_u32::<BigEndian>().unwrap() as usize;
    let vlen = h.read_u32::<BigEndian>().unwrap() as usize;

    let mut key = vec![0u8; klen];
    if let Fill::Partial | Fill::Empty = read_fill(file, &mut key)? {
        return Ok(None);
    }
    let mut value = vec![0u8; vlen];
    if let Fill::Partial | Fill::Empty = read_fill(file, &mut value)? {
        return Ok(None);
    }

    let slot = if vlen == 0 { None } else { Some(value) };
    Ok(Some((key, slot)))
}

enum Fill {
    Full,
    Partial,
    Empty,
}

fn read_fill(file: &mut File, buf: &mut [u8]) -> std::io::Result<Fill> {
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(if read == buf.len() {
        Fill::Full
    } else if read == 0 {
        Fill::Empty
    } else {
        Fill::Partial
    })
}
