//! # WAL — write-ahead log
//!
//! Durability for the LSM engine: every mutation is framed and appended here
//! before it touches the memtable.
//!
//! ## Frame format
//!
//! ```text
//! [magic: u32 BE = 0x57414C31][crc32: u32 BE][op: u8][klen: u32 BE][vlen: u32 BE][key][value]
//! ```
//!
//! `crc32` covers `(op, klen, vlen, key, value)`, not the magic. `replay`
//! scans frame by frame from offset zero; a wrong magic, a short read, or a
//! CRC mismatch all stop replay cleanly at that point (a torn tail, never a
//! surfaced error) — there is no byte-level resynchronization, the magic is
//! a frame marker, not a search target.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const MAGIC: u32 = 0x5741_4C31;
const OP_PUT: u8 = 0;
const OP_DELETE: u8 = 1;
const HEADER_LEN: usize = 4 + 4 + 1 + 4 + 4;

/// One logical mutation recorded in the WAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalEntry {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl WalEntry {
    fn op(&self) -> u8 {
        match self {
            WalEntry::Put { .. } => OP_PUT,
            WalEntry::Delete { .. } => OP_DELETE,
        }
    }

    fn key(&self) -> &[u8] {
        match self {
            WalEntry::Put { key, .. } => key,
            WalEntry::Delete { key } => key,
        }
    }

    fn value(&self) -> &[u8] {
        match self {
            WalEntry::Put { value, .. } => value,
            WalEntry::Delete { .. } => &[],
        }
    }

    fn encode(&self) -> Vec<u8> {
        let key = self.key();
        let value = self.value();
        let mut crc_body = Vec::with_capacity(1 + 4 + 4 + key.len() + value.len());
        crc_body.push(self.op());
        crc_body.write_u32::<BigEndian>(key.len() as u32).unwrap();
        crc_body.write_u32::<BigEndian>(value.len() as u32).unwrap();
        crc_body.extend_from_slice(key);
        crc_body.extend_from_slice(value);

        let mut hasher = Crc32::new();
        hasher.update(&crc_body);
        let crc = hasher.finalize();

        let mut buf = Vec::with_capacity(HEADER_LEN + key.len() + value.len());
        buf.write_u32::<BigEndian>(MAGIC).unwrap();
        buf.write_u32::<BigEndian>(crc).unwrap();
        buf.extend_from_slice(&crc_body);
        buf
    }
}

/// Errors that can occur performing I/O against a WAL file.
///
/// Frame-level corruption is never one of these variants — it is a silent,
/// clean stop to replay, not a failure the caller must handle.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] io::Error),
}

/// Appends frames to the active WAL file.
///
/// `append` serializes concurrent writers through `&mut self`; the `lsm`
/// engine crate shares one writer across threads behind an `Arc<Mutex<_>>`.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    sync_on_append: bool,
}

impl WalWriter {
    /// Opens (creating if necessary) the WAL file at `path` for appending.
    pub fn create(path: impl AsRef<Path>, sync_on_append: bool) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            sync_on_append,
        })
    }

    /// Appends one entry. Fsyncs immediately when `sync_on_append` was set.
    pub fn append(&mut self, entry: &WalEntry) -> Result<(), WalError> {
        let buf = entry.encode();
        self.file.write_all(&buf)?;
        if self.sync_on_append {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Fsyncs the active file explicitly (used by the periodic background
    /// fsync loop when `sync_on_append` is false).
    pub fn sync(&self) -> Result<(), WalError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Rotates the active WAL out of the way: fsync, close, atomically
    /// rename to `wal-<timestamp>.log`, fsync the containing directory,
    /// then reopen a fresh active file at the original path.
    ///
    /// Returns the path the old WAL was archived to.
    pub fn rotate(&mut self, timestamp: u64) -> Result<PathBuf, WalError> {
        self.file.sync_all()?;

        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let archived = dir.join(format!("wal-{timestamp}.log"));

        fs::rename(&self.path, &archived)?;
        fsync_dir(&dir)?;

        let fresh = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.file = fresh;

        info!(archived = %archived.display(), "rotated wal");
        Ok(archived)
    }

    /// The path of the currently active WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

/// Scans a WAL file from offset zero, calling `apply` for each complete
/// frame in order. Stops silently at the first wrong magic, short read, or
/// CRC mismatch — whatever came before is the full, trustworthy recovery.
pub fn replay<F>(path: impl AsRef<Path>, mut apply: F) -> Result<(), WalError>
where
    F: FnMut(WalEntry),
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut frames = 0u64;

    loop {
        let mut magic_buf = [0u8; 4];
        if !read_exact_or_stop(&mut reader, &mut magic_buf)? {
            break;
        }
        if u32::from_be_bytes(magic_buf) != MAGIC {
            break;
        }

        let mut crc_buf = [0u8; 4];
        if !read_exact_or_stop(&mut reader, &mut crc_buf)? {
            break;
        }
        let expected_crc = u32::from_be_bytes(crc_buf);

        let mut header = [0u8; 1 + 4 + 4];
        if !read_exact_or_stop(&mut reader, &mut header)? {
            break;
        }
        let op = header[0];
        let klen = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        let vlen = u32::from_be_bytes([header[5], header[6], header[7], header[8]]) as usize;

        let mut key = vec![0u8; klen];
        if !read_exact_or_stop(&mut reader, &mut key)? {
            break;
        }
        let mut value = vec![0u8; vlen];
        if !read_exact_or_stop(&mut reader, &mut value)? {
            break;
        }

        if op != OP_PUT && op != OP_DELETE {
            break;
        }

        let mut crc_body = Vec::with_capacity(1 + 4 + 4 + klen + vlen);
        crc_body.push(op);
        crc_body.write_u32::<BigEndian>(klen as u32).unwrap();
        crc_body.write_u32::<BigEndian>(vlen as u32).unwrap();
        crc_body.extend_from_slice(&key);
        crc_body.extend_from_slice(&value);

        let mut hasher = Crc32::new();
        hasher.update(&crc_body);
        if hasher.finalize() != expected_crc {
            break;
        }

        let entry = if op == OP_DELETE {
            WalEntry::Delete { key }
        } else {
            WalEntry::Put { key, value }
        };
        apply(entry);
        frames += 1;
    }

    debug!(path = %path.display(), frames, "replayed wal");
    Ok(())
}

/// Reads exactly `buf.len()` bytes, returning `Ok(false)` on a short/empty
/// read (treated as a clean stop, never an error) and `Ok(true)` when full.
fn read_exact_or_stop<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut read = 0;
    while read < buf.len() {
        match r.read(&mut buf[read..]) {
            Ok(0) => return Ok(read == buf.len()),
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests;
