//! # Record
//!
//! The Bitcask on-disk log record: a CRC-framed put or tombstone.
//!
//! ```text
//! [crc32: u32 BE][flag: u8][klen: u32 BE][vlen: u32 BE][key][value]
//! ```
//!
//! `crc32` covers `(flag, key, value)` in that order, using the IEEE/zlib
//! CRC-32 polynomial (via `crc32fast`). `flag` is `0` for a put, `1` for a
//! tombstone; `vlen` is always `0` for a tombstone.
//!
//! Recovery never trusts the stored CRC blindly: every record is
//! recomputed-and-compared on read. A record whose header or payload is
//! short, or whose CRC does not match, is a **torn tail** — it is never
//! surfaced as an error. Callers halt the scan that produced it and keep
//! whatever came before.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::io::{self, Read};

/// Fixed header size: crc32(4) + flag(1) + klen(4) + vlen(4).
pub const HEADER_LEN: usize = 4 + 1 + 4 + 4;

const FLAG_PUT: u8 = 0;
const FLAG_TOMBSTONE: u8 = 1;

/// A single decoded log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    /// `Some(value)` for a put, `None` for a tombstone.
    pub value: Option<Vec<u8>>,
}

impl Record {
    /// Builds a put record.
    pub fn put(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    /// Builds a tombstone record for `key`.
    pub fn tombstone(key: Vec<u8>) -> Self {
        Self { key, value: None }
    }

    /// `true` if this is a tombstone (deletion marker).
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    fn flag(&self) -> u8 {
        if self.is_tombstone() {
            FLAG_TOMBSTONE
        } else {
            FLAG_PUT
        }
    }

    fn value_bytes(&self) -> &[u8] {
        match &self.value {
            Some(v) => v.as_slice(),
            None => &[],
        }
    }

    /// Total serialized size in bytes: header plus key plus value.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.key.len() + self.value_bytes().len()
    }

    fn crc(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(&[self.flag()]);
        hasher.update(&self.key);
        hasher.update(self.value_bytes());
        hasher.finalize()
    }

    /// Serializes this record into a freshly allocated buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        let value = self.value_bytes();
        buf.write_u32::<BigEndian>(self.crc()).unwrap();
        buf.push(self.flag());
        buf.write_u32::<BigEndian>(self.key.len() as u32).unwrap();
        buf.write_u32::<BigEndian>(value.len() as u32).unwrap();
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(value);
        buf
    }

    /// Decodes a record from the front of `buf`.
    ///
    /// Returns the record and the number of bytes consumed. A header that is
    /// short, a payload shorter than the declared lengths, or a CRC mismatch
    /// all report [`TornTail`] rather than an error — there is nothing to
    /// propagate, the scan that called this just stops here.
    pub fn decode(buf: &[u8]) -> Result<(Record, usize), TornTail> {
        if buf.len() < HEADER_LEN {
            return Err(TornTail);
        }
        let mut header = &buf[..HEADER_LEN];
        let crc = header.read_u32::<BigEndian>().map_err(|_| TornTail)?;
        let flag = header.read_u8().map_err(|_| TornTail)?;
        let klen = header.read_u32::<BigEndian>().map_err(|_| TornTail)? as usize;
        let vlen = header.read_u32::<BigEndian>().map_err(|_| TornTail)? as usize;

        if flag == FLAG_TOMBSTONE && vlen != 0 {
            return Err(TornTail);
        }
        if flag != FLAG_PUT && flag != FLAG_TOMBSTONE {
            return Err(TornTail);
        }

        let total = HEADER_LEN + klen + vlen;
        if buf.len() < total {
            return Err(TornTail);
        }

        let key = buf[HEADER_LEN..HEADER_LEN + klen].to_vec();
        let value = buf[HEADER_LEN + klen..total].to_vec();

        let record = if flag == FLAG_TOMBSTONE {
            Record::tombstone(key)
        } else {
            Record::put(key, value)
        };

        if record.crc() != crc {
            return Err(TornTail);
        }

        Ok((record, total))
    }

    /// Reads one record from a stream, tolerating a torn tail.
    ///
    /// Returns `Eof` when the stream ended exactly on a record boundary (the
    /// ordinary, successful end of a scan), `Torn` when a partial record was
    /// found (the caller stops here too, but this distinguishes "nothing
    /// left to read" from "an interrupted write left a fragment"), or
    /// `Complete` with the decoded record and its encoded length otherwise.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<ReadOutcome> {
        let mut header = [0u8; HEADER_LEN];
        match read_partial(r, &mut header)? {
            Fill::Empty => return Ok(ReadOutcome::Eof),
            Fill::Partial => return Ok(ReadOutcome::Torn),
            Fill::Full => {}
        }

        let mut h = &header[..];
        let crc = h.read_u32::<BigEndian>().unwrap();
        let flag = h.read_u8().unwrap();
        let klen = h.read_u32::<BigEndian>().unwrap() as usize;
        let vlen = h.read_u32::<BigEndian>().unwrap() as usize;

        if (flag != FLAG_PUT && flag != FLAG_TOMBSTONE) || (flag == FLAG_TOMBSTONE && vlen != 0) {
            return Ok(ReadOutcome::Torn);
        }

        let mut key = vec![0u8; klen];
        if let Fill::Full = read_partial(r, &mut key)? {
            // fall through
        } else {
            return Ok(ReadOutcome::Torn);
        }
        let mut value = vec![0u8; vlen];
        if let Fill::Full = read_partial(r, &mut value)? {
            // fall through
        } else {
            return Ok(ReadOutcome::Torn);
        }

        let record = if flag == FLAG_TOMBSTONE {
            Record::tombstone(key)
        } else {
            Record::put(key, value)
        };

        if record.crc() != crc {
            return Ok(ReadOutcome::Torn);
        }

        let len = record.encoded_len();
        Ok(ReadOutcome::Complete(record, len))
    }
}

/// Outcome of [`Record::read_from`].
#[derive(Debug)]
pub enum ReadOutcome {
    /// A fully valid record.
    Complete(Record, usize),
    /// A torn tail: stop scanning, keep what came before.
    Torn,
    /// Clean end of stream on a record boundary.
    Eof,
}

/// Marker returned by [`Record::decode`] for any form of torn tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TornTail;

enum Fill {
    Full,
    Partial,
    Empty,
}

/// Fills `buf` from `r`, reporting whether it read all, some, or none of it.
fn read_partial<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<Fill> {
    let mut read = 0;
    while read < buf.len() {
        match r.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
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
