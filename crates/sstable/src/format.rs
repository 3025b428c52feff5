//! Sorted table footer: a fixed 20-byte trailer.
//!
//! ```text
//! [magic: u32 BE = 0x53535431][index_count: u32 BE][index_start: u64 BE][index_crc32: u32 BE]
//! ```
//!
//! `index_start` is the byte offset (from the start of the file) where the
//! sparse index block begins — equivalently, the length of the data block.
//! `index_crc32` covers the raw index block bytes; a mismatch is treated the
//! same as a bad magic: a hard error when opening the table.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::SsTableError;

pub const MAGIC: u32 = 0x5353_5431;
pub const FOOTER_LEN: usize = 4 + 4 + 8 + 4;

pub struct Footer {
    pub index_count: u32,
    pub index_start: u64,
    pub index_crc32: u32,
}

pub fn encode_footer(footer: &Footer) -> io::Result<[u8; FOOTER_LEN]> {
    let mut buf = Vec::with_capacity(FOOTER_LEN);
    buf.write_u32::<BigEndian>(MAGIC)?;
    buf.write_u32::<BigEndian>(footer.index_count)?;
    buf.write_u64::<BigEndian>(footer.index_start)?;
    buf.write_u32::<BigEndian>(footer.index_crc32)?;
    let mut out = [0u8; FOOTER_LEN];
    out.copy_from_slice(&buf);
    Ok(out)
}

pub fn decode_footer(buf: &[u8; FOOTER_LEN]) -> Result<Footer, SsTableError> {
    let mut r = &buf[..];
    let magic = r.read_u32::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)?;
    if magic != MAGIC {
        return Err(SsTableError::CorruptFooter);
    }
    let index_count = r.read_u32::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)?;
    let index_start = r.read_u64::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)?;
    let index_crc32 = r.read_u32::<BigEndian>().map_err(|_| SsTableError::CorruptFooter)?;
    Ok(Footer {
        index_count,
        index_start,
        index_crc32,
    })
}
