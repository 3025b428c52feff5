use byteorder::{BigEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::format::{encode_footer, Footer};
use crate::{table_path, Slot, SsTableError};

/// Writes a sorted table for `entries` (sorted ascending by key inside this
/// function if not already) into `dir` under id `id`, with one sparse index
/// entry per `stride` data entries.
///
/// Flushes to a temporary file, fsyncs it, atomically renames into place,
/// then fsyncs the containing directory so the rename itself survives a
/// crash. Returns the final path. Duplicate keys are rejected.
pub fn write_table(
    dir: &Path,
    id: u64,
    mut entries: Vec<(Vec<u8>, Slot)>,
    stride: usize,
) -> Result<PathBuf, SsTableError> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for pair in entries.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(SsTableError::DuplicateKey);
        }
    }

    let mut data = Vec::new();
    let mut data_offsets = Vec::with_capacity(entries.len());

    for (key, value) in &entries {
        data_offsets.push(data.len() as u64);
        let value_bytes = value.as_deref().unwrap_or(&[]);
        data.write_u32::<BigEndian>(key.len() as u32).unwrap();
        data.write_u32::<BigEndian>(value_bytes.len() as u32).unwrap();
        data.extend_from_slice(key);
        data.extend_from_slice(value_bytes);
    }

    let index_start = data.len() as u64;
    let mut index = Vec::new();
    let stride = stride.max(1);
    for i in (0..entries.len()).step_by(stride) {
        let (key, _) = &entries[i];
        index.write_u32::<BigEndian>(key.len() as u32).unwrap();
        index.extend_from_slice(key);
        index.write_u64::<BigEndian>(data_offsets[i]).unwrap();
    }
    let index_count = entries.len().div_ceil(stride) as u32;

    let mut hasher = Crc32::new();
    hasher.update(&index);
    let index_crc32 = hasher.finalize();

    let footer = encode_footer(&Footer {
        index_count,
        index_start,
        index_crc32,
    })?;

    let mut buf = data;
    buf.extend_from_slice(&index);
    buf.extend_from_slice(&footer);

    let final_path = table_path(dir, id);
    let tmp_path = final_path.with_extension("sst.tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, &final_path)?;
    File::open(dir)?.sync_all()?;

    Ok(final_path)
}
