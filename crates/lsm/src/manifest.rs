//! # Manifest
//!
//! Tracks which sorted-table files make up the engine's on-disk state: an
//! in-memory deque of table paths, newest first, each with an open reader.
//!
//! ## File format
//!
//! One absolute-or-relative filename per line, newest first:
//!
//! ```text
//! sst-00000000000000000007.sst
//! sst-00000000000000000004.sst
//! ```
//!
//! Unlike the multi-level manifest this grew out of, there are no level
//! prefixes: this core keeps a single flat, newest-first list and relies on
//! size-tiered compaction to bound how many tables accumulate.
//!
//! ## Crash safety
//!
//! Rewritten atomically: write to a `.tmp` file, fsync, rename over the
//! existing manifest, fsync the containing directory.

use sstable::SsTableReader;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILENAME: &str = "MANIFEST";
const MANIFEST_TMP_FILENAME: &str = "MANIFEST.tmp";

/// The manifest and its currently-open readers, kept in lockstep: every
/// mutation rebuilds `readers` before returning, so the two are never out of
/// sync from a caller's point of view.
pub struct Manifest {
    dir: PathBuf,
    path: PathBuf,
    filenames: Vec<String>,
    readers: Vec<SsTableReader>,
}

impl Manifest {
    /// Loads the manifest from `dir/MANIFEST`, opening a reader for every
    /// listed table that still exists on disk. A missing manifest file
    /// starts empty.
    pub fn load_or_create(dir: &Path) -> io::Result<Self> {
        let path = dir.join(MANIFEST_FILENAME);
        let mut filenames = Vec::new();

        if path.exists() {
            let file = File::open(&path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                filenames.push(trimmed.to_string());
            }
        }

        let mut manifest = Self {
            dir: dir.to_path_buf(),
            path,
            filenames: Vec::new(),
            readers: Vec::new(),
        };
        manifest.rebuild_readers(filenames)?;
        Ok(manifest)
    }

    /// Readers in the order point reads must consult them: newest first.
    pub fn readers_newest_first(&self) -> &[SsTableReader] {
        &self.readers
    }

    /// `true` if the manifest currently lists no tables.
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    /// Number of tables currently tracked.
    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    /// Returns the filenames of the `n` oldest tables (compaction input),
    /// oldest last in the returned order matching their manifest order.
    pub fn oldest_n(&self, n: usize) -> Vec<String> {
        let start = self.filenames.len().saturating_sub(n);
        self.filenames[start..].to_vec()
    }

    /// Installs `filename` as the newest table. Does not persist; call
    /// [`store_atomic`](Self::store_atomic) afterward.
    pub fn add_head(&mut self, filename: String) -> io::Result<()> {
        let mut filenames = self.filenames.clone();
        filenames.insert(0, filename);
        self.rebuild_readers(filenames)
    }

    /// Removes every table in `old_filenames` and installs `merged_filename`
    /// at the head. Does not persist.
    pub fn replace(&mut self, old_filenames: &[String], merged_filename: String) -> io::Result<()> {
        let mut filenames: Vec<String> = self
            .filenames
            .iter()
            .filter(|f| !old_filenames.contains(f))
            .cloned()
            .collect();
        filenames.insert(0, merged_filename);
        self.rebuild_readers(filenames)
    }

    /// Writes the current table list via temp-file + atomic rename +
    /// directory fsync.
    pub fn store_atomic(&self) -> io::Result<()> {
        let tmp_path = self.path.with_file_name(MANIFEST_TMP_FILENAME);
        {
            let mut f = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
            writeln!(f, "# lsm table manifest, newest first")?;
            for filename in &self.filenames {
                writeln!(f, "{filename}")?;
            }
            f.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    fn rebuild_readers(&mut self, filenames: Vec<String>) -> io::Result<()> {
        let mut readers = Vec::with_capacity(filenames.len());
        let mut kept = Vec::with_capacity(filenames.len());
        for filename in filenames {
            let path = self.dir.join(&filename);
            if path.exists() {
                readers.push(SsTableReader::open(path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?);
                kept.push(filename);
            }
        }
        self.filenames = kept;
        self.readers = readers;
        Ok(())
    }
}
