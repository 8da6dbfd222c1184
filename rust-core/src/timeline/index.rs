//! Global sample index over an ordered set of recordings
//!
//! Files are treated as back-to-back in time. No gap or overlap check is
//! made between consecutive recordings.

use super::discovery::{session_prefix, DiscoveredFile, FileDiscovery, TimestampSuffixDiscovery};
use crate::error::{Result, TraceError};
use crate::recording::reader::BYTES_PER_SAMPLE;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// One raw recording in a session
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFile {
    path: PathBuf,
    timestamp: NaiveDateTime,
    byte_len: u64,
}

impl RecordingFile {
    pub fn new(path: PathBuf, timestamp: NaiveDateTime, byte_len: u64) -> Self {
        Self {
            path,
            timestamp,
            byte_len,
        }
    }

    /// Stat a discovered file to record its size
    pub fn from_discovered(file: DiscoveredFile) -> Result<Self> {
        let byte_len = std::fs::metadata(&file.path)
            .map_err(|e| TraceError::io(&file.path, e))?
            .len();
        Ok(Self::new(file.path, file.timestamp, byte_len))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Number of complete 16-bit samples
    pub fn sample_count(&self) -> usize {
        (self.byte_len / BYTES_PER_SAMPLE as u64) as usize
    }
}

/// Ordered recordings plus a cumulative sample table
///
/// `offsets[i]` is the global index of the first sample of file `i`;
/// `offsets[len]` is the total sample count.
#[derive(Debug, Clone)]
pub struct TimelineIndex {
    files: Vec<RecordingFile>,
    offsets: Vec<usize>,
    pattern: String,
}

impl TimelineIndex {
    /// Discover the session containing `reference` using the default
    /// `<prefix><YYYYMMDD_HHMMSS>.log` naming
    pub fn build(reference: &Path) -> Result<Self> {
        Self::build_with(reference, &TimestampSuffixDiscovery::default())
    }

    /// Discover the session containing `reference` with a custom strategy
    pub fn build_with<D: FileDiscovery + ?Sized>(reference: &Path, discovery: &D) -> Result<Self> {
        let dir = match reference.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let prefix = session_prefix(reference).ok_or_else(|| TraceError::NoTimestampedFiles {
            pattern: reference.display().to_string(),
        })?;
        let pattern = discovery.pattern(&dir, &prefix);

        let files = discovery
            .discover(&dir, &prefix)?
            .into_iter()
            .map(RecordingFile::from_discovered)
            .collect::<Result<Vec<_>>>()?;

        let index = Self::from_files(files, pattern)?;
        info!("{}", index.describe());
        Ok(index)
    }

    /// Index already-ordered files
    pub fn from_files(files: Vec<RecordingFile>, pattern: String) -> Result<Self> {
        if files.is_empty() {
            return Err(TraceError::NoTimestampedFiles { pattern });
        }

        let mut offsets = Vec::with_capacity(files.len() + 1);
        let mut total = 0usize;
        offsets.push(total);
        for file in &files {
            total += file.sample_count();
            offsets.push(total);
            debug!("{} -> {} samples", file.path().display(), file.sample_count());
        }

        Ok(Self {
            files,
            offsets,
            pattern,
        })
    }

    pub fn files(&self) -> &[RecordingFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Pattern the session was discovered with
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Sum of per-file sample counts
    pub fn total_samples(&self) -> usize {
        self.offsets[self.files.len()]
    }

    /// Global index range covered by file `file`
    pub fn file_range(&self, file: usize) -> Range<usize> {
        self.offsets[file]..self.offsets[file + 1]
    }

    /// Map a global sample index to `(file index, local index)`
    ///
    /// Binary search over the cumulative table; empty files are never returned.
    pub fn locate(&self, global: usize) -> Result<(usize, usize)> {
        let total = self.total_samples();
        if global >= total {
            return Err(TraceError::OutOfRange {
                start: global,
                end: global + 1,
                available: total,
            });
        }

        // Last file whose first sample is at or before `global`
        let file = self.offsets.partition_point(|&offset| offset <= global) - 1;
        Ok((file, global - self.offsets[file]))
    }

    /// Status line, e.g. "Found 3 files matching /data/pore7_*.log"
    pub fn describe(&self) -> String {
        format!("Found {} files matching {}", self.files.len(), self.pattern)
    }
}
