//! Read-only memory-mapped access to raw recordings
//!
//! A recording is a headerless array of little-endian `u16` ADC words.
//! Only the requested window is decoded; the rest stays in the page cache.

use super::metadata::CalibrationParams;
use crate::error::{Result, TraceError};
use log::{debug, warn};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Bytes per raw sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Mapped raw recording
pub struct RecordingMap {
    path: PathBuf,
    map: Mmap,
}

impl RecordingMap {
    /// Map a recording read-only
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| TraceError::io(path, e))?;
        // SAFETY: the map is read-only and recordings are not modified
        // while a session is open.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| TraceError::io(path, e))?;

        if map.len() % BYTES_PER_SAMPLE != 0 {
            warn!(
                "{} has an odd byte length ({}), trailing byte ignored",
                path.display(),
                map.len()
            );
        }
        debug!("Mapped {} ({} bytes)", path.display(), map.len());

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Path of the mapped file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of complete samples in the file
    pub fn sample_count(&self) -> usize {
        self.map.len() / BYTES_PER_SAMPLE
    }

    /// Raw ADC words for local samples [start, end)
    pub fn raw_codes(&self, start: usize, end: usize) -> Result<impl Iterator<Item = u16> + '_> {
        let available = self.sample_count();
        if start > end || end > available {
            return Err(TraceError::OutOfRange {
                start,
                end,
                available,
            });
        }

        let bytes = &self.map[start * BYTES_PER_SAMPLE..end * BYTES_PER_SAMPLE];
        Ok(bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]])))
    }

    /// Samples [start, end) converted to picoamps with `calibration`
    pub fn read_scaled(
        &self,
        calibration: &CalibrationParams,
        start: usize,
        end: usize,
    ) -> Result<Vec<f64>> {
        Ok(self
            .raw_codes(start, end)?
            .map(|code| calibration.scale_code(code))
            .collect())
    }
}

impl std::fmt::Debug for RecordingMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingMap")
            .field("path", &self.path)
            .field("samples", &self.sample_count())
            .finish()
    }
}
