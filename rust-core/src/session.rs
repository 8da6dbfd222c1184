//! One acquisition session as a single continuous trace
//!
//! A [`Session`] owns the timeline, the lazily opened file maps and the
//! calibration cache. Queries in seconds are resolved to global sample
//! ranges and stitched together from as many recordings as they span.

use crate::error::{Result, TraceError, TraceWarning};
use crate::recording::{CalibrationParams, MatMetadataLoader, MetadataLoader, RecordingMap};
use crate::timeline::TimelineIndex;
use log::{debug, info, warn};
use std::path::Path;

/// Half-open range of global sample indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Contiguous current samples (pA) at a single rate
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSignal {
    /// Current in picoamps
    pub samples: Vec<f64>,

    /// Rate the samples are labelled with (Hz)
    pub sample_rate: f64,

    /// Non-fatal problems met while producing the samples
    pub warnings: Vec<TraceWarning>,
}

impl AssembledSignal {
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            warnings: Vec::new(),
        }
    }

    /// Derived signal carrying over this signal's warnings
    pub fn derive(&self, samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            warnings: self.warnings.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Open acquisition session
pub struct Session<L = MatMetadataLoader> {
    index: TimelineIndex,
    loader: L,
    maps: Vec<Option<RecordingMap>>,
    calibrations: Vec<Option<CalibrationParams>>,
    sample_rate: f64,
}

impl Session<MatMetadataLoader> {
    /// Discover the session containing `reference` and read its calibration
    /// from the companion `.mat` files
    pub fn open(reference: &Path) -> Result<Self> {
        let index = TimelineIndex::build(reference)?;
        Self::with_loader(index, MatMetadataLoader)
    }
}

impl<L: MetadataLoader> Session<L> {
    /// Session over an existing index. The first file's calibration sets
    /// the reference sample rate.
    pub fn with_loader(index: TimelineIndex, loader: L) -> Result<Self> {
        let count = index.len();
        let mut session = Self {
            index,
            loader,
            maps: (0..count).map(|_| None).collect(),
            calibrations: vec![None; count],
            sample_rate: 0.0,
        };
        session.sample_rate = session.calibration(0)?.sample_rate;

        info!(
            "Session: {} files, {} samples at {} Hz ({:.3} s)",
            count,
            session.total_samples(),
            session.sample_rate,
            session.duration_seconds()
        );
        Ok(session)
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    /// Reference sample rate (Hz) from the first recording
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn total_samples(&self) -> usize {
        self.index.total_samples()
    }

    pub fn file_count(&self) -> usize {
        self.index.len()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.total_samples() as f64 / self.sample_rate
    }

    /// Pattern the recordings were discovered with
    pub fn pattern(&self) -> &str {
        self.index.pattern()
    }

    /// Status line naming the discovered files
    pub fn describe(&self) -> String {
        self.index.describe()
    }

    /// Calibration of file `file`, loaded on first use
    pub fn calibration(&mut self, file: usize) -> Result<CalibrationParams> {
        if let Some(calibration) = self.calibrations[file] {
            return Ok(calibration);
        }
        let calibration = self.loader.load(self.index.files()[file].path())?;
        self.calibrations[file] = Some(calibration);
        Ok(calibration)
    }

    /// Mapping of file `file`, opened on first use
    fn recording(&mut self, file: usize) -> Result<&RecordingMap> {
        let map = match self.maps[file].take() {
            Some(map) => map,
            None => RecordingMap::open(self.index.files()[file].path())?,
        };
        Ok(self.maps[file].insert(map))
    }

    /// Convert a query in seconds to global sample indices, clamped to the
    /// end of the session
    pub fn sample_range(&self, start_time: f64, end_time: f64) -> Result<SampleRange> {
        let finite = start_time.is_finite() && end_time.is_finite();
        if !finite || start_time < 0.0 || end_time < start_time {
            return Err(TraceError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }

        let total = self.total_samples();
        let to_index = |t: f64| ((t * self.sample_rate).round() as usize).min(total);
        Ok(SampleRange {
            start: to_index(start_time),
            end: to_index(end_time),
        })
    }

    /// Current between `start_time` and `end_time` (seconds from the start
    /// of the session)
    pub fn assemble(&mut self, start_time: f64, end_time: f64) -> Result<AssembledSignal> {
        let range = self.sample_range(start_time, end_time)?;
        self.assemble_range(range)
    }

    /// Current for global samples `range`, each file scaled with its own
    /// calibration
    pub fn assemble_range(&mut self, range: SampleRange) -> Result<AssembledSignal> {
        let mut signal = AssembledSignal::new(Vec::with_capacity(range.len()), self.sample_rate);
        if range.is_empty() {
            return Ok(signal);
        }
        if range.end > self.total_samples() {
            return Err(TraceError::OutOfRange {
                start: range.start,
                end: range.end,
                available: self.total_samples(),
            });
        }

        let (first, _) = self.index.locate(range.start)?;
        let (last, _) = self.index.locate(range.end - 1)?;
        debug!(
            "Assembling samples {}..{} from files {}..={}",
            range.start, range.end, first, last
        );

        for file in first..=last {
            let span = self.index.file_range(file);
            let local_start = range.start.max(span.start) - span.start;
            let local_end = range.end.min(span.end) - span.start;
            if local_start == local_end {
                continue;
            }

            let calibration = self.calibration(file)?;
            if calibration.sample_rate != self.sample_rate {
                let warning = TraceWarning::SampleRateMismatch {
                    path: self.index.files()[file].path().to_path_buf(),
                    expected: self.sample_rate,
                    found: calibration.sample_rate,
                };
                warn!("{warning}");
                signal.warnings.push(warning);
            }

            let mut scaled = self
                .recording(file)?
                .read_scaled(&calibration, local_start, local_end)?;
            signal.samples.append(&mut scaled);
        }

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::RecordingFile;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    /// Calibration keyed by recording path
    struct FixedLoader(HashMap<PathBuf, CalibrationParams>);

    impl MetadataLoader for FixedLoader {
        fn load(&self, recording: &Path) -> Result<CalibrationParams> {
            self.0
                .get(recording)
                .copied()
                .ok_or_else(|| TraceError::MetadataMissing {
                    path: recording.to_path_buf(),
                })
        }
    }

    fn calibration(sample_rate: f64, offset: f64) -> CalibrationParams {
        CalibrationParams {
            sample_rate,
            tia_gain: 100e6,
            pre_adc_gain: 10.0,
            current_offset: offset,
            voltage_offset: 0.0,
            adc_vref: 2.5,
            adc_bits: 16,
        }
    }

    /// Files of constant mid-scale codes, one calibration each
    fn session(dir: &Path, files: &[(usize, CalibrationParams)]) -> Session<FixedLoader> {
        let mut recordings = Vec::new();
        let mut loader = HashMap::new();
        for (i, (samples, cal)) in files.iter().enumerate() {
            let path = dir.join(format!("s_20240315_0900{:02}.log", i));
            let mut file = std::fs::File::create(&path).unwrap();
            for _ in 0..*samples {
                file.write_all(&32768u16.to_le_bytes()).unwrap();
            }
            let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(9, 0, i as u32)
                .unwrap();
            recordings.push(RecordingFile::new(path.clone(), ts, (*samples * 2) as u64));
            loader.insert(path, *cal);
        }
        let index = TimelineIndex::from_files(recordings, "s_*.log".to_string()).unwrap();
        Session::with_loader(index, FixedLoader(loader)).unwrap()
    }

    #[test]
    fn test_single_file_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), &[(1000, calibration(1000.0, 0.0))]);

        let signal = s.assemble(0.1, 0.4).unwrap();
        assert_eq!(signal.len(), 300);
        assert_eq!(signal.sample_rate, 1000.0);
        assert!(signal.warnings.is_empty());
        assert!(signal.samples.iter().all(|&v| v.abs() < 1e-9));
    }

    #[test]
    fn test_spanning_three_files_uses_each_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(
            dir.path(),
            &[
                (100, calibration(1000.0, 1e-12)),
                (100, calibration(1000.0, 2e-12)),
                (100, calibration(1000.0, 3e-12)),
            ],
        );

        let signal = s.assemble(0.05, 0.25).unwrap();
        assert_eq!(signal.len(), 200);
        assert!((signal.samples[0] - 1.0).abs() < 1e-9);
        assert!((signal.samples[49] - 1.0).abs() < 1e-9);
        assert!((signal.samples[50] - 2.0).abs() < 1e-9);
        assert!((signal.samples[149] - 2.0).abs() < 1e-9);
        assert!((signal.samples[150] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let cal = calibration(1000.0, 0.0);
        let mut s = session(dir.path(), &[(100, cal), (50, cal)]);

        let signal = s.assemble(0.12, 10.0).unwrap();
        assert_eq!(signal.len(), 30);
    }

    #[test]
    fn test_empty_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), &[(100, calibration(1000.0, 0.0))]);

        assert!(s.assemble(0.05, 0.05).unwrap().is_empty());
        // Both ends clamp to the session end
        assert!(s.assemble(5.0, 6.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_time_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), &[(100, calibration(1000.0, 0.0))]);

        for (start, end) in [(0.5, 0.1), (-1.0, 0.1), (0.0, f64::NAN)] {
            assert!(matches!(
                s.assemble(start, end),
                Err(TraceError::InvalidTimeRange { .. })
            ));
        }
    }

    #[test]
    fn test_rate_mismatch_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(
            dir.path(),
            &[(100, calibration(1000.0, 0.0)), (100, calibration(2000.0, 0.0))],
        );

        let signal = s.assemble(0.0, 0.2).unwrap();
        assert_eq!(signal.len(), 200);
        assert_eq!(signal.sample_rate, 1000.0);
        assert_eq!(signal.warnings.len(), 1);
        assert!(matches!(
            signal.warnings[0],
            TraceWarning::SampleRateMismatch { found, .. } if found == 2000.0
        ));

        // Only files that are actually read are checked
        assert!(s.assemble(0.0, 0.1).unwrap().warnings.is_empty());
    }

    #[test]
    fn test_session_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cal = calibration(1000.0, 0.0);
        let s = session(dir.path(), &[(100, cal), (300, cal)]);
        assert_eq!(s.file_count(), 2);
        assert_eq!(s.pattern(), "s_*.log");
        assert_eq!(s.total_samples(), 400);
        assert!((s.duration_seconds() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_assemble_range_past_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), &[(100, calibration(1000.0, 0.0))]);
        assert!(matches!(
            s.assemble_range(SampleRange { start: 90, end: 101 }),
            Err(TraceError::OutOfRange { .. })
        ));
    }
}
