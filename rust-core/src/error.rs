//! Error and warning types shared by every stage of the trace pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while discovering, reading or analysing a session
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Metadata file '{}' not found", path.display())]
    MetadataMissing { path: PathBuf },

    #[error("Metadata file '{}' is malformed: {reason}", path.display())]
    MetadataMalformed { path: PathBuf, reason: String },

    #[error("Samples {start}..{end} are out of range ({available} samples available)")]
    OutOfRange {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("No timestamped recordings match {pattern}")]
    NoTimestampedFiles { pattern: String },

    #[error("Invalid filter parameters: {0}")]
    InvalidFilterParams(String),

    #[error("Insufficient samples: {available} available, at least {required} required")]
    InsufficientSamples { available: usize, required: usize },

    #[error("Invalid time range {start}s to {end}s")]
    InvalidTimeRange { start: f64, end: f64 },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal conditions surfaced alongside a successful result
#[derive(Debug, Clone, PartialEq)]
pub enum TraceWarning {
    /// A recording was acquired at a different rate than the session reference.
    /// Samples are still concatenated and labelled with the reference rate.
    SampleRateMismatch {
        path: PathBuf,
        expected: f64,
        found: f64,
    },
}

impl std::fmt::Display for TraceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceWarning::SampleRateMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "'{}' was sampled at {found} Hz but the session rate is {expected} Hz",
                path.display()
            ),
        }
    }
}

/// Convenient Result type that uses our TraceError
pub type Result<T> = std::result::Result<T, TraceError>;
