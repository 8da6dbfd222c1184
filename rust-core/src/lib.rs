//! Nanotrace - Nanopore Current Trace Core
//!
//! Treats a directory of timestamped raw recordings as one continuous,
//! calibrated current trace, with zero-phase Bessel filtering and Welch
//! noise analysis on top. Python bindings are available behind the
//! `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod error;
pub mod filters;
pub mod pipeline;
pub mod recording;
pub mod session;
pub mod spectrum;
pub mod timeline;

#[cfg(feature = "python")]
mod python_bindings;

pub use error::{Result, TraceError, TraceWarning};
pub use pipeline::{process_psd, process_trace, PsdReport, TraceQuery, TraceView};
pub use recording::{CalibrationParams, MatMetadataLoader, MetadataLoader};
pub use session::{AssembledSignal, SampleRange, Session};
pub use spectrum::{welch_psd, PsdResult};
pub use timeline::TimelineIndex;
