//! Python bindings for recording sessions

use numpy::PyArray1;
use pyo3::prelude::*;
use std::path::Path;

use crate::pipeline::{process_psd, process_trace, TraceQuery};
use crate::session::Session;

/// Recording session exposed to Python
#[pyclass(name = "Session")]
pub struct PySession {
    session: Session,
}

#[pymethods]
impl PySession {
    /// Open the session containing a recording
    ///
    /// Args:
    ///     path: Any `<prefix><YYYYMMDD_HHMMSS>.log` file of the session
    #[new]
    fn new(path: &str) -> PyResult<Self> {
        Ok(Self {
            session: Session::open(Path::new(path))?,
        })
    }

    /// Reference sample rate in Hz
    #[getter]
    fn sample_rate(&self) -> f64 {
        self.session.sample_rate()
    }

    #[getter]
    fn total_samples(&self) -> usize {
        self.session.total_samples()
    }

    #[getter]
    fn file_count(&self) -> usize {
        self.session.file_count()
    }

    #[getter]
    fn duration(&self) -> f64 {
        self.session.duration_seconds()
    }

    /// "Found N files matching P"
    fn describe(&self) -> String {
        self.session.describe()
    }

    /// Scaled current without any processing
    ///
    /// Returns:
    ///     (current, warnings)
    fn assemble<'py>(
        &mut self,
        py: Python<'py>,
        start_time: f64,
        end_time: f64,
    ) -> PyResult<(&'py PyArray1<f64>, Vec<String>)> {
        let signal = self.session.assemble(start_time, end_time)?;
        let warnings = signal.warnings.iter().map(ToString::to_string).collect();
        Ok((PyArray1::from_vec(py, signal.samples), warnings))
    }

    /// Filtered and optionally downsampled trace
    ///
    /// Args:
    ///     start_time, end_time: Seconds from the session start
    ///     cutoff_hz: Bessel low-pass cutoff, None for no filtering
    ///     order: Filter order
    ///     downsample_rate: Output rate in Hz, None to keep the recording rate
    ///
    /// Returns:
    ///     (time, current, warnings)
    #[pyo3(signature = (
        start_time=0.0,
        end_time=10.0,
        cutoff_hz=Some(900_000.0),
        order=8,
        downsample_rate=None
    ))]
    fn trace<'py>(
        &mut self,
        py: Python<'py>,
        start_time: f64,
        end_time: f64,
        cutoff_hz: Option<f64>,
        order: usize,
        downsample_rate: Option<f64>,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, Vec<String>)> {
        let query = TraceQuery {
            start_time,
            end_time,
            cutoff_hz,
            filter_order: order,
            downsample_rate,
            psd_segment_seconds: None,
        };
        let view = process_trace(&mut self.session, &query)?;
        let time = view.time_axis();
        let warnings = view.warnings().iter().map(ToString::to_string).collect();

        Ok((
            PyArray1::from_vec(py, time),
            PyArray1::from_vec(py, view.signal.samples),
            warnings,
        ))
    }

    /// Welch PSD and cumulative RMS noise
    ///
    /// Returns:
    ///     (frequencies, power, cumulative_rms, band_rms, warnings)
    #[pyo3(signature = (
        start_time=0.0,
        end_time=10.0,
        cutoff_hz=Some(900_000.0),
        order=8,
        segment_seconds=None
    ))]
    fn psd<'py>(
        &mut self,
        py: Python<'py>,
        start_time: f64,
        end_time: f64,
        cutoff_hz: Option<f64>,
        order: usize,
        segment_seconds: Option<f64>,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray1<f64>, f64, Vec<String>)> {
        let query = TraceQuery {
            start_time,
            end_time,
            cutoff_hz,
            filter_order: order,
            downsample_rate: None,
            psd_segment_seconds: segment_seconds,
        };
        let report = process_psd(&mut self.session, &query)?;
        let band_rms = report.band_rms();
        let warnings = report.warnings.iter().map(ToString::to_string).collect();

        Ok((
            PyArray1::from_vec(py, report.psd.frequencies),
            PyArray1::from_vec(py, report.psd.power),
            PyArray1::from_vec(py, report.psd.cumulative_rms),
            band_rms,
            warnings,
        ))
    }
}
