//! Python bindings for spectral estimation on plain arrays

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::spectrum::{welch_psd_with, WelchConfig, WindowType};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Welch PSD of an arbitrary trace
///
/// Args:
///     samples: Current trace (pA) as numpy array
///     sample_rate: Sample rate in Hz
///     segment_seconds: Segment length in seconds (default: whole trace, at most 2^20)
///     window_type: Segment taper (default: Hann)
///
/// Returns:
///     (frequencies, power, cumulative_rms) numpy arrays
#[pyfunction]
#[pyo3(signature = (samples, sample_rate, segment_seconds=None, window_type=PyWindowType::Hann))]
pub fn welch_psd<'py>(
    py: Python<'py>,
    samples: PyReadonlyArray1<f64>,
    sample_rate: f64,
    segment_seconds: Option<f64>,
    window_type: PyWindowType,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let config = WelchConfig {
        segment_seconds,
        window_type: window_type.into(),
    };
    let psd = welch_psd_with(samples.as_slice()?, sample_rate, &config)?;

    Ok((
        PyArray1::from_vec(py, psd.frequencies),
        PyArray1::from_vec(py, psd.power),
        PyArray1::from_vec(py, psd.cumulative_rms),
    ))
}
