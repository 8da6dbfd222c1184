//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::error::TraceError;

mod session_bindings;
mod spectrum_bindings;

impl From<TraceError> for PyErr {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::Io { .. } | TraceError::MetadataMissing { .. } => {
                PyIOError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn nanotrace(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<session_bindings::PySession>()?;
    m.add_class::<spectrum_bindings::PyWindowType>()?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::welch_psd, m)?)?;
    m.add("FILTER_PADDING", crate::filters::FILTER_PADDING)?;

    Ok(())
}
