//! Low-pass filtering and rate conversion of assembled traces
//!
//! When both are wanted, filter first and downsample second; the pipeline
//! module enforces that order. These functions do not check it.

pub mod bessel;
pub mod resample;
pub mod sections;

pub use bessel::{design_lowpass, MAX_ORDER};
pub use resample::linear_resample;
pub use sections::{filtfilt, Section};

use crate::error::{Result, TraceError};
use crate::session::AssembledSignal;
use log::debug;

/// Samples of median padding added to each end before filtering
pub const FILTER_PADDING: usize = 1000;

/// Zero-phase Bessel low-pass
///
/// The signal is padded at both ends with its median, filtered forward and
/// backward, and the padding trimmed off again, so the output has the
/// input's length.
///
/// # Arguments
/// * `signal` - Trace to filter
/// * `cutoff_hz` - Cutoff frequency, strictly between 0 and Nyquist
/// * `order` - Filter order, 1..=MAX_ORDER
pub fn low_pass(signal: &AssembledSignal, cutoff_hz: f64, order: usize) -> Result<AssembledSignal> {
    let nyquist = signal.sample_rate / 2.0;
    if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
        return Err(TraceError::InvalidFilterParams(format!(
            "cutoff {cutoff_hz} Hz must be between 0 and the Nyquist frequency {nyquist} Hz"
        )));
    }
    let sections = design_lowpass(order, cutoff_hz / nyquist)?;

    if signal.is_empty() {
        return Ok(signal.derive(Vec::new(), signal.sample_rate));
    }

    let pad_value = median(&signal.samples);
    let mut padded = Vec::with_capacity(signal.len() + 2 * FILTER_PADDING);
    padded.resize(FILTER_PADDING, pad_value);
    padded.extend_from_slice(&signal.samples);
    padded.resize(signal.len() + 2 * FILTER_PADDING, pad_value);

    let filtered = filtfilt(&sections, &padded);
    debug!(
        "Low-pass {} samples at {cutoff_hz} Hz, order {order}, pad value {pad_value:.3}",
        signal.len()
    );

    Ok(signal.derive(
        filtered[FILTER_PADDING..FILTER_PADDING + signal.len()].to_vec(),
        signal.sample_rate,
    ))
}

/// Resample to `target_rate` by linear interpolation
pub fn downsample(signal: &AssembledSignal, target_rate: f64) -> Result<AssembledSignal> {
    if !(target_rate > 0.0 && target_rate.is_finite()) {
        return Err(TraceError::InvalidFilterParams(format!(
            "target rate must be positive, got {target_rate}"
        )));
    }

    let ratio = target_rate / signal.sample_rate;
    let samples = linear_resample(&signal.samples, ratio);
    debug!(
        "Resampled {} -> {} samples ({} Hz -> {target_rate} Hz)",
        signal.len(),
        samples.len(),
        signal.sample_rate
    );

    Ok(signal.derive(samples, target_rate))
}

/// Median; the mean of the two middle values for even lengths
fn median(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    let mid = sorted.len() / 2;
    let (lower, upper, _) = sorted.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if samples.len() % 2 == 1 {
        upper
    } else {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + upper) / 2.0
    }
}
