//! Welch power spectral density
//!
//! Averaged periodograms of half-overlapping, mean-removed, periodic-Hann
//! tapered segments, scaled as a one-sided density in pA²/Hz.

use super::fft::FftEngine;
use super::noise::integrate_rms;
use super::windows::{periodic_window, window_power, WindowType};
use crate::error::{Result, TraceError};
use log::debug;

/// Largest default segment length (2^20 samples)
pub const DEFAULT_MAX_SEGMENT: usize = 1 << 20;

/// Estimator settings
#[derive(Debug, Clone, PartialEq)]
pub struct WelchConfig {
    /// Segment length in seconds, rounded up to a power of two in samples.
    /// `None` uses `min(DEFAULT_MAX_SEGMENT, len)`.
    pub segment_seconds: Option<f64>,

    /// Taper applied to every segment
    pub window_type: WindowType,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            segment_seconds: None,
            window_type: WindowType::Hann,
        }
    }
}

/// One-sided PSD with its running RMS integral
#[derive(Debug, Clone, PartialEq)]
pub struct PsdResult {
    /// Bin centres from 0 to sample_rate / 2 (Hz)
    pub frequencies: Vec<f64>,

    /// Power spectral density (pA²/Hz)
    pub power: Vec<f64>,

    /// RMS noise accumulated up to each bin (pA)
    pub cumulative_rms: Vec<f64>,

    /// Samples per segment
    pub segment_length: usize,

    /// Number of averaged segments
    pub segments: usize,
}

impl PsdResult {
    /// Cumulative RMS at the last bin at or below `max_hz`
    ///
    /// Zero when `max_hz` lies below the first bin.
    pub fn band_limited_rms(&self, max_hz: f64) -> f64 {
        let bins = self.frequencies.partition_point(|&f| f <= max_hz);
        match bins {
            0 => 0.0,
            n => self.cumulative_rms[n - 1],
        }
    }

    /// RMS over the whole estimated band
    pub fn total_rms(&self) -> f64 {
        self.cumulative_rms.last().copied().unwrap_or(0.0)
    }

    /// Bin spacing (Hz)
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [f0, f1, ..] => f1 - f0,
            _ => 0.0,
        }
    }
}

/// Segment length for `len` samples at `sample_rate`
///
/// Seconds are converted to samples and rounded up to a power of two; the
/// result is clamped to `len` either way.
pub fn resolve_segment_length(
    len: usize,
    sample_rate: f64,
    segment_seconds: Option<f64>,
) -> Result<usize> {
    let requested = match segment_seconds {
        None => DEFAULT_MAX_SEGMENT,
        Some(seconds) => {
            let samples = seconds * sample_rate;
            if !(samples > 0.0 && samples.is_finite()) {
                return Err(TraceError::InvalidFilterParams(format!(
                    "segment length must be positive, got {seconds} s"
                )));
            }
            let samples = samples.ceil();
            if samples >= usize::MAX as f64 {
                usize::MAX
            } else {
                (samples as usize).checked_next_power_of_two().unwrap_or(usize::MAX)
            }
        }
    };
    Ok(requested.min(len))
}

/// Welch PSD of `samples` with the default Hann taper
///
/// # Arguments
/// * `samples` - Current trace (pA)
/// * `sample_rate` - Rate of `samples` (Hz)
/// * `segment_seconds` - Optional segment length in seconds
pub fn welch_psd(
    samples: &[f64],
    sample_rate: f64,
    segment_seconds: Option<f64>,
) -> Result<PsdResult> {
    let config = WelchConfig {
        segment_seconds,
        ..WelchConfig::default()
    };
    welch_psd_with(samples, sample_rate, &config)
}

/// Welch PSD with explicit settings
pub fn welch_psd_with(
    samples: &[f64],
    sample_rate: f64,
    config: &WelchConfig,
) -> Result<PsdResult> {
    if !(sample_rate > 0.0 && sample_rate.is_finite()) {
        return Err(TraceError::InvalidFilterParams(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }

    let segment_length =
        resolve_segment_length(samples.len(), sample_rate, config.segment_seconds)?;
    if segment_length < 2 {
        return Err(TraceError::InsufficientSamples {
            available: samples.len(),
            required: 2,
        });
    }

    // Only whole segments take part
    let usable = samples.len() / segment_length * segment_length;
    let samples = &samples[..usable];

    let step = segment_length - segment_length / 2;
    let segments = (usable - segment_length) / step + 1;

    let window = periodic_window(config.window_type, segment_length);
    let mut engine = FftEngine::new(segment_length);
    let mut power = vec![0.0; engine.num_bins()];

    for start in (0..segments).map(|s| s * step) {
        let segment = &samples[start..start + segment_length];
        let mean = segment.iter().sum::<f64>() / segment_length as f64;
        let tapered = segment.iter().zip(&window).map(|(x, w)| (x - mean) * w);
        engine.accumulate_power(tapered, &mut power);
    }

    // Density scaling, averaged over segments
    let scale = 1.0 / (sample_rate * window_power(&window) * segments as f64);
    let bins = power.len();
    // Everything except DC (and Nyquist, when the segment is even) is folded
    let folded_end = if segment_length % 2 == 0 { bins - 1 } else { bins };
    for (k, p) in power.iter_mut().enumerate() {
        *p *= scale;
        if k > 0 && k < folded_end {
            *p *= 2.0;
        }
    }

    let frequencies = engine.frequency_axis(sample_rate);
    let cumulative_rms = integrate_rms(&frequencies, &power);

    debug!(
        "Welch PSD: {} samples, {} segments of {}, resolution {:.3} Hz",
        usable,
        segments,
        segment_length,
        sample_rate / segment_length as f64
    );

    Ok(PsdResult {
        frequencies,
        power,
        cumulative_rms,
        segment_length,
        segments,
    })
}
