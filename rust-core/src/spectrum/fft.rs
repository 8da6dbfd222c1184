//! FFT engine using realfft for real-valued signals
//!
//! Plans once per segment length and reuses its buffers, so averaging many
//! periodograms does not allocate per segment.

use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex64>,

    /// Scratch space for the transform
    scratch: Vec<Complex64>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
            scratch,
        }
    }

    /// Transform `signal` (zero-padded or truncated to `fft_size`)
    fn transform(&mut self, signal: impl IntoIterator<Item = f64>) -> &[Complex64] {
        self.input_buffer.fill(0.0);
        for (slot, value) in self.input_buffer.iter_mut().zip(signal) {
            *slot = value;
        }

        // Buffer lengths come from the planner, so this cannot fail
        self.r2c
            .process_with_scratch(
                &mut self.input_buffer,
                &mut self.output_buffer,
                &mut self.scratch,
            )
            .expect("FFT buffer sizes match the plan");

        &self.output_buffer
    }

    /// Magnitude spectrum |X[k]| for k = 0..=fft_size/2
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Vec<f64> {
        self.transform(signal.iter().copied())
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    /// Power spectrum |X[k]|²
    pub fn compute_power(&mut self, signal: &[f64]) -> Vec<f64> {
        let mut power = vec![0.0; self.num_bins()];
        self.accumulate_power(signal.iter().copied(), &mut power);
        power
    }

    /// Add |X[k]|² of `signal` onto `accumulator`
    ///
    /// # Arguments
    /// * `signal` - Samples to transform, already tapered
    /// * `accumulator` - Running sum, `num_bins()` long
    pub fn accumulate_power(
        &mut self,
        signal: impl IntoIterator<Item = f64>,
        accumulator: &mut [f64],
    ) {
        let spectrum = self.transform(signal);
        for (acc, c) in accumulator.iter_mut().zip(spectrum) {
            *acc += c.norm_sqr();
        }
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of `bin` in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// Bin centres from DC to Nyquist in Hz
    pub fn frequency_axis(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.bin_to_hz(bin, sample_rate))
            .collect()
    }
}
