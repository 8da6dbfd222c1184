//! Window functions for segment tapering
//!
//! Spectral estimates use the periodic form (period `M` rather than `M-1`),
//! so that a length-`M` window lines up with the length-`M` DFT grid.

use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// w[n] = 0.5 - 0.5*cos(2πn/P)
    #[default]
    Hann,

    /// w[n] = 0.54 - 0.46*cos(2πn/P)
    Hamming,

    /// w[n] = 0.42 - 0.5*cos(2πn/P) + 0.08*cos(4πn/P)
    Blackman,

    /// No tapering
    Rectangular,
}

impl WindowType {
    /// Coefficients of the cosine series a0 - a1*cos(x) + a2*cos(2x)
    fn cosine_terms(&self) -> [f64; 3] {
        match self {
            WindowType::Hann => [0.5, 0.5, 0.0],
            WindowType::Hamming => [0.54, 0.46, 0.0],
            WindowType::Blackman => [0.42, 0.5, 0.08],
            WindowType::Rectangular => [1.0, 0.0, 0.0],
        }
    }

    /// Name as accepted by [`WindowType::from_name`]
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Rectangular => "rectangular",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowType::Hann),
            "hamming" => Some(WindowType::Hamming),
            "blackman" => Some(WindowType::Blackman),
            "rectangular" | "boxcar" => Some(WindowType::Rectangular),
            _ => None,
        }
    }
}

fn cosine_window(window_type: WindowType, length: usize, period: f64) -> Vec<f64> {
    let [a0, a1, a2] = window_type.cosine_terms();
    (0..length)
        .map(|n| {
            let x = 2.0 * PI * n as f64 / period;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Symmetric window of `length` samples (w[0] == w[M-1])
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => cosine_window(window_type, length, (length - 1) as f64),
    }
}

/// Periodic window of `length` samples, for DFT-based estimates
///
/// Equal to the first `length` samples of a symmetric window of
/// `length + 1`.
pub fn periodic_window(window_type: WindowType, length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        _ => cosine_window(window_type, length, length as f64),
    }
}

/// Σ w[n]², the power normalisation of a density estimate
pub fn window_power(window: &[f64]) -> f64 {
    window.iter().map(|w| w * w).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_window() {
        let length = 161;

        let hann = generate_window(WindowType::Hann, length);
        let hamming = generate_window(WindowType::Hamming, length);
        let blackman = generate_window(WindowType::Blackman, length);

        for window in [&hann, &hamming, &blackman] {
            assert_eq!(window.len(), length);
            assert!((window[0] - window[length - 1]).abs() < 1e-10);
            assert!((window[length / 2] - 1.0).abs() < 1e-10);
        }

        // Hamming does not reach zero at the ends
        assert!(hamming[0] > 0.07 && hamming[0] < 0.09);
    }

    #[test]
    fn test_periodic_matches_longer_symmetric() {
        let periodic = periodic_window(WindowType::Hann, 8);
        let symmetric = generate_window(WindowType::Hann, 9);
        assert_eq!(periodic.len(), 8);
        for (p, s) in periodic.iter().zip(&symmetric) {
            assert!((p - s).abs() < 1e-12);
        }
        assert_eq!(periodic[0], 0.0);
        assert!((periodic[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hann_power() {
        // Σ w² = 3M/8 for a periodic Hann window
        let window = periodic_window(WindowType::Hann, 1024);
        assert!((window_power(&window) - 384.0).abs() < 1e-9);
    }

    #[test]
    fn test_rectangular_window() {
        let window = periodic_window(WindowType::Rectangular, 100);
        assert_eq!(window.len(), 100);
        assert!(window.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_names() {
        assert_eq!(WindowType::from_name("Hanning"), Some(WindowType::Hann));
        assert_eq!(WindowType::from_name("boxcar"), Some(WindowType::Rectangular));
        assert_eq!(WindowType::from_name("kaiser"), None);
        assert_eq!(WindowType::from_name(WindowType::Blackman.name()), Some(WindowType::Blackman));
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(generate_window(WindowType::Hann, 0).is_empty());
        assert_eq!(generate_window(WindowType::Hann, 1), vec![1.0]);
        assert!(periodic_window(WindowType::Hann, 0).is_empty());
    }
}
