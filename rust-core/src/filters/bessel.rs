//! Bessel low-pass IIR design
//!
//! Analog prototype from the roots of the reverse Bessel polynomial,
//! phase-normalised (same high-frequency asymptote as a Butterworth of equal
//! order and cutoff), then mapped to the z-plane with a pre-warped bilinear transform.
//! The result is a cascade of second-order sections with unity DC gain.

use super::sections::Section;
use crate::error::{Result, TraceError};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Highest order accepted by [`design_lowpass`]
pub const MAX_ORDER: usize = 16;

/// Iteration limit for the polynomial root search
const MAX_ROOT_ITERATIONS: usize = 500;

/// Coefficients of the reverse Bessel polynomial θ_N(s), lowest power first
///
/// θ_N(s) = Σ a_k s^k with a_k = (2N - k)! / (2^(N-k) k! (N-k)!)
pub fn reverse_bessel_coefficients(order: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; order + 1];
    coeffs[order] = 1.0;
    for k in (1..=order).rev() {
        // a_{k-1} / a_k = k (2N - k + 1) / (2 (N - k + 1))
        let (n, kf) = (order as f64, k as f64);
        coeffs[k - 1] = coeffs[k] * kf * (2.0 * n - kf + 1.0) / (2.0 * (n - kf + 1.0));
    }
    coeffs
}

/// Analog prototype poles, phase-normalised to 1 rad/s
pub fn analog_poles(order: usize) -> Vec<Complex64> {
    let theta = reverse_bessel_coefficients(order);

    // Scaling by a_0^(-1/N) gives the same high-frequency asymptote as a
    // Butterworth of equal order.
    // Roots are found on the already scaled (monic) polynomial so their
    // magnitude stays close to one.
    let scale = theta[0].powf(1.0 / order as f64);
    let monic: Vec<f64> = theta
        .iter()
        .enumerate()
        .map(|(k, &a)| a * scale.powi(k as i32 - order as i32))
        .collect();

    polynomial_roots(&monic)
}

/// Roots of a monic real polynomial (coefficients lowest power first)
/// by Durand–Kerner iteration
fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let degree = coeffs.len() - 1;
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|k| seed.powu(k as u32)).collect();

    let eval = |z: Complex64| {
        coeffs
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z + c)
    };

    for _ in 0..MAX_ROOT_ITERATIONS {
        let mut largest_step: f64 = 0.0;
        for i in 0..degree {
            let mut denominator = Complex64::new(1.0, 0.0);
            for j in 0..degree {
                if i != j {
                    denominator *= roots[i] - roots[j];
                }
            }
            let step = eval(roots[i]) / denominator;
            roots[i] -= step;
            largest_step = largest_step.max(step.norm());
        }
        if largest_step < 1e-15 {
            break;
        }
    }

    roots
}

/// Design an order-`order` Bessel low-pass
///
/// # Arguments
/// * `order` - Filter order, 1..=MAX_ORDER
/// * `wn` - Cutoff normalised to Nyquist, in (0, 1)
pub fn design_lowpass(order: usize, wn: f64) -> Result<Vec<Section>> {
    if order == 0 || order > MAX_ORDER {
        return Err(TraceError::InvalidFilterParams(format!(
            "order must be between 1 and {MAX_ORDER}, got {order}"
        )));
    }
    if !(wn > 0.0 && wn < 1.0) {
        return Err(TraceError::InvalidFilterParams(format!(
            "normalised cutoff must be in (0, 1), got {wn}"
        )));
    }

    // Bilinear transform with fs = 2 (Nyquist = 1), pre-warped so the
    // analog cutoff lands exactly on `wn`
    let fs2 = 4.0;
    let warped = fs2 * (PI * wn / 2.0).tan();
    let to_z = |p: Complex64| {
        let s = p * warped;
        (fs2 + s) / (fs2 - s)
    };

    let poles = analog_poles(order);
    let tolerance = 1e-9;

    let mut sections = Vec::with_capacity(order.div_ceil(2));
    for pole in poles.iter().filter(|p| p.im > tolerance) {
        let z = to_z(*pole);
        sections.push(Section::lowpass_pair(-2.0 * z.re, z.norm_sqr()));
    }
    for pole in poles.iter().filter(|p| p.im.abs() <= tolerance) {
        sections.push(Section::lowpass_single(-to_z(*pole).re));
    }

    debug_assert_eq!(
        sections.iter().map(Section::order).sum::<usize>(),
        order,
        "poles did not split into conjugate pairs"
    );

    Ok(sections)
}
