//! Integrated RMS noise from a power spectral density

/// Running RMS: `sqrt(Σ_{j≤i} power[j] · Δf)`
///
/// Bins are assumed uniformly spaced with Δf = frequencies[1] - frequencies[0].
/// With fewer than two bins there is no spacing to integrate over and the
/// result is all zeros.
pub fn integrate_rms(frequencies: &[f64], power: &[f64]) -> Vec<f64> {
    let df = match frequencies {
        [f0, f1, ..] => f1 - f0,
        _ => return vec![0.0; power.len()],
    };

    power
        .iter()
        .scan(0.0, |acc, &p| {
            *acc += p * df;
            Some(acc.sqrt())
        })
        .collect()
}
