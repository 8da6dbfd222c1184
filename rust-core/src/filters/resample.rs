//! Rate conversion by linear interpolation

/// Resample `samples` by `ratio` (output rate / input rate)
///
/// Output sample `k` is read at input position `k / ratio`, interpolating
/// linearly between neighbours and holding the last sample at the end.
/// Produces `floor(len * ratio)` samples.
pub fn linear_resample(samples: &[f64], ratio: f64) -> Vec<f64> {
    let len = samples.len();
    if len == 0 || ratio <= 0.0 || !ratio.is_finite() {
        return Vec::new();
    }

    let out_len = (len as f64 * ratio).floor() as usize;
    let last = samples[len - 1];

    (0..out_len)
        .map(|k| {
            let position = k as f64 / ratio;
            let i = position.floor() as usize;
            if i + 1 >= len {
                return last;
            }
            let frac = position - i as f64;
            samples[i] + (samples[i + 1] - samples[i]) * frac
        })
        .collect()
}
