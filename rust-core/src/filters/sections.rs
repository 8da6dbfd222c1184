//! Second-order IIR sections and forward-backward filtering
//!
//! Sections run in transposed direct form II. Each pass starts from the
//! steady state for the first input sample, so a constant signal passes
//! through without a start-up transient.

use num_complex::Complex64;

/// One biquad: H(z) = (b0 + b1 z⁻¹ + b2 z⁻²) / (1 + a1 z⁻¹ + a2 z⁻²)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Section {
    /// Complex-conjugate pole pair with both zeros at z = -1, unity DC gain
    pub fn lowpass_pair(a1: f64, a2: f64) -> Self {
        let g = (1.0 + a1 + a2) / 4.0;
        Self {
            b: [g, 2.0 * g, g],
            a: [a1, a2],
        }
    }

    /// Single real pole with its zero at z = -1, unity DC gain
    pub fn lowpass_single(a1: f64) -> Self {
        let g = (1.0 + a1) / 2.0;
        Self {
            b: [g, g, 0.0],
            a: [a1, 0.0],
        }
    }

    /// Number of poles this section contributes
    pub fn order(&self) -> usize {
        if self.a[1] == 0.0 && self.b[2] == 0.0 {
            1
        } else {
            2
        }
    }

    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / (1.0 + self.a[0] + self.a[1])
    }

    /// Poles strictly inside the unit circle (Jury criterion for a quadratic)
    pub fn is_stable(&self) -> bool {
        let [a1, a2] = self.a;
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }

    /// Frequency response at `omega` rad/sample
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = 1.0 + z1 * self.a[0] + z2 * self.a[1];
        num / den
    }

    /// Delay-line state that holds a constant input `level` in equilibrium
    fn steady_state(&self, level: f64) -> [f64; 2] {
        let y = self.dc_gain() * level;
        let z2 = self.b[2] * level - self.a[1] * y;
        let z1 = self.b[1] * level - self.a[0] * y + z2;
        [z1, z2]
    }

    /// Filter `data` in place starting from equilibrium with `data[0]`
    fn run(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else {
            return;
        };
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        let [mut z1, mut z2] = self.steady_state(first);

        for sample in data.iter_mut() {
            let x = *sample;
            let y = b0 * x + z1;
            z1 = b1 * x - a1 * y + z2;
            z2 = b2 * x - a2 * y;
            *sample = y;
        }
    }
}

/// Apply a cascade once, front to back
pub fn filter_inplace(sections: &[Section], data: &mut [f64]) {
    for section in sections {
        section.run(data);
    }
}

/// Zero-phase filtering: forward pass, then a pass over the reversed output
///
/// The magnitude response is squared and the phase cancels.
pub fn filtfilt(sections: &[Section], input: &[f64]) -> Vec<f64> {
    let mut data = input.to_vec();
    filter_inplace(sections, &mut data);
    data.reverse();
    filter_inplace(sections, &mut data);
    data.reverse();
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_has_no_transient() {
        let sections = [Section::lowpass_pair(-1.2, 0.5), Section::lowpass_single(-0.6)];
        let input = vec![3.5; 200];

        let mut forward = input.clone();
        filter_inplace(&sections, &mut forward);
        assert!(forward.iter().all(|&v| (v - 3.5).abs() < 1e-12));

        let output = filtfilt(&sections, &input);
        assert!(output.iter().all(|&v| (v - 3.5).abs() < 1e-12));
    }

    #[test]
    fn test_single_section_difference_equation() {
        // y[n] = 0.5 x[n] + 0.5 x[n-1] - a1 y[n-1], a1 = 0 here: moving average
        let section = Section::lowpass_single(0.0);
        let mut data = vec![0.0, 2.0, 4.0, 6.0];
        filter_inplace(&[section], &mut data);
        assert_eq!(data, vec![0.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_filtfilt_has_no_delay() {
        let sections = [Section::lowpass_pair(-1.0, 0.4)];
        let input: Vec<f64> = (0..2000).map(|i| (0.02 * i as f64).sin()).collect();

        // A single pass lags the input noticeably
        let mut forward = input.clone();
        filter_inplace(&sections, &mut forward);
        let lag: f64 = (200..1800).map(|i| (forward[i] - input[i]).abs()).fold(0.0, f64::max);
        assert!(lag > 0.01);

        let output = filtfilt(&sections, &input);
        assert_eq!(output.len(), input.len());
        for i in 200..1800 {
            assert!((output[i] - input[i]).abs() < 1e-3, "sample {i}");
        }
    }

    #[test]
    fn test_response_at_dc_and_nyquist() {
        let section = Section::lowpass_pair(-0.9, 0.3);
        assert!((section.response(0.0).norm() - 1.0).abs() < 1e-12);
        assert!(section.response(std::f64::consts::PI).norm() < 1e-12);
    }

    #[test]
    fn test_stability() {
        assert!(Section::lowpass_pair(-1.2, 0.5).is_stable());
        assert!(!Section::lowpass_pair(-2.5, 1.2).is_stable());
        assert!(Section::lowpass_single(-0.6).is_stable());
    }

    #[test]
    fn test_empty_input() {
        assert!(filtfilt(&[Section::lowpass_single(-0.5)], &[]).is_empty());
    }
}
