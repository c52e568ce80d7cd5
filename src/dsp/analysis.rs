//! Signal measurements used to check what a chain did to a signal.

/// Largest absolute sample value, 0.0 for an empty slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Root-mean-square level, 0.0 for an empty slice.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Amplitude of the component at `frequency` Hz, by the Goertzel algorithm.
///
/// The result is scaled so that a full sine of amplitude `a` whose frequency
/// falls on a whole number of cycles over the slice measures `a`.
pub fn tone_magnitude(samples: &[f32], frequency: f64, sample_rate: u32) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let omega = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
    let coeff = 2.0 * omega.cos();
    let (mut s1, mut s2) = (0.0f64, 0.0f64);
    for &x in samples {
        let s0 = x as f64 + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    let power = s1 * s1 + s2 * s2 - coeff * s1 * s2;
    2.0 * power.max(0.0).sqrt() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn sine(freq: f64, amp: f64, len: usize, sr: u32) -> Vec<f32> {
        (0..len)
            .map(|i| (amp * (2.0 * std::f64::consts::PI * freq * i as f64 / sr as f64).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_peak_and_rms() {
        assert_eq!(peak(&[]), 0.0);
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(peak(&[0.2, -0.9, 0.5]), 0.9);
        assert_approx_eq!(rms(&[1.0, -1.0, 1.0, -1.0]), 1.0, 1e-12);
        assert_approx_eq!(rms(&sine(100.0, 1.0, 8000, 8000)), std::f64::consts::FRAC_1_SQRT_2, 1e-4);
    }

    #[test]
    fn test_tone_magnitude_finds_component() {
        let sr = 8000;
        let mut mixed = sine(500.0, 0.8, 8000, sr);
        for (m, s) in mixed.iter_mut().zip(sine(1500.0, 0.1, 8000, sr)) {
            *m += s;
        }
        assert_approx_eq!(tone_magnitude(&mixed, 500.0, sr), 0.8, 1e-3);
        assert_approx_eq!(tone_magnitude(&mixed, 1500.0, sr), 0.1, 1e-3);
        assert!(tone_magnitude(&mixed, 1000.0, sr) < 1e-3);
        assert_eq!(tone_magnitude(&[], 1000.0, sr), 0.0);
    }
}
