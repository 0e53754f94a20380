//! Window functions for segment tapering.

use std::f64::consts::PI;

/// Periodic Hann window of `len` points: `w[i] = 0.5 - 0.5·cos(2πi/len)`.
///
/// The periodic form (denominator `len`, not `len - 1`) is the one used for
/// spectral estimation; it tiles without a repeated endpoint.
pub fn hann_periodic(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    let n = len as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
        .collect()
}

/// `Σ w[i]²`, the power normalisation of a window.
pub fn power_sum(window: &[f64]) -> f64 {
    window.iter().map(|w| w * w).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_periodic_shape() {
        let w = hann_periodic(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-15);
        // Peak sits at len / 2 for the periodic form
        assert!((w[4] - 1.0).abs() < 1e-15);
        assert!((w[2] - 0.5).abs() < 1e-12);
        assert!((w[1] - w[7]).abs() < 1e-12);
    }

    #[test]
    fn test_hann_periodic_degenerate_lengths() {
        assert!(hann_periodic(0).is_empty());
        assert_eq!(hann_periodic(1), vec![0.0]);
        let w = hann_periodic(2);
        assert!(w[0].abs() < 1e-15);
        assert!((w[1] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_power_sum() {
        // Σ w² of a periodic Hann window is 3N/8
        let w = hann_periodic(256);
        assert!((power_sum(&w) - 96.0).abs() < 1e-9);
    }
}
