//! Single-sided amplitude spectrum.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Forward DFT of a real signal.
pub(crate) fn forward(samples: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    if buffer.is_empty() {
        return buffer;
    }
    let mut planner = FftPlanner::new();
    let fft: Arc<dyn Fft<f64>> = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

/// Amplitude spectrum of `samples` taken every `dt` seconds.
///
/// Returns `n/2` bins at `f_k = k / (n·dt)` with magnitude `(2/n)·|X_k|`.
/// Every bin, including 0 Hz, is scaled by two, so a pure sine of
/// amplitude `A` on a bin centre reads `A`.
pub fn amplitude_spectrum(samples: &[f64], dt: f64) -> (Vec<f64>, Vec<f64>) {
    let n = samples.len();
    let bins = n / 2;
    let spectrum = forward(samples);

    let scale = 2.0 / n as f64;
    let resolution = 1.0 / (n as f64 * dt);

    let frequency = (0..bins).map(|k| k as f64 * resolution).collect();
    let magnitude = spectrum[..bins].iter().map(|x| x.norm() * scale).collect();
    (frequency, magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_forward_impulse_is_flat() {
        let mut x = vec![0.0; 8];
        x[0] = 1.0;
        for bin in forward(&x) {
            assert!((bin.re - 1.0).abs() < 1e-12);
            assert!(bin.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_forward_empty() {
        assert!(forward(&[]).is_empty());
    }

    #[test]
    fn test_amplitude_spectrum_bin_count_and_spacing() {
        let (f, m) = amplitude_spectrum(&[0.0; 10], 0.5);
        assert_eq!(f.len(), 5);
        assert_eq!(m.len(), 5);
        assert_eq!(f[0], 0.0);
        assert!((f[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_amplitude_spectrum_recovers_sine_amplitude() {
        let n = 400;
        let dt = 0.01;
        // 5 Hz lands exactly on bin 20
        let x: Vec<f64> = (0..n)
            .map(|i| 3.0 * (2.0 * PI * 5.0 * i as f64 * dt).sin())
            .collect();
        let (f, m) = amplitude_spectrum(&x, dt);
        assert!((f[20] - 5.0).abs() < 1e-9);
        assert!((m[20] - 3.0).abs() < 1e-9);
        assert!(m[19] < 1e-9 && m[21] < 1e-9);
    }

    #[test]
    fn test_amplitude_spectrum_dc_is_doubled() {
        let (_, m) = amplitude_spectrum(&[1.0; 4], 1.0);
        assert!((m[0] - 2.0).abs() < 1e-12);
    }
}
