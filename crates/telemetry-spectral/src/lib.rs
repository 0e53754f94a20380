//! Frequency-domain analysis of telemetry channels.
//!
//! [`SpectralAnalyzer`] turns one numeric channel plus its elapsed-time axis
//! into a [`FrequencySeries`](telemetry_core::models::FrequencySeries): either
//! a single-sided FFT amplitude spectrum or a Welch power spectral density.

pub mod analyzer;
pub mod fft;
pub mod welch;
pub mod window;

pub use analyzer::SpectralAnalyzer;
