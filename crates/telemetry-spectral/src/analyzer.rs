//! Frequency-domain views of series channels.

use std::collections::BTreeMap;

use telemetry_core::models::{
    ChartRequest, ColumnData, FrequencySeries, Series, SpectralMode, TimeAxis, ELAPSED_COLUMN,
};
use telemetry_core::settings::SpectralConfig;
use telemetry_core::{SpectralError, SpectralResult};
use tracing::debug;

use crate::fft::amplitude_spectrum;
use crate::welch::welch_psd;

// ── SpectralAnalyzer ──────────────────────────────────────────────────────────

/// Computes FFT amplitude spectra and Welch PSDs.
///
/// Every call is a pure function of its inputs: nothing is cached between
/// calls and repeated calls return bit-identical results.
#[derive(Debug, Clone, Default)]
pub struct SpectralAnalyzer {
    config: SpectralConfig,
}

impl SpectralAnalyzer {
    pub fn new(config: SpectralConfig) -> SpectralResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Spectrum of `values` sampled at `elapsed_seconds`.
    ///
    /// The sampling interval is taken as `(last - first) / (n - 1)`; uneven
    /// spacing is not resampled.
    pub fn analyze(
        &self,
        values: &[f64],
        elapsed_seconds: &[f64],
        mode: SpectralMode,
    ) -> SpectralResult<FrequencySeries> {
        let dt = sample_interval(values, elapsed_seconds)?;

        let (frequency, magnitude) = match mode {
            SpectralMode::Fft => amplitude_spectrum(values, dt),
            SpectralMode::Psd => welch_psd(
                values,
                1.0 / dt,
                self.config.segment_length,
                self.config.overlap,
            ),
        };

        debug!(
            "analyze: {:?} over {} samples, dt={:.6}s, {} bins",
            mode,
            values.len(),
            dt,
            frequency.len()
        );

        Ok(FrequencySeries {
            mode,
            sample_interval: dt,
            frequency,
            magnitude,
        })
    }

    /// Analyze one named numeric channel against the series' elapsed time.
    ///
    /// Missing values are rejected as [`SpectralError::InvalidSample`].
    pub fn analyze_channel(
        &self,
        series: &Series,
        channel: &str,
        mode: SpectralMode,
    ) -> SpectralResult<FrequencySeries> {
        let column = series
            .column(channel)
            .ok_or_else(|| SpectralError::UnknownChannel(channel.to_string()))?;
        let ColumnData::Numeric(raw) = column.data() else {
            return Err(SpectralError::NonNumericChannel(channel.to_string()));
        };
        let elapsed = series
            .elapsed_seconds()
            .ok_or_else(|| SpectralError::UnknownChannel(ELAPSED_COLUMN.to_string()))?;

        let values: Vec<f64> = raw.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        self.analyze(&values, elapsed, mode)
    }

    /// Analyze every channel of a chart request. Each channel succeeds or
    /// fails on its own; only an unsupported time axis fails the whole call.
    pub fn analyze_chart(
        &self,
        series: &Series,
        request: &ChartRequest,
    ) -> SpectralResult<BTreeMap<String, SpectralResult<FrequencySeries>>> {
        if request.time_axis != TimeAxis::ElapsedSeconds {
            return Err(SpectralError::UnsupportedTimeAxis);
        }
        Ok(request
            .channel_names
            .iter()
            .map(|name| {
                let result = self.analyze_channel(series, name, request.mode);
                (name.clone(), result)
            })
            .collect())
    }
}

/// Validate the inputs and derive the uniform sampling interval.
fn sample_interval(values: &[f64], elapsed: &[f64]) -> SpectralResult<f64> {
    let n = values.len();
    if n < 2 {
        return Err(SpectralError::InsufficientSamples(n));
    }
    if elapsed.len() != n {
        return Err(SpectralError::LengthMismatch {
            values: n,
            times: elapsed.len(),
        });
    }
    for samples in [values, elapsed] {
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SpectralError::InvalidSample { index, value });
        }
    }

    let span = elapsed[n - 1] - elapsed[0];
    if span <= 0.0 {
        return Err(SpectralError::DegenerateTimebase { span });
    }
    Ok(span / (n - 1) as f64)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
