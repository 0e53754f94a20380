use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{SpectralMode, TimeAxis};
use crate::time_utils::{default_timestamp_formats, TimestampFormat};

/// Minimum share of rows a timestamp format must parse to be selected.
pub const DEFAULT_TIMESTAMP_THRESHOLD: f64 = 0.8;

/// Minimum share of cells that must parse for a column to become numeric.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.8;

/// Distinct-value share below which a numeric column is flagged.
pub const DEFAULT_LOW_CARDINALITY_RATIO: f64 = 0.01;

/// Default Welch segment length, capped at the signal length.
pub const DEFAULT_SEGMENT_LENGTH: usize = 256;

// ── IngestConfig ──────────────────────────────────────────────────────────────

/// Policy knobs of the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Field separator for header and data lines.
    pub separator: char,
    /// Ordered timestamp-format inference chain; first passing entry wins.
    pub timestamp_formats: Vec<TimestampFormat>,
    /// Acceptance bar for a timestamp format, in `(0, 1]`.
    pub timestamp_threshold: f64,
    /// Acceptance bar for numeric coercion, in `(0, 1]`.
    pub numeric_threshold: f64,
    /// Low-cardinality flag ratio, in `[0, 1]`.
    pub low_cardinality_ratio: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            timestamp_formats: default_timestamp_formats(),
            timestamp_threshold: DEFAULT_TIMESTAMP_THRESHOLD,
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            low_cardinality_ratio: DEFAULT_LOW_CARDINALITY_RATIO,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("timestamp_threshold", self.timestamp_threshold)?;
        check_fraction("numeric_threshold", self.numeric_threshold)?;
        if !(0.0..=1.0).contains(&self.low_cardinality_ratio) {
            return Err(ConfigError::Invalid(format!(
                "low_cardinality_ratio must be within [0, 1], got {}",
                self.low_cardinality_ratio
            )));
        }
        if self.timestamp_formats.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one timestamp format is required".to_string(),
            ));
        }
        if self.separator == '\n' || self.separator == '\r' {
            return Err(ConfigError::Invalid(
                "separator cannot be a line break".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be within (0, 1], got {value}"
        )))
    }
}

// ── SpectralConfig ────────────────────────────────────────────────────────────

/// Welch segmentation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Samples per segment before capping at the signal length.
    pub segment_length: usize,
    /// Overlapping samples between segments; half a segment when `None`.
    pub overlap: Option<usize>,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            overlap: None,
        }
    }
}

impl SpectralConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_length < 2 {
            return Err(ConfigError::Invalid(format!(
                "segment_length must be at least 2, got {}",
                self.segment_length
            )));
        }
        if let Some(overlap) = self.overlap {
            if overlap >= self.segment_length {
                return Err(ConfigError::Invalid(format!(
                    "overlap {} must be smaller than segment_length {}",
                    overlap, self.segment_length
                )));
            }
        }
        Ok(())
    }
}

// ── ConfigFile ────────────────────────────────────────────────────────────────

/// Optional JSON file holding both config sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub ingest: IngestConfig,
    pub spectral: SpectralConfig,
}

impl ConfigFile {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file = serde_json::from_str(&content)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(file)
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Validate flight-test telemetry and inspect channel spectra
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flight-telemetry",
    about = "Validate flight-test telemetry and inspect channel spectra",
    version
)]
pub struct Settings {
    /// Telemetry file (.csv or .txt) with two header rows
    pub input: PathBuf,

    /// Channel to analyse in the frequency domain (repeatable)
    #[arg(long = "channel", short = 'c')]
    pub channels: Vec<String>,

    /// Frequency-domain view
    #[arg(long, value_enum, default_value = "fft")]
    pub mode: SpectralMode,

    /// Time column to analyse against
    #[arg(long, value_enum, default_value = "elapsed-seconds")]
    pub time_axis: TimeAxis,

    /// Field separator
    #[arg(long)]
    pub separator: Option<char>,

    /// Share of rows a timestamp format must parse (0-1]
    #[arg(long)]
    pub timestamp_threshold: Option<f64>,

    /// Share of cells that must parse for a numeric column (0-1]
    #[arg(long)]
    pub numeric_threshold: Option<f64>,

    /// Welch segment length in samples
    #[arg(long)]
    pub segment_length: Option<usize>,

    /// JSON config file with `ingest` and `spectral` sections
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the validated series to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print descriptive statistics for numeric channels
    #[arg(long)]
    pub stats: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Effective log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Build the effective configs: file values first (or defaults), then any
    /// flag given on the command line. Both results are validated.
    pub fn resolve_configs(&self) -> Result<(IngestConfig, SpectralConfig), ConfigError> {
        let file = match &self.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::default(),
        };
        let ConfigFile {
            mut ingest,
            mut spectral,
        } = file;

        if let Some(v) = self.separator {
            ingest.separator = v;
        }
        if let Some(v) = self.timestamp_threshold {
            ingest.timestamp_threshold = v;
        }
        if let Some(v) = self.numeric_threshold {
            ingest.numeric_threshold = v;
        }
        if let Some(v) = self.segment_length {
            spectral.segment_length = v;
        }

        ingest.validate()?;
        spectral.validate()?;
        Ok((ingest, spectral))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
