use std::path::PathBuf;
use thiserror::Error;

/// Problems loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file could not be opened or read from disk.
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid JSON for the expected shape.
    #[error("Failed to parse config: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A value is outside its permitted range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Fatal conditions raised by the ingestion pipeline.
///
/// Row- and column-level problems never surface here; they are collected in
/// the [`QualityReport`](crate::quality::QualityReport) instead.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The uploaded bytes are not valid UTF-8 text.
    #[error("Input is not valid UTF-8 text: {0}")]
    Decode(String),

    /// Fewer than two header rows plus one data row were found.
    #[error("File must have at least 2 header rows and 1 data row (found {lines} non-empty lines)")]
    InsufficientData { lines: usize },

    /// Every data line was blank after the header rows.
    #[error("No valid data rows found")]
    NoValidRows,

    /// No configured timestamp format reached the acceptance threshold.
    #[error("Could not parse timestamps: best format '{best_format}' matched {best_ratio:.1}% of rows")]
    UnparseableTimestamps { best_format: String, best_ratio: f64 },

    /// The selected format matched, yet no row kept a valid timestamp.
    #[error("No valid timestamps found")]
    NoValidTimestamps,

    /// Columns handed to a series disagree on row count.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// The ingestion configuration is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures of a single spectral-analysis call.
///
/// These never affect the Series the samples were taken from.
#[derive(Error, Debug)]
pub enum SpectralError {
    /// Fewer than two samples were supplied.
    #[error("At least 2 samples are required for spectral analysis (got {0})")]
    InsufficientSamples(usize),

    /// Sample and time vectors differ in length.
    #[error("Sample count {values} does not match time-axis length {times}")]
    LengthMismatch { values: usize, times: usize },

    /// The time axis does not span a positive duration.
    #[error("Degenerate timebase: elapsed time spans {span} s")]
    DegenerateTimebase { span: f64 },

    /// A NaN or infinite value was found in the input.
    #[error("Invalid sample at index {index}: {value}")]
    InvalidSample { index: usize, value: f64 },

    /// The requested channel is not present in the series.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// The requested channel exists but is not numeric.
    #[error("Channel is not numeric: {0}")]
    NonNumericChannel(String),

    /// Spectral analysis only runs against elapsed seconds.
    #[error("Spectral analysis requires the ElapsedSeconds time axis")]
    UnsupportedTimeAxis,

    /// The spectral configuration is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Convenience alias for spectral-analysis results.
pub type SpectralResult<T> = std::result::Result<T, SpectralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_insufficient_data() {
        let err = IngestError::InsufficientData { lines: 2 };
        assert_eq!(
            err.to_string(),
            "File must have at least 2 header rows and 1 data row (found 2 non-empty lines)"
        );
    }

    #[test]
    fn test_error_display_no_valid_rows() {
        assert_eq!(IngestError::NoValidRows.to_string(), "No valid data rows found");
    }

    #[test]
    fn test_error_display_unparseable_timestamps() {
        let err = IngestError::UnparseableTimestamps {
            best_format: "time".to_string(),
            best_ratio: 50.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Could not parse timestamps"));
        assert!(msg.contains("'time'"));
        assert!(msg.contains("50.0%"));
    }

    #[test]
    fn test_error_display_no_valid_timestamps() {
        assert_eq!(
            IngestError::NoValidTimestamps.to_string(),
            "No valid timestamps found"
        );
    }

    #[test]
    fn test_error_display_decode() {
        let err = IngestError::Decode("invalid utf-8 sequence".to_string());
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_error_display_column_length_mismatch() {
        let err = IngestError::ColumnLengthMismatch {
            column: "FLAP".to_string(),
            expected: 4,
            found: 3,
        };
        assert_eq!(err.to_string(), "Column 'FLAP' has 3 rows, expected 4");
    }

    #[test]
    fn test_error_display_config_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ConfigError::FileRead {
            path: PathBuf::from("/etc/telemetry.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read config file"));
        assert!(msg.contains("/etc/telemetry.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_config_error_is_transparent_in_ingest_error() {
        let err: IngestError = ConfigError::Invalid("threshold 1.5".to_string()).into();
        assert_eq!(err.to_string(), "Invalid configuration: threshold 1.5");
    }

    #[test]
    fn test_error_display_insufficient_samples() {
        let err = SpectralError::InsufficientSamples(1);
        assert_eq!(
            err.to_string(),
            "At least 2 samples are required for spectral analysis (got 1)"
        );
    }

    #[test]
    fn test_error_display_degenerate_timebase() {
        let err = SpectralError::DegenerateTimebase { span: 0.0 };
        assert_eq!(err.to_string(), "Degenerate timebase: elapsed time spans 0 s");
    }

    #[test]
    fn test_error_display_invalid_sample() {
        let err = SpectralError::InvalidSample {
            index: 3,
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "Invalid sample at index 3: NaN");
    }

    #[test]
    fn test_error_display_unknown_channel() {
        let err = SpectralError::UnknownChannel("PITCH (deg)".to_string());
        assert_eq!(err.to_string(), "Unknown channel: PITCH (deg)");
    }

    #[test]
    fn test_error_display_time_axis() {
        assert!(SpectralError::UnsupportedTimeAxis
            .to_string()
            .contains("ElapsedSeconds"));
    }
}
