use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

/// Name given to the first column regardless of its header text.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Name of the derived elapsed-time column.
pub const ELAPSED_COLUMN: &str = "ElapsedSeconds";

/// Unit tokens that carry no information and are left out of column names.
pub const NON_INFORMATIVE_UNITS: &[&str] = &["EU", "", "N/A", "-"];

/// Header-row prefix stripped from parameter names.
pub const DESCRIPTION_PREFIX: &str = "Description";

/// Advisory allow-list of upload extensions. Enforced by callers only.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "txt"];

// ── ColumnSpec ────────────────────────────────────────────────────────────────

/// Name and unit of one input column, derived from the two header rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Parameter name with any `Description` prefix removed.
    pub name: String,
    /// Informative unit, or `None` when the unit token was non-informative.
    pub unit: Option<String>,
}

impl ColumnSpec {
    /// Build the spec for column `index` from its two header cells.
    ///
    /// Column 0 is always the [`TIMESTAMP_COLUMN`].
    pub fn from_headers(index: usize, parameter: &str, unit: &str) -> Self {
        if index == 0 {
            return Self {
                name: TIMESTAMP_COLUMN.to_string(),
                unit: None,
            };
        }

        let parameter = parameter.trim();
        let name = parameter
            .strip_prefix(DESCRIPTION_PREFIX)
            .unwrap_or(parameter)
            .trim()
            .to_string();

        let unit = unit.trim();
        let unit = if NON_INFORMATIVE_UNITS.contains(&unit) {
            None
        } else {
            Some(unit.to_string())
        };

        Self { name, unit }
    }

    /// `"{name} ({unit})"`, or just the name when there is no unit.
    pub fn display_name(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} ({})", self.name, unit),
            None => self.name.clone(),
        }
    }
}

// ── Columns ───────────────────────────────────────────────────────────────────

/// Type tag of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Timestamp,
    ElapsedSeconds,
    Numeric,
    Text,
}

/// Typed storage of one column. Missing channel values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Timestamp(Vec<NaiveDateTime>),
    ElapsedSeconds(Vec<f64>),
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Timestamp(_) => ColumnKind::Timestamp,
            ColumnData::ElapsedSeconds(_) => ColumnKind::ElapsedSeconds,
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::ElapsedSeconds(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing cells. Timestamp and elapsed columns have none.
    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Timestamp(_) | ColumnData::ElapsedSeconds(_) => 0,
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// A named, typed column of a [`Series`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `true` when the column has rows and every one of them is missing.
    pub fn is_all_missing(&self) -> bool {
        !self.data.is_empty() && self.data.missing_count() == self.data.len()
    }
}

// ── Series ────────────────────────────────────────────────────────────────────

/// The validated, column-oriented telemetry table.
///
/// All columns share one row index. Built once by the ingestion pipeline and
/// then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    columns: Vec<Column>,
    row_count: usize,
}

impl Series {
    /// Assemble a series, checking that every column has the same length.
    pub fn from_columns(columns: Vec<Column>) -> IngestResult<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(IngestError::ColumnLengthMismatch {
                column: bad.name().to_string(),
                expected: row_count,
                found: bad.len(),
            });
        }
        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// First column with the given name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(Column::kind)
    }

    pub fn timestamps(&self) -> Option<&[NaiveDateTime]> {
        self.columns.iter().find_map(|c| match c.data() {
            ColumnData::Timestamp(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn elapsed_seconds(&self) -> Option<&[f64]> {
        self.columns.iter().find_map(|c| match c.data() {
            ColumnData::ElapsedSeconds(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Values of a numeric channel, or `None` if absent or not numeric.
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name)?.data() {
            ColumnData::Numeric(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Values of a text channel, or `None` if absent or not text.
    pub fn text(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name)?.data() {
            ColumnData::Text(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Names of all measurement columns (numeric and text).
    pub fn channel_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.kind(), ColumnKind::Numeric | ColumnKind::Text))
            .map(Column::name)
            .collect()
    }

    /// Names of the numeric measurement columns.
    pub fn numeric_channel_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .map(Column::name)
            .collect()
    }
}

// ── Spectral types ────────────────────────────────────────────────────────────

/// Which frequency-domain view to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpectralMode {
    /// Single-sided amplitude spectrum.
    Fft,
    /// Welch power spectral density.
    Psd,
}

/// Time column a chart is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxis {
    ElapsedSeconds,
    Timestamp,
}

/// The part of a chart configuration the spectral analyzer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub channel_names: BTreeSet<String>,
    pub mode: SpectralMode,
    pub time_axis: TimeAxis,
}

impl ChartRequest {
    pub fn new<I, S>(channels: I, mode: SpectralMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channel_names: channels.into_iter().map(Into::into).collect(),
            mode,
            time_axis: TimeAxis::ElapsedSeconds,
        }
    }
}

/// Spectrum of one channel: parallel frequency (Hz) and magnitude vectors.
///
/// `magnitude` is linear amplitude in [`SpectralMode::Fft`] and power per Hz
/// in [`SpectralMode::Psd`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySeries {
    pub mode: SpectralMode,
    /// Uniform sampling interval (s) the bins were computed against.
    pub sample_interval: f64,
    pub frequency: Vec<f64>,
    pub magnitude: Vec<f64>,
}

impl FrequencySeries {
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Spacing between adjacent bins, if there are at least two.
    pub fn bin_width(&self) -> Option<f64> {
        match self.frequency.as_slice() {
            [a, b, ..] => Some(b - a),
            _ => None,
        }
    }

    /// `(frequency, magnitude)` of the largest bin above 0 Hz.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequency
            .iter()
            .zip(&self.magnitude)
            .filter(|(f, _)| **f > 0.0)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(f, m)| (*f, *m))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
