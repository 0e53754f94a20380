//! Side-channel diagnostics produced while building a [`Series`](crate::models::Series).
//!
//! Nothing in here is ever raised as an error. Callers decide how to render
//! the report; [`QualityReport::messages`] gives a ready-made rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Row-level warnings ────────────────────────────────────────────────────────

/// What the row normaliser did to a malformed data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowWarningKind {
    /// Extra trailing cells were cut off.
    TruncatedRow,
    /// Missing trailing cells were filled with empty strings.
    PaddedRow,
}

/// A data line whose width did not match the header width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    /// 1-based line number in the uploaded text.
    pub line: usize,
    pub kind: RowWarningKind,
    /// Header width.
    pub expected: usize,
    /// Cells actually present on the line.
    pub found: usize,
}

// ── Column-level findings ─────────────────────────────────────────────────────

/// A numeric channel holding a single distinct value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantColumn {
    pub name: String,
    pub value: f64,
}

/// A numeric channel with very few distinct values relative to its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowCardinalityColumn {
    pub name: String,
    pub distinct: usize,
}

/// Sampling rate estimated from the median elapsed-time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingEstimate {
    pub rate_hz: f64,
    pub median_interval_s: f64,
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// One human-readable line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }
}

// ── QualityReport ─────────────────────────────────────────────────────────────

/// Diagnostics accumulated by one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Truncated or padded data lines, in file order.
    pub row_warnings: Vec<RowWarning>,
    /// Name of the timestamp format the inference chain selected.
    pub timestamp_format: Option<String>,
    /// Rows removed because their timestamp did not parse.
    pub dropped_timestamp_rows: usize,
    /// Rows whose position changed when ordering by timestamp.
    pub reordered_rows: usize,
    /// Per numeric column: cells that did not parse and became missing.
    pub coerced_missing: BTreeMap<String, usize>,
    /// Columns kept as text because too few cells were numeric.
    pub text_columns: Vec<String>,
    /// Columns removed because every value was missing.
    pub dropped_columns: Vec<String>,
    /// Rows whose timestamp equals an earlier row's.
    pub duplicate_timestamps: usize,
    pub constant_columns: Vec<ConstantColumn>,
    pub low_cardinality_columns: Vec<LowCardinalityColumn>,
    pub sampling: Option<SamplingEstimate>,
}

impl QualityReport {
    pub fn truncated_rows(&self) -> usize {
        self.count_rows(RowWarningKind::TruncatedRow)
    }

    pub fn padded_rows(&self) -> usize {
        self.count_rows(RowWarningKind::PaddedRow)
    }

    fn count_rows(&self, kind: RowWarningKind) -> usize {
        self.row_warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn sampling_rate_hz(&self) -> Option<f64> {
        self.sampling.map(|s| s.rate_hz)
    }

    /// `true` when at least one warning-level finding was recorded.
    pub fn has_warnings(&self) -> bool {
        self.messages()
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Render every finding as a display line, warnings and infos interleaved
    /// in pipeline order.
    pub fn messages(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for w in &self.row_warnings {
            let msg = match w.kind {
                RowWarningKind::TruncatedRow => format!(
                    "Line {}: {} extra column(s) truncated",
                    w.line,
                    w.found.saturating_sub(w.expected)
                ),
                RowWarningKind::PaddedRow => format!(
                    "Line {}: {} missing column(s) padded with empty values",
                    w.line,
                    w.expected.saturating_sub(w.found)
                ),
            };
            out.push(Diagnostic::warning(msg));
        }

        if self.dropped_timestamp_rows > 0 {
            out.push(Diagnostic::warning(format!(
                "Removed {} rows with invalid timestamps",
                self.dropped_timestamp_rows
            )));
        }

        if self.reordered_rows > 0 {
            out.push(Diagnostic::warning(format!(
                "{} rows were out of time order and have been sorted",
                self.reordered_rows
            )));
        }

        for (col, count) in &self.coerced_missing {
            out.push(Diagnostic::warning(format!(
                "Column '{col}': {count} non-numeric values converted to missing"
            )));
        }

        for col in &self.text_columns {
            out.push(Diagnostic::warning(format!(
                "Column '{col}': Too many non-numeric values, keeping as text"
            )));
        }

        if let Some(s) = &self.sampling {
            out.push(Diagnostic::info(format!(
                "Detected sampling rate: {:.1} Hz (interval: {:.3}s)",
                s.rate_hz, s.median_interval_s
            )));
        }

        if !self.dropped_columns.is_empty() {
            out.push(Diagnostic::warning(format!(
                "Empty columns detected: {:?}",
                self.dropped_columns
            )));
        }

        if self.duplicate_timestamps > 0 {
            out.push(Diagnostic::warning(format!(
                "Found {} duplicate timestamps",
                self.duplicate_timestamps
            )));
        }

        for c in &self.constant_columns {
            out.push(Diagnostic::warning(format!(
                "Column '{}' has constant value: {}",
                c.name, c.value
            )));
        }

        for c in &self.low_cardinality_columns {
            out.push(Diagnostic::info(format!(
                "Column '{}' has very few unique values ({})",
                c.name, c.distinct
            )));
        }

        out
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
