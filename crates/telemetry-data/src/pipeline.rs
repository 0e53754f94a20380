//! Ingestion pipeline: raw telemetry text → validated [`Series`].
//!
//! Stages run in a fixed order and only ever narrow the input:
//!
//! 1. line split and minimum-size check   ([`crate::reader`])
//! 2. header parse                        ([`crate::reader`])
//! 3. row normalisation                   ([`crate::reader`])
//! 4. timestamp format inference and row drop
//! 5. numeric coercion per column
//! 6. ordering, elapsed seconds and sampling-rate estimate
//! 7. quality pass                        ([`crate::validator`])
//!
//! A fatal condition at any stage discards all earlier work.

use chrono::NaiveDateTime;
use telemetry_core::models::{Column, ColumnData, Series, ELAPSED_COLUMN, TIMESTAMP_COLUMN};
use telemetry_core::quality::{QualityReport, SamplingEstimate};
use telemetry_core::settings::IngestConfig;
use telemetry_core::statistics::{diff, median};
use telemetry_core::time_utils::{seconds_between, TimestampFormat};
use telemetry_core::{IngestError, IngestResult};
use tracing::debug;

use crate::reader::{decode, read_table, RawTable};
use crate::validator::QualityValidator;

// ── IngestionPipeline ─────────────────────────────────────────────────────────

/// Converts uploaded telemetry into a [`Series`] and its [`QualityReport`].
///
/// Holds only configuration, so one pipeline can serve any number of uploads.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    config: IngestConfig,
}

impl IngestionPipeline {
    /// Create a pipeline with the supplied configuration.
    pub fn new(config: IngestConfig) -> IngestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a pipeline with the default thresholds and format chain.
    pub fn with_defaults() -> Self {
        Self {
            config: IngestConfig::default(),
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Decode `bytes` as UTF-8 and run [`ingest`](Self::ingest).
    pub fn ingest_bytes(&self, bytes: &[u8]) -> IngestResult<(Series, QualityReport)> {
        self.ingest(decode(bytes)?)
    }

    /// Run every stage over `raw_text`.
    pub fn ingest(&self, raw_text: &str) -> IngestResult<(Series, QualityReport)> {
        let mut report = QualityReport::default();

        // ── Stages 1–3: split, headers, row normalisation ────────────────────
        let table = read_table(raw_text, self.config.separator)?;
        report.row_warnings = table.row_warnings.clone();

        // ── Stage 4: timestamps ──────────────────────────────────────────────
        let selection = select_timestamp_format(
            &table.column_cells(0),
            &self.config.timestamp_formats,
            self.config.timestamp_threshold,
        )?;
        report.timestamp_format = Some(selection.format_name.clone());

        let mut kept: Vec<(usize, NaiveDateTime)> = selection
            .parsed
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| ts.map(|t| (i, t)))
            .collect();
        report.dropped_timestamp_rows = table.rows.len() - kept.len();
        if kept.is_empty() {
            return Err(IngestError::NoValidTimestamps);
        }

        // ── Stage 6 (ordering part): stable sort by time ─────────────────────
        let original_order: Vec<usize> = kept.iter().map(|(i, _)| *i).collect();
        kept.sort_by_key(|(_, t)| *t);
        let order: Vec<usize> = kept.iter().map(|(i, _)| *i).collect();
        report.reordered_rows = order
            .iter()
            .zip(&original_order)
            .filter(|(a, b)| a != b)
            .count();
        let timestamps: Vec<NaiveDateTime> = kept.iter().map(|(_, t)| *t).collect();

        // ── Stage 5: numeric coercion ────────────────────────────────────────
        let mut columns = Vec::with_capacity(table.width() + 1);
        columns.push(Column::new(
            TIMESTAMP_COLUMN,
            ColumnData::Timestamp(timestamps.clone()),
        ));
        for index in 1..table.width() {
            columns.push(self.coerce_column(&table, index, &order, &mut report));
        }

        // ── Stage 6: derived columns ─────────────────────────────────────────
        let elapsed = elapsed_seconds(&timestamps);
        report.sampling = estimate_sampling(&elapsed);
        columns.push(Column::new(
            ELAPSED_COLUMN,
            ColumnData::ElapsedSeconds(elapsed),
        ));

        // ── Stage 7: quality pass ────────────────────────────────────────────
        let validator = QualityValidator::new(self.config.low_cardinality_ratio);
        let columns = validator.validate(columns, &mut report);

        let series = Series::from_columns(columns)?;
        debug!(
            "ingest: {} rows x {} columns, format '{}', {} rows dropped",
            series.row_count(),
            series.column_count(),
            selection.format_name,
            report.dropped_timestamp_rows
        );
        Ok((series, report))
    }

    /// Coerce column `index` to numeric when enough cells parse, otherwise
    /// keep it as text. `order` selects and orders the surviving rows.
    fn coerce_column(
        &self,
        table: &RawTable,
        index: usize,
        order: &[usize],
        report: &mut QualityReport,
    ) -> Column {
        let name = table.specs[index].display_name();
        let cells: Vec<&str> = order
            .iter()
            .map(|&r| table.rows[r].cells[index].as_str())
            .collect();

        let values: Vec<Option<f64>> = cells.iter().map(|c| parse_number(c)).collect();
        let parsed = values.iter().filter(|v| v.is_some()).count();
        let ratio = parsed as f64 / cells.len() as f64;

        if ratio >= self.config.numeric_threshold {
            let missing = cells.len() - parsed;
            if missing > 0 {
                report.coerced_missing.insert(name.clone(), missing);
            }
            return Column::new(name, ColumnData::Numeric(values));
        }

        let text: Vec<Option<String>> = cells
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect();
        if text.iter().any(Option::is_some) {
            report.text_columns.push(name.clone());
        }
        Column::new(name, ColumnData::Text(text))
    }
}

/// Ingest with the default configuration.
pub fn ingest(raw_text: &str) -> IngestResult<(Series, QualityReport)> {
    IngestionPipeline::with_defaults().ingest(raw_text)
}

// ── Stage helpers ─────────────────────────────────────────────────────────────

/// Outcome of timestamp-format inference.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSelection {
    pub format_name: String,
    pub ratio: f64,
    /// One entry per input cell; `None` where the selected format failed.
    pub parsed: Vec<Option<NaiveDateTime>>,
}

/// Walk `formats` in order and return the first whose success ratio reaches
/// `threshold`.
pub fn select_timestamp_format(
    cells: &[&str],
    formats: &[TimestampFormat],
    threshold: f64,
) -> IngestResult<FormatSelection> {
    let mut best: Option<(&str, f64)> = None;

    for format in formats {
        let parsed: Vec<Option<NaiveDateTime>> = cells.iter().map(|c| format.parse(c)).collect();
        let ok = parsed.iter().filter(|p| p.is_some()).count();
        let ratio = if cells.is_empty() {
            0.0
        } else {
            ok as f64 / cells.len() as f64
        };
        debug!("timestamp format '{}' matched {:.3}", format.name, ratio);

        if ratio >= threshold {
            return Ok(FormatSelection {
                format_name: format.name.clone(),
                ratio,
                parsed,
            });
        }
        if best.map_or(true, |(_, r)| ratio > r) {
            best = Some((format.name.as_str(), ratio));
        }
    }

    let (best_format, best_ratio) = best.unwrap_or(("none", 0.0));
    Err(IngestError::UnparseableTimestamps {
        best_format: best_format.to_string(),
        best_ratio: best_ratio * 100.0,
    })
}

/// Parse one cell as a number. Empty cells and `NaN` literals are missing.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Seconds since the earliest timestamp. Input must already be sorted.
pub fn elapsed_seconds(sorted: &[NaiveDateTime]) -> Vec<f64> {
    let Some(&start) = sorted.first() else {
        return Vec::new();
    };
    sorted.iter().map(|&t| seconds_between(start, t)).collect()
}

/// `1 / median(diff(elapsed))` when at least two rows exist and the median
/// step is positive.
pub fn estimate_sampling(elapsed: &[f64]) -> Option<SamplingEstimate> {
    if elapsed.len() < 2 {
        return None;
    }
    let interval = median(&diff(elapsed))?;
    (interval > 0.0).then(|| SamplingEstimate {
        rate_hz: 1.0 / interval,
        median_interval_s: interval,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
