//! Plain-text and JSON rendering of one ingestion run.

use std::collections::BTreeMap;

use serde::Serialize;
use telemetry_core::models::{ColumnKind, FrequencySeries, Series};
use telemetry_core::quality::{Diagnostic, QualityReport, Severity};
use telemetry_core::statistics::Summary;
use telemetry_core::SpectralResult;
use telemetry_data::analysis::{categorize_parameters, ParameterCategory};

// ── Output model ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
}

/// Outcome of one channel's spectral analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SpectrumOutcome {
    Ok {
        peak_frequency: Option<f64>,
        peak_magnitude: Option<f64>,
        spectrum: FrequencySeries,
    },
    Error {
        message: String,
    },
}

impl SpectrumOutcome {
    pub fn from_result(result: SpectralResult<FrequencySeries>) -> Self {
        match result {
            Ok(spectrum) => {
                let peak = spectrum.peak();
                Self::Ok {
                    peak_frequency: peak.map(|(f, _)| f),
                    peak_magnitude: peak.map(|(_, m)| m),
                    spectrum,
                }
            }
            Err(err) => Self::Error {
                message: err.to_string(),
            },
        }
    }
}

/// Everything the front end prints for one file.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub file: String,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    pub report: QualityReport,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub statistics: BTreeMap<String, Summary>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub spectra: BTreeMap<String, SpectrumOutcome>,
}

impl RunOutput {
    pub fn new(file: impl Into<String>, series: &Series, report: QualityReport) -> Self {
        let categories: BTreeMap<String, ParameterCategory> = categorize_parameters(series)
            .into_iter()
            .flat_map(|(cat, names)| names.into_iter().map(move |n| (n, cat)))
            .collect();

        let columns = series
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                kind: c.kind(),
                category: categories.get(c.name()).map(ParameterCategory::label),
            })
            .collect();

        Self {
            file: file.into(),
            rows: series.row_count(),
            columns,
            diagnostics: report.messages(),
            report,
            statistics: BTreeMap::new(),
            spectra: BTreeMap::new(),
        }
    }
}

// ── Text rendering ─────────────────────────────────────────────────────────────

fn kind_label(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Timestamp => "timestamp",
        ColumnKind::ElapsedSeconds => "elapsed",
        ColumnKind::Numeric => "numeric",
        ColumnKind::Text => "text",
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".to_string())
}

/// Render the run as the human-readable report printed to stdout.
pub fn render_text(out: &RunOutput) -> String {
    let mut lines = vec![
        format!("File: {}", out.file),
        format!(
            "Rows: {}  Columns: {}  Timestamp format: {}",
            out.rows,
            out.columns.len(),
            out.report.timestamp_format.as_deref().unwrap_or("-")
        ),
    ];
    if let Some(rate) = out.report.sampling_rate_hz() {
        lines.push(format!("Sampling rate: {rate:.1} Hz"));
    }

    let width = out.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    lines.push("\nColumns:".to_string());
    for c in &out.columns {
        let mut line = format!("  {:<width$}  {:<9}", c.name, kind_label(c.kind));
        if let Some(cat) = c.category {
            line.push_str(&format!("  [{cat}]"));
        }
        lines.push(line);
    }

    if !out.diagnostics.is_empty() {
        lines.push("\nDiagnostics:".to_string());
        for d in &out.diagnostics {
            let tag = match d.severity {
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            lines.push(format!("  [{tag}] {}", d.message));
        }
    }

    if !out.statistics.is_empty() {
        lines.push("\nStatistics:".to_string());
        for (name, st) in &out.statistics {
            lines.push(format!(
                "  {name}: count={} mean={:.4} std={} min={:.4} max={:.4} median={:.4} \
                 q25={:.4} q75={:.4} range={:.4} skew={} kurt={}",
                st.count,
                st.mean,
                opt(st.std),
                st.min,
                st.max,
                st.median,
                st.q25,
                st.q75,
                st.range,
                opt(st.skewness),
                opt(st.kurtosis),
            ));
        }
    }

    if !out.spectra.is_empty() {
        lines.push("\nSpectra:".to_string());
        for (name, outcome) in &out.spectra {
            lines.push(match outcome {
                SpectrumOutcome::Ok {
                    peak_frequency,
                    peak_magnitude,
                    spectrum,
                } => format!(
                    "  {name}: {:?} peak {} Hz magnitude {} ({} bins, dt={:.6}s)",
                    spectrum.mode,
                    opt(*peak_frequency),
                    opt(*peak_magnitude),
                    spectrum.len(),
                    spectrum.sample_interval
                ),
                SpectrumOutcome::Error { message } => format!("  {name}: error: {message}"),
            });
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

// ── Tests ──────────────────────────────────────────────────────────────────────
