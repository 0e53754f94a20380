//! Line splitting, header parsing and row normalisation.
//!
//! Turns uploaded text into a rectangular table of string cells plus the
//! [`ColumnSpec`] list derived from the two header rows. Nothing is typed yet.

use telemetry_core::models::ColumnSpec;
use telemetry_core::quality::{RowWarning, RowWarningKind};
use telemetry_core::{IngestError, IngestResult};
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Header rows plus at least one data row.
const MIN_LINES: usize = 3;

// ── Types ─────────────────────────────────────────────────────────────────────

/// One input line split into trimmed cells. Not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the uploaded text.
    pub line: usize,
    pub cells: Vec<String>,
}

/// Output of [`read_table`]: every row has exactly `specs.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub specs: Vec<ColumnSpec>,
    pub rows: Vec<RawRecord>,
    pub row_warnings: Vec<RowWarning>,
}

impl RawTable {
    /// Expected column count `W`.
    pub fn width(&self) -> usize {
        self.specs.len()
    }

    /// Cells of column `index`, in row order.
    pub fn column_cells(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.cells.get(index).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decode uploaded bytes as UTF-8 text.
pub fn decode(bytes: &[u8]) -> IngestResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| IngestError::Decode(e.to_string()))
}

/// Remove a leading byte-order mark, if present.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text)
}

/// Split `line` on `separator`, trimming whitespace around every cell.
pub fn split_cells(line: &str, separator: char) -> Vec<String> {
    line.split(separator).map(|c| c.trim().to_string()).collect()
}

/// Parse the two header rows and normalise every data row to the header
/// width.
///
/// * Rows wider than the header are truncated ([`RowWarningKind::TruncatedRow`]).
/// * Narrower rows are padded with empty cells ([`RowWarningKind::PaddedRow`]).
/// * Blank lines are skipped without a warning.
pub fn read_table(text: &str, separator: char) -> IngestResult<RawTable> {
    let text = strip_bom(text);

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let non_empty = lines.clone().count();
    if non_empty < MIN_LINES {
        return Err(IngestError::InsufficientData { lines: non_empty });
    }

    let (Some((_, header1)), Some((_, header2))) = (lines.next(), lines.next()) else {
        return Err(IngestError::InsufficientData { lines: non_empty });
    };
    let specs = parse_headers(header1, header2, separator);
    let width = specs.len();

    let mut rows = Vec::with_capacity(non_empty - 2);
    let mut row_warnings = Vec::new();

    for (line, text) in lines {
        let record = RawRecord {
            line,
            cells: split_cells(text, separator),
        };
        let (record, warning) = normalize_record(record, width);
        if let Some(w) = warning {
            row_warnings.push(w);
        }
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(IngestError::NoValidRows);
    }

    debug!(
        "read_table: {} columns, {} rows, {} malformed",
        width,
        rows.len(),
        row_warnings.len()
    );

    Ok(RawTable {
        specs,
        rows,
        row_warnings,
    })
}

/// Build one [`ColumnSpec`] per header position present in both rows.
pub fn parse_headers(header1: &str, header2: &str, separator: char) -> Vec<ColumnSpec> {
    let names = split_cells(header1, separator);
    let units = split_cells(header2, separator);
    names
        .iter()
        .zip(units.iter())
        .enumerate()
        .map(|(i, (name, unit))| ColumnSpec::from_headers(i, name, unit))
        .collect()
}

/// Truncate or pad `record` to `width` cells.
pub fn normalize_record(mut record: RawRecord, width: usize) -> (RawRecord, Option<RowWarning>) {
    let found = record.cells.len();
    let kind = match found.cmp(&width) {
        std::cmp::Ordering::Equal => return (record, None),
        std::cmp::Ordering::Greater => {
            record.cells.truncate(width);
            RowWarningKind::TruncatedRow
        }
        std::cmp::Ordering::Less => {
            record.cells.resize(width, String::new());
            RowWarningKind::PaddedRow
        }
    };
    let warning = RowWarning {
        line: record.line,
        kind,
        expected: width,
        found,
    };
    (record, Some(warning))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
