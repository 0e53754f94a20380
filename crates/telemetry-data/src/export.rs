//! CSV export in the same two-header-row layout the pipeline ingests.
//!
//! Row 1 carries channel names, row 2 their units (`EU` when none). The
//! derived elapsed-time column is left out; ingest derives it again.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use telemetry_core::models::{ColumnData, ColumnKind, Series};
use telemetry_core::time_utils::format_timestamp;
use thiserror::Error;
use tracing::debug;

/// Unit written for columns that have none.
pub const PLACEHOLDER_UNIT: &str = "EU";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create export file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),
}

/// Split `"NAME (unit)"` back into its name and unit.
pub fn split_display_name(display: &str) -> (&str, Option<&str>) {
    static UNIT_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = UNIT_SUFFIX
        .get_or_init(|| Regex::new(r"^(.*\S) \(([^()]+)\)$").expect("regex is valid"));

    match re.captures(display) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(name), Some(unit)) => (name.as_str(), Some(unit.as_str())),
            _ => (display, None),
        },
        None => (display, None),
    }
}

/// Write every column of `series` except the elapsed-time column.
pub fn write_csv<W: Write>(series: &Series, writer: W) -> Result<(), ExportError> {
    let columns: Vec<_> = series
        .columns()
        .iter()
        .filter(|c| c.kind() != ColumnKind::ElapsedSeconds)
        .collect();

    // Ingest never unquotes and no cell can hold the separator.
    let mut out = csv::WriterBuilder::new()
        .flexible(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    let (names, units): (Vec<&str>, Vec<&str>) = columns
        .iter()
        .map(|c| {
            let (name, unit) = split_display_name(c.name());
            (name, unit.unwrap_or(PLACEHOLDER_UNIT))
        })
        .unzip();
    out.write_record(&names)?;
    out.write_record(&units)?;

    for row in 0..series.row_count() {
        let record: Vec<String> = columns.iter().map(|c| render_cell(c.data(), row)).collect();
        out.write_record(&record)?;
    }

    out.flush()?;
    debug!(
        "export: wrote {} rows x {} columns",
        series.row_count(),
        columns.len()
    );
    Ok(())
}

/// Create (or truncate) `path` and write the series to it.
pub fn write_csv_to_path(series: &Series, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(series, std::io::BufWriter::new(file))
}

fn render_cell(data: &ColumnData, row: usize) -> String {
    match data {
        ColumnData::Timestamp(v) => format_timestamp(&v[row]),
        ColumnData::ElapsedSeconds(v) => v[row].to_string(),
        ColumnData::Numeric(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
        ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest;
    use tempfile::TempDir;

    const INPUT: &str = "Description,ANGLE OF ATTACK,AILERON DEFLECTION,MODE\n\
                         EU,deg,deg,EU\n\
                         198:09:40:00.000,30.73,-0.066,CRUISE\n\
                         198:09:40:00.100,,0.000,CRUISE\n\
                         198:09:40:00.200,30.80,0.012,CLIMB\n\
                         198:09:40:00.300,30.81,0.013,CLIMB\n\
                         198:09:40:00.400,30.82,0.014,CLIMB\n";

    fn export_to_string(series: &Series) -> String {
        let mut buf = Vec::new();
        write_csv(series, &mut buf).expect("export");
        String::from_utf8(buf).expect("utf-8")
    }

    #[test]
    fn test_split_display_name() {
        assert_eq!(split_display_name("ANGLE OF ATTACK (deg)"), ("ANGLE OF ATTACK", Some("deg")));
        assert_eq!(split_display_name("MODE"), ("MODE", None));
        assert_eq!(split_display_name("Timestamp"), ("Timestamp", None));
        assert_eq!(split_display_name("LOAD (lb) (x)"), ("LOAD (lb)", Some("x")));
    }

    #[test]
    fn test_write_csv_layout() {
        let (series, _) = ingest(INPUT).expect("ingest");
        let text = export_to_string(&series);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Timestamp,ANGLE OF ATTACK,AILERON DEFLECTION,MODE");
        assert_eq!(lines[1], "EU,deg,deg,EU");
        assert_eq!(lines[2], "1900-07-17 09:40:00.000,30.73,-0.066,CRUISE");
        assert_eq!(lines[3], "1900-07-17 09:40:00.100,,0,CRUISE");
        assert_eq!(lines.len(), 2 + series.row_count());
        assert!(!text.contains("ElapsedSeconds"));
    }

    #[test]
    fn test_export_reingest_preserves_series() {
        let (series, _) = ingest(INPUT).expect("ingest");
        let (again, report) = ingest(&export_to_string(&series)).expect("re-ingest");
        assert_eq!(again.column_names(), series.column_names());
        assert_eq!(again.elapsed_seconds(), series.elapsed_seconds());
        assert_eq!(again.timestamps(), series.timestamps());
        assert_eq!(
            again.numeric("ANGLE OF ATTACK (deg)"),
            series.numeric("ANGLE OF ATTACK (deg)")
        );
        assert_eq!(again.text("MODE"), series.text("MODE"));
        assert_eq!(report.timestamp_format.as_deref(), Some("datetime-fractional"));
    }

    #[test]
    fn test_export_reingest_keeps_quotes_verbatim() {
        let input = "Time,A,NOTE\nEU,V,EU\n\
                     10:00:00,1,say \"hi\"\n\
                     10:00:01,2,\"quoted\"\n\
                     10:00:02,3,plain\n";
        let (series, _) = ingest(input).expect("ingest");
        let text = export_to_string(&series);
        assert!(text.contains(",say \"hi\"\n"));
        assert!(!text.contains("\"\""));

        let (again, _) = ingest(&text).expect("re-ingest");
        assert_eq!(again.text("NOTE"), series.text("NOTE"));
        assert_eq!(
            again.text("NOTE").unwrap()[0].as_deref(),
            Some("say \"hi\"")
        );
    }

    #[test]
    fn test_export_reingest_whole_second_rows() {
        let input = "Time,A\nEU,V\n10:00:00,1\n10:00:01,2\n10:00:02,3\n";
        let (series, _) = ingest(input).expect("ingest");
        let (again, report) = ingest(&export_to_string(&series)).expect("re-ingest");
        assert_eq!(again.row_count(), 3);
        assert_eq!(again.timestamps(), series.timestamps());
        assert_eq!(report.timestamp_format.as_deref(), Some("datetime-fractional"));
        assert_eq!(report.dropped_timestamp_rows, 0);
    }

    #[test]
    fn test_write_csv_to_path() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("out.csv");
        let (series, _) = ingest(INPUT).expect("ingest");
        write_csv_to_path(&series, &path).expect("export");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert!(written.starts_with("Timestamp,"));
    }

    #[test]
    fn test_write_csv_to_missing_dir_fails() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("no/such/dir/out.csv");
        let (series, _) = ingest(INPUT).expect("ingest");
        let err = write_csv_to_path(&series, &path).unwrap_err();
        assert!(matches!(err, ExportError::Create { .. }));
    }
}
