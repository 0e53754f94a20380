mod bootstrap;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use telemetry_core::models::ChartRequest;
use telemetry_core::quality::Severity;
use telemetry_core::settings::Settings;
use telemetry_data::analysis::channel_statistics;
use telemetry_data::export::write_csv_to_path;
use telemetry_data::IngestionPipeline;
use telemetry_spectral::SpectralAnalyzer;

use crate::render::{render_text, RunOutput, SpectrumOutcome};

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("flight-telemetry v{} starting", env!("CARGO_PKG_VERSION"));

    let output = run(&settings)?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_text(&output));
    }

    Ok(())
}

/// Ingest the input file, run the requested analyses and export.
fn run(settings: &Settings) -> Result<RunOutput> {
    let (ingest_config, spectral_config) = settings
        .resolve_configs()
        .context("Failed to resolve configuration")?;

    let path = &settings.input;
    if !bootstrap::has_supported_extension(path) {
        tracing::warn!(
            "{} does not have a .csv or .txt extension; attempting to read it anyway",
            path.display()
        );
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let pipeline = IngestionPipeline::new(ingest_config)?;
    let (series, report) = pipeline
        .ingest_bytes(&bytes)
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    for diagnostic in report.messages() {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Info => tracing::info!("{}", diagnostic.message),
        }
    }

    let mut output = RunOutput::new(path.display().to_string(), &series, report);

    if settings.stats {
        output.statistics = channel_statistics(&series, &series.numeric_channel_names());
    }

    if !settings.channels.is_empty() {
        let analyzer = SpectralAnalyzer::new(spectral_config)?;
        let mut request = ChartRequest::new(settings.channels.iter().cloned(), settings.mode);
        request.time_axis = settings.time_axis;

        let results = analyzer.analyze_chart(&series, &request)?;
        for (name, result) in results {
            if let Err(err) = &result {
                tracing::warn!("Spectral analysis of '{}' failed: {}", name, err);
            }
            output.spectra.insert(name, SpectrumOutcome::from_result(result));
        }
    }

    if let Some(export_path) = &settings.export {
        write_csv_to_path(&series, export_path)
            .with_context(|| format!("Failed to export to {}", export_path.display()))?;
        tracing::info!("Exported {} rows to {}", series.row_count(), export_path.display());
    }

    Ok(output)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// 100 rows at 10 Hz with a 1 Hz sine on `PITCH RATE`.
    fn write_flight_file(dir: &Path) -> std::path::PathBuf {
        let mut text = String::from("Description,PITCH RATE,MODE\nEU,deg/s,EU\n");
        for i in 0..100 {
            let t = i as f64 * 0.1;
            let value = (2.0 * std::f64::consts::PI * t).sin();
            let mode = if i < 50 { "CRUISE" } else { "CLIMB" };
            text.push_str(&format!(
                "198:09:40:{:02}.{:03},{value:.6},{mode}\n",
                i / 10,
                (i % 10) * 100
            ));
        }
        let path = dir.join("flight.csv");
        std::fs::write(&path, text).expect("write input");
        path
    }

    fn settings(args: &[&str]) -> Settings {
        Settings::parse_from(std::iter::once("flight-telemetry").chain(args.iter().copied()))
    }

    #[test]
    fn test_run_reports_stats_spectra_and_exports() {
        let tmp = TempDir::new().expect("tempdir");
        let input = write_flight_file(tmp.path());
        let export = tmp.path().join("export.csv");
        let args = [
            input.to_str().unwrap(),
            "--stats",
            "-c",
            "PITCH RATE (deg/s)",
            "-c",
            "MISSING",
            "--export",
            export.to_str().unwrap(),
        ];

        let output = run(&settings(&args)).expect("run");
        assert_eq!(output.rows, 100);
        assert_eq!(output.report.timestamp_format.as_deref(), Some("day-of-year"));
        assert!(output.statistics.contains_key("PITCH RATE (deg/s)"));

        match &output.spectra["PITCH RATE (deg/s)"] {
            SpectrumOutcome::Ok { peak_frequency, .. } => {
                assert!((peak_frequency.unwrap() - 1.0).abs() < 1e-6);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(matches!(output.spectra["MISSING"], SpectrumOutcome::Error { .. }));

        let written = std::fs::read_to_string(&export).expect("read export");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Timestamp,PITCH RATE,MODE");
        assert_eq!(lines[1], "EU,deg/s,EU");
        assert_eq!(lines.len(), 2 + 100);
    }

    #[test]
    fn test_run_export_reads_back_through_run() {
        let tmp = TempDir::new().expect("tempdir");
        let input = write_flight_file(tmp.path());
        let export = tmp.path().join("export.csv");
        run(&settings(&[input.to_str().unwrap(), "--export", export.to_str().unwrap()]))
            .expect("first run");

        let again = run(&settings(&[export.to_str().unwrap()])).expect("second run");
        assert_eq!(again.rows, 100);
        assert_eq!(
            again.report.timestamp_format.as_deref(),
            Some("datetime-fractional")
        );
        assert_eq!(again.report.dropped_timestamp_rows, 0);
    }

    #[test]
    fn test_run_missing_input_fails_with_context() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("absent.csv");
        let err = run(&settings(&[missing.to_str().unwrap()])).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn test_run_export_to_missing_dir_fails() {
        let tmp = TempDir::new().expect("tempdir");
        let input = write_flight_file(tmp.path());
        let export = tmp.path().join("no/such/dir/out.csv");
        let err = run(&settings(&[input.to_str().unwrap(), "--export", export.to_str().unwrap()]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to export"));
    }
}
