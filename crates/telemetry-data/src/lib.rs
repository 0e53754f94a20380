//! Ingestion layer for flight-test telemetry.
//!
//! Reads two-header-row CSV/TXT uploads, infers the timestamp format,
//! coerces channels to numbers, derives elapsed time and runs the quality
//! pass. Also holds the read-only analysis helpers and the CSV exporter.

pub mod analysis;
pub mod export;
pub mod pipeline;
pub mod reader;
pub mod validator;

pub use pipeline::{ingest, IngestionPipeline};
pub use telemetry_core as core;
