//! Shared building blocks for flight-test telemetry processing.
//!
//! Holds the table and spectrum types exchanged between crates, the error
//! taxonomy, configuration, the timestamp-format chain and the statistics
//! helpers used by both the ingestion pipeline and the analysis layer.

pub mod error;
pub mod models;
pub mod quality;
pub mod settings;
pub mod statistics;
pub mod time_utils;

pub use error::{ConfigError, IngestError, IngestResult, SpectralError, SpectralResult};
