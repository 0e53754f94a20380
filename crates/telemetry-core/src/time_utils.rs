use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Year assumed for timestamps whose text carries no year.
pub const DEFAULT_EPOCH_YEAR: i64 = 1900;

/// Rendering used when timestamps are written back out as text.
///
/// Always carries milliseconds; finer timestamps fall back to
/// [`FINE_EXPORT_TIMESTAMP_PATTERN`].
pub const EXPORT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Rendering for timestamps with sub-millisecond digits.
pub const FINE_EXPORT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S%.f";

// ── DateAnchor ────────────────────────────────────────────────────────────────

/// How the calendar date is completed when the pattern does not carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAnchor {
    /// The pattern carries a full calendar date.
    #[default]
    None,
    /// The pattern carries a day-of-year; only the year is filled in.
    Year,
    /// The pattern carries a time of day only; the date becomes January 1st.
    YearStart,
}

// ── TimestampFormat ───────────────────────────────────────────────────────────

/// One entry in the ordered timestamp-format inference chain.
///
/// `pattern` uses chrono's strftime syntax. `%.f` matches an optional
/// fractional-seconds suffix of up to nine digits; set `require_fraction`
/// to reject cells that omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampFormat {
    /// Short identifier reported back in the quality report.
    pub name: String,
    /// strftime-style pattern the whole cell must match.
    pub pattern: String,
    /// How to complete a partial date.
    #[serde(default)]
    pub anchor: DateAnchor,
    /// Only accept cells whose seconds field carries a fractional part.
    #[serde(default)]
    pub require_fraction: bool,
}

impl TimestampFormat {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, anchor: DateAnchor) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            anchor,
            require_fraction: false,
        }
    }

    pub fn with_required_fraction(mut self) -> Self {
        self.require_fraction = true;
        self
    }

    /// Parse a single cell. Returns `None` for empty or non-matching text.
    pub fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if self.require_fraction && !has_fraction(s) {
            return None;
        }

        let mut parsed = Parsed::new();
        parse(&mut parsed, s, StrftimeItems::new(&self.pattern)).ok()?;

        match self.anchor {
            DateAnchor::None => {}
            DateAnchor::Year => parsed.set_year(DEFAULT_EPOCH_YEAR).ok()?,
            DateAnchor::YearStart => {
                parsed.set_year(DEFAULT_EPOCH_YEAR).ok()?;
                parsed.set_month(1).ok()?;
                parsed.set_day(1).ok()?;
            }
        }

        parsed.to_naive_datetime_with_offset(0).ok()
    }
}

/// `true` when the text after the last `:` holds a decimal point.
fn has_fraction(s: &str) -> bool {
    s.rsplit(':').next().is_some_and(|sec| sec.contains('.'))
}

/// The built-in inference chain, tried in order; the first format that
/// clears the acceptance threshold wins.
///
/// 1. `day-of-year`          `DDD:HH:MM:SS.fff` (telemetry recorder clock)
/// 2. `datetime-fractional`  `YYYY-MM-DD HH:MM:SS.fff`
/// 3. `datetime`             `YYYY-MM-DD HH:MM:SS`
/// 4. `time-fractional`      `HH:MM:SS.fff`
/// 5. `time`                 `HH:MM:SS`
pub fn default_timestamp_formats() -> Vec<TimestampFormat> {
    vec![
        TimestampFormat::new("day-of-year", "%j:%H:%M:%S%.f", DateAnchor::Year),
        TimestampFormat::new(
            "datetime-fractional",
            "%Y-%m-%d %H:%M:%S%.f",
            DateAnchor::None,
        )
        .with_required_fraction(),
        TimestampFormat::new("datetime", "%Y-%m-%d %H:%M:%S", DateAnchor::None),
        TimestampFormat::new("time-fractional", "%H:%M:%S%.f", DateAnchor::YearStart)
            .with_required_fraction(),
        TimestampFormat::new("time", "%H:%M:%S", DateAnchor::YearStart),
    ]
}

// ── Conversions ───────────────────────────────────────────────────────────────

/// Signed seconds from `start` to `end`, with nanosecond resolution.
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1_000_000_000.0,
        // Spans beyond ~292 years overflow i64 nanoseconds.
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Render a timestamp so that the `datetime-fractional` format reads it back.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    let pattern = if ts.nanosecond() % 1_000_000 == 0 {
        EXPORT_TIMESTAMP_PATTERN
    } else {
        FINE_EXPORT_TIMESTAMP_PATTERN
    };
    ts.format(pattern).to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
