//! Read-only helpers over a validated [`Series`]: channel categories,
//! descriptive statistics and outlier masks.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use telemetry_core::models::Series;
use telemetry_core::statistics::{mean, percentile, sample_std, sorted_finite, Summary};

// ── Parameter categories ──────────────────────────────────────────────────────

/// Flight-test naming families a channel can belong to.
///
/// Variant order is the matching priority and the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParameterCategory {
    ControlSurfaces,
    FlightAngles,
    ForcesAndLoads,
    PositionsAndCommands,
    TrimSettings,
    Other,
}

impl ParameterCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ControlSurfaces => "Control Surfaces",
            Self::FlightAngles => "Flight Angles",
            Self::ForcesAndLoads => "Forces & Loads",
            Self::PositionsAndCommands => "Positions & Commands",
            Self::TrimSettings => "Trim Settings",
            Self::Other => "Other Parameters",
        }
    }

    /// Category of a single channel name. Matching is case-insensitive and
    /// substring based, so `"ELEVATOR TAB"` is a control surface.
    pub fn classify(name: &str) -> Self {
        keyword_patterns()
            .iter()
            .find(|(_, re)| re.is_match(name))
            .map(|(category, _)| *category)
            .unwrap_or(Self::Other)
    }
}

fn keyword_patterns() -> &'static [(ParameterCategory, Regex)] {
    static PATTERNS: OnceLock<Vec<(ParameterCategory, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                ParameterCategory::ControlSurfaces,
                r"(?i)aileron|elevator|rudder|flap|spoiler|tab",
            ),
            (
                ParameterCategory::FlightAngles,
                r"(?i)angle|alpha|beta|aoa|sideslip|pitch|roll|yaw",
            ),
            (
                ParameterCategory::ForcesAndLoads,
                r"(?i)force|load|strain|stress|moment|torque",
            ),
            (
                ParameterCategory::PositionsAndCommands,
                r"(?i)position|cmd|command|stick|pedal",
            ),
            (ParameterCategory::TrimSettings, r"(?i)trim"),
        ]
        .into_iter()
        .map(|(category, pattern)| (category, Regex::new(pattern).expect("regex is valid")))
        .collect()
    })
}

/// Group every channel of `series` by [`ParameterCategory`]. Empty categories
/// are omitted; channels keep their column order within a category.
pub fn categorize_parameters(series: &Series) -> BTreeMap<ParameterCategory, Vec<String>> {
    let mut out: BTreeMap<ParameterCategory, Vec<String>> = BTreeMap::new();
    for name in series.channel_names() {
        out.entry(ParameterCategory::classify(name))
            .or_default()
            .push(name.to_string());
    }
    out
}

// ── Descriptive statistics ────────────────────────────────────────────────────

/// Present values of a numeric channel, or `None` if it is not numeric.
fn present_values(series: &Series, channel: &str) -> Option<Vec<f64>> {
    series
        .numeric(channel)
        .map(|values| values.iter().flatten().copied().collect())
}

/// [`Summary`] for each requested channel that is numeric and has at least one
/// value. Unknown, text and empty channels are skipped.
pub fn channel_statistics<S: AsRef<str>>(series: &Series, channels: &[S]) -> BTreeMap<String, Summary> {
    channels
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let values = present_values(series, name)?;
            Summary::describe(&values).map(|s| (name.to_string(), s))
        })
        .collect()
}

// ── Anomaly detection ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AnomalyMethod {
    /// `|x - mean| / std > threshold`.
    ZScore { threshold: f64 },
    /// Outside `[Q1 - k * IQR, Q3 + k * IQR]`.
    Iqr { factor: f64 },
}

impl Default for AnomalyMethod {
    fn default() -> Self {
        Self::ZScore { threshold: 3.0 }
    }
}

/// Per-row outlier mask for `channel`, aligned with the series rows.
///
/// Missing values are never flagged. Returns an empty mask when the channel
/// is absent or not numeric. A zero-spread channel flags nothing.
pub fn detect_anomalies(series: &Series, channel: &str, method: AnomalyMethod) -> Vec<bool> {
    let Some(values) = series.numeric(channel) else {
        return Vec::new();
    };
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    let is_outlier: Box<dyn Fn(f64) -> bool> = match method {
        AnomalyMethod::ZScore { threshold } => {
            match (mean(&present), sample_std(&present)) {
                (Some(m), Some(sd)) if sd > 0.0 => {
                    Box::new(move |x: f64| ((x - m) / sd).abs() > threshold)
                }
                _ => Box::new(|_| false),
            }
        }
        AnomalyMethod::Iqr { factor } => {
            let sorted = sorted_finite(&present);
            match (percentile(&sorted, 25.0), percentile(&sorted, 75.0)) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    let (lo, hi) = (q1 - factor * iqr, q3 + factor * iqr);
                    Box::new(move |x: f64| x < lo || x > hi)
                }
                _ => Box::new(|_| false),
            }
        }
    };

    values
        .iter()
        .map(|v| v.is_some_and(|x| is_outlier(x)))
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest;

    fn series_with(channels: &[(&str, &[&str])]) -> Series {
        let rows = channels[0].1.len();
        let mut text = String::from("Time");
        for (name, _) in channels {
            text.push(',');
            text.push_str(name);
        }
        text.push_str("\nEU");
        for _ in channels {
            text.push_str(",EU");
        }
        text.push('\n');
        for r in 0..rows {
            text.push_str(&format!("10:{:02}:{:02}", r / 60, r % 60));
            for (_, values) in channels {
                text.push(',');
                text.push_str(values[r]);
            }
            text.push('\n');
        }
        ingest(&text).expect("ingest").0
    }

    // ── categories ───────────────────────────────────────────────────────────

    #[test]
    fn test_classify_priority_order() {
        use ParameterCategory::*;
        assert_eq!(ParameterCategory::classify("AILERON DEFLECTION (deg)"), ControlSurfaces);
        // "rudder" wins over "pedal" because control surfaces are checked first
        assert_eq!(ParameterCategory::classify("RUDDER PEDAL FORCE (lb)"), ControlSurfaces);
        assert_eq!(ParameterCategory::classify("ANGLE OF ATTACK (deg)"), FlightAngles);
        assert_eq!(ParameterCategory::classify("Wing Root Strain"), ForcesAndLoads);
        assert_eq!(ParameterCategory::classify("THROTTLE CMD"), PositionsAndCommands);
        assert_eq!(ParameterCategory::classify("Pitch Trim"), FlightAngles);
        assert_eq!(ParameterCategory::classify("HSTAB TRIM"), ControlSurfaces);
        assert_eq!(ParameterCategory::classify("NOSE TRIM"), TrimSettings);
        assert_eq!(ParameterCategory::classify("FUEL QTY"), Other);
    }

    #[test]
    fn test_categorize_parameters_omits_empty_categories() {
        let series = series_with(&[
            ("AILERON", &["1", "2"]),
            ("FUEL QTY", &["3", "4"]),
            ("ELEVATOR", &["5", "6"]),
        ]);
        let cats = categorize_parameters(&series);
        assert_eq!(cats.len(), 2);
        assert_eq!(
            cats[&ParameterCategory::ControlSurfaces],
            vec!["AILERON".to_string(), "ELEVATOR".to_string()]
        );
        assert_eq!(cats[&ParameterCategory::Other], vec!["FUEL QTY".to_string()]);
        assert!(!cats.contains_key(&ParameterCategory::FlightAngles));
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ParameterCategory::ForcesAndLoads.label(), "Forces & Loads");
        assert_eq!(ParameterCategory::Other.label(), "Other Parameters");
    }

    // ── statistics ───────────────────────────────────────────────────────────

    #[test]
    fn test_channel_statistics_skips_non_numeric_and_unknown() {
        let series = series_with(&[
            ("A", &["1", "2", "3", "6", ""]),
            ("MODE", &["x", "y", "z", "w", "v"]),
        ]);
        let stats = channel_statistics(&series, &["A", "MODE", "NOPE"]);
        assert_eq!(stats.len(), 1);
        let a = &stats["A"];
        assert_eq!(a.count, 4);
        assert_eq!(a.mean, 3.0);
        assert_eq!(a.range, 5.0);
    }

    // ── anomalies ────────────────────────────────────────────────────────────

    #[test]
    fn test_detect_anomalies_zscore_flags_spike() {
        let mut values = vec!["0"; 30];
        values[10] = "1";
        values[20] = "100";
        values[25] = "";
        let series = series_with(&[("LOAD", &values[..])]);
        let mask = detect_anomalies(&series, "LOAD", AnomalyMethod::default());
        assert_eq!(mask.len(), series.row_count());
        assert!(mask[20]);
        assert!(!mask[10]);
        assert!(!mask[25]);
        assert_eq!(mask.iter().filter(|m| **m).count(), 1);
    }

    #[test]
    fn test_detect_anomalies_iqr() {
        let series = series_with(&[("A", &["1", "2", "3", "4", "5", "50"])]);
        let mask = detect_anomalies(&series, "A", AnomalyMethod::Iqr { factor: 1.5 });
        assert_eq!(mask, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_detect_anomalies_constant_and_unknown() {
        let series = series_with(&[("A", &["2", "2", "2"]), ("MODE", &["x", "y", "z"])]);
        assert_eq!(
            detect_anomalies(&series, "A", AnomalyMethod::default()),
            vec![false; 3]
        );
        assert!(detect_anomalies(&series, "MODE", AnomalyMethod::default()).is_empty());
        assert!(detect_anomalies(&series, "NOPE", AnomalyMethod::default()).is_empty());
    }
}
