//! Final quality pass over the assembled columns.
//!
//! Removes channels that carry no data and records findings that do not
//! change the table: duplicate timestamps, constant and low-cardinality
//! numeric channels.

use std::collections::HashSet;

use telemetry_core::models::{Column, ColumnData, ColumnKind};
use telemetry_core::quality::{ConstantColumn, LowCardinalityColumn, QualityReport};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct QualityValidator {
    low_cardinality_ratio: f64,
}

impl QualityValidator {
    pub fn new(low_cardinality_ratio: f64) -> Self {
        Self {
            low_cardinality_ratio,
        }
    }

    /// Drop all-missing channels and fill the column findings of `report`.
    ///
    /// Timestamp and elapsed columns are never dropped.
    pub fn validate(&self, columns: Vec<Column>, report: &mut QualityReport) -> Vec<Column> {
        let mut kept = Vec::with_capacity(columns.len());

        for column in columns {
            match column.data() {
                ColumnData::Timestamp(ts) => {
                    report.duplicate_timestamps = count_adjacent_duplicates(ts);
                }
                ColumnData::Numeric(values) if !column.is_all_missing() => {
                    self.inspect_numeric(column.name(), values, report);
                }
                _ => {}
            }

            let droppable = matches!(column.kind(), ColumnKind::Numeric | ColumnKind::Text);
            if droppable && column.is_all_missing() {
                debug!("validator: dropping empty column '{}'", column.name());
                report.dropped_columns.push(column.name().to_string());
                continue;
            }
            kept.push(column);
        }

        kept
    }

    fn inspect_numeric(&self, name: &str, values: &[Option<f64>], report: &mut QualityReport) {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let distinct = distinct_count(&present);

        if distinct == 1 {
            report.constant_columns.push(ConstantColumn {
                name: name.to_string(),
                value: present[0],
            });
        } else if (distinct as f64) < values.len() as f64 * self.low_cardinality_ratio {
            report.low_cardinality_columns.push(LowCardinalityColumn {
                name: name.to_string(),
                distinct,
            });
        }
    }
}

/// Rows whose value equals the previous row's. Input must be sorted.
pub fn count_adjacent_duplicates<T: PartialEq>(sorted: &[T]) -> usize {
    sorted.windows(2).filter(|w| w[0] == w[1]).count()
}

/// Distinct values, treating `-0.0` and `0.0` as equal.
fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|&v| {
            let v = if v == 0.0 { 0.0f64 } else { v };
            v.to_bits()
        })
        .collect::<HashSet<u64>>()
        .len()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use telemetry_core::models::{ELAPSED_COLUMN, TIMESTAMP_COLUMN};

    fn ts(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, sec)
            .unwrap()
    }

    fn run(columns: Vec<Column>, ratio: f64) -> (Vec<Column>, QualityReport) {
        let mut report = QualityReport::default();
        let kept = QualityValidator::new(ratio).validate(columns, &mut report);
        (kept, report)
    }

    #[test]
    fn test_drops_all_missing_channels_only() {
        let (kept, report) = run(
            vec![
                Column::new(TIMESTAMP_COLUMN, ColumnData::Timestamp(vec![ts(0), ts(1)])),
                Column::new("A", ColumnData::Numeric(vec![None, None])),
                Column::new("B", ColumnData::Text(vec![None, None])),
                Column::new("C", ColumnData::Numeric(vec![Some(1.0), None])),
                Column::new(ELAPSED_COLUMN, ColumnData::ElapsedSeconds(vec![0.0, 1.0])),
            ],
            0.01,
        );
        let names: Vec<&str> = kept.iter().map(Column::name).collect();
        assert_eq!(names, vec![TIMESTAMP_COLUMN, "C", ELAPSED_COLUMN]);
        assert_eq!(report.dropped_columns, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_counts_duplicate_timestamps() {
        let (_, report) = run(
            vec![Column::new(
                TIMESTAMP_COLUMN,
                ColumnData::Timestamp(vec![ts(0), ts(0), ts(0), ts(1)]),
            )],
            0.01,
        );
        assert_eq!(report.duplicate_timestamps, 2);
    }

    #[test]
    fn test_constant_column_detected() {
        let (kept, report) = run(
            vec![Column::new(
                "TRIM",
                ColumnData::Numeric(vec![Some(1.5), None, Some(1.5)]),
            )],
            0.01,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(
            report.constant_columns,
            vec![ConstantColumn {
                name: "TRIM".into(),
                value: 1.5
            }]
        );
        assert!(report.low_cardinality_columns.is_empty());
    }

    #[test]
    fn test_signed_zero_counts_once() {
        assert_eq!(distinct_count(&[0.0, -0.0, 0.0]), 1);
        assert_eq!(distinct_count(&[0.0, 1.0, 1.0]), 2);
    }

    #[test]
    fn test_low_cardinality_column_detected() {
        // 1000 rows alternating between two values: 2 < 1000 * 0.01
        let values: Vec<Option<f64>> = (0..1000).map(|i| Some((i % 2) as f64)).collect();
        let (_, report) = run(vec![Column::new("GEAR", ColumnData::Numeric(values))], 0.01);
        assert_eq!(
            report.low_cardinality_columns,
            vec![LowCardinalityColumn {
                name: "GEAR".into(),
                distinct: 2
            }]
        );
    }

    #[test]
    fn test_short_column_not_low_cardinality() {
        let (_, report) = run(
            vec![Column::new(
                "GEAR",
                ColumnData::Numeric(vec![Some(0.0), Some(1.0), Some(0.0)]),
            )],
            0.01,
        );
        assert!(report.low_cardinality_columns.is_empty());
        assert!(report.constant_columns.is_empty());
    }
}
