//! Nearest-neighbor timestamp alignment between co-located instruments.

use chrono::NaiveDateTime;
use mrt_meterac::series::{SeriesError, TimeSeries};
use serde::{Deserialize, Serialize};

/// A source timestamp with the feature value interpolated from the target
/// series, or `None` when fewer than two target samples fall inside the
/// matching window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

/// Map a feature column from `target` onto the timestamps of `source`.
///
/// For each source timestamp `t`, the two target samples nearest to `t`
/// within `window_min` minutes (inclusive, ties kept in target order) define
/// a line; the mapped value is that line evaluated at `t`:
///
/// ```text
/// S(t) = (t - t1) * (s2 - s1) / (t2 - t1) + s1
/// ```
///
/// A zero denominator (duplicate nearest timestamps) is substituted with one
/// minute, so a coincident timestamp maps to its own value rather than NaN.
/// The output has exactly one sample per source timestamp, in source order.
///
/// Target series with duplicate timestamps should be deduplicated by the
/// caller; both series must be sorted ascending (guaranteed by
/// [`TimeSeries`] construction).
pub fn align(
    source: &TimeSeries,
    target: &TimeSeries,
    feature: &str,
    window_min: f64,
) -> Result<Vec<AlignedSample>, SeriesError> {
    let feature_values = target.column(feature)?;
    let target_times = target.timestamps();

    let mut mapped = Vec::with_capacity(source.len());
    for &t in source.timestamps() {
        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for (index, &u) in target_times.iter().enumerate() {
            let distance = minutes_between(t, u).abs();
            if distance <= window_min {
                candidates.push((index, distance));
            }
        }

        if candidates.len() < 2 {
            mapped.push(AlignedSample {
                timestamp: t,
                value: None,
            });
            continue;
        }

        // Stable sort: equidistant candidates keep their target order.
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (first, _) = candidates[0];
        let (second, _) = candidates[1];
        let (t1, s1) = (target_times[first], feature_values[first]);
        let (t2, s2) = (target_times[second], feature_values[second]);

        let mut t_diff = minutes_between(t1, t2);
        if t_diff == 0.0 {
            t_diff = 1.0;
        }
        let value = minutes_between(t1, t) * (s2 - s1) / t_diff + s1;

        mapped.push(AlignedSample {
            timestamp: t,
            value: Some(value),
        });
    }

    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use std::collections::BTreeMap;

    fn minute(offset: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::try_minutes(offset).unwrap()
    }

    fn series(offsets: &[i64], values: &[f64]) -> TimeSeries {
        let timestamps = offsets.iter().map(|&m| minute(m)).collect();
        let mut columns = BTreeMap::new();
        columns.insert("temp".to_string(), values.to_vec());
        TimeSeries::new(timestamps, columns).unwrap()
    }

    #[test]
    fn test_align_interpolates_between_neighbors() {
        let source = series(&[5], &[0.0]);
        let target = series(&[0, 10], &[0.0, 1.0]);

        let mapped = align(&source, &target, "temp", 10.0).unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].timestamp, minute(5));
        assert!((mapped[0].value.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_align_extrapolates_from_one_side() {
        // Both nearest candidates precede the source timestamp; the line
        // through them is extended forward.
        let source = series(&[20], &[0.0]);
        let target = series(&[0, 10, 60], &[0.0, 1.0, 9.0]);

        let mapped = align(&source, &target, "temp", 25.0).unwrap();
        // Nearest: 00:10 then 00:00; line slope 0.1/min evaluated at 00:20.
        assert!((mapped[0].value.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_align_too_few_candidates_is_missing() {
        let source = series(&[0, 120], &[0.0, 0.0]);
        let target = series(&[0, 5, 240], &[1.0, 2.0, 3.0]);

        let mapped = align(&source, &target, "temp", 10.0).unwrap();
        assert_eq!(mapped.len(), 2);
        assert!(mapped[0].value.is_some());
        assert_eq!(mapped[1].value, None);
    }

    #[test]
    fn test_align_coincident_duplicate_timestamps_returns_own_value() {
        // Duplicate nearest timestamps give a zero denominator; the fallback
        // must return the value at t, not NaN.
        let source = series(&[10], &[0.0]);
        let target = series(&[10, 10, 30], &[3.0, 3.0, 8.0]);

        let mapped = align(&source, &target, "temp", 10.0).unwrap();
        let value = mapped[0].value.unwrap();
        assert!(!value.is_nan());
        assert_eq!(value, 3.0);
    }

    #[test]
    fn test_align_one_row_per_source_timestamp_in_order() {
        let source = series(&[0, 10, 20], &[0.0, 0.0, 0.0]);
        let target = series(&[0, 10, 20], &[1.0, 2.0, 3.0]);

        let mapped = align(&source, &target, "temp", 10.0).unwrap();
        let timestamps: Vec<NaiveDateTime> = mapped.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![minute(0), minute(10), minute(20)]);
    }

    #[test]
    fn test_align_missing_feature_column() {
        let source = series(&[0], &[0.0]);
        let target = series(&[0, 10], &[1.0, 2.0]);

        let err = align(&source, &target, "humidity", 10.0).unwrap_err();
        assert_eq!(err, SeriesError::MissingColumn("humidity".to_string()));
    }
}
