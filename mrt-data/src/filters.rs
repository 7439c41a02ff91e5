//! Date-range subsetting of rainfall series.
//!
//! Every filter returns a freshly allocated, re-indexed series. The
//! relative filters take an explicit reference date instead of consulting
//! the wall clock, so results are reproducible.

use chrono::{Datelike, NaiveDate, TimeDelta};
use mrt_meterac::series::TimeSeries;

/// Keep rows whose calendar date falls within `[start, end]` inclusive.
pub fn filter_by_date_range(series: &TimeSeries, start: NaiveDate, end: NaiveDate) -> TimeSeries {
    series.retain_rows(|ts| {
        let date = ts.date();
        date >= start && date <= end
    })
}

/// Keep rows from the calendar year before the one containing `today`.
pub fn filter_last_year(series: &TimeSeries, today: NaiveDate) -> TimeSeries {
    let year = today.year() - 1;
    series.retain_rows(|ts| ts.date().year() == year)
}

/// Keep rows from the calendar month before the one containing `today`.
pub fn filter_last_month(series: &TimeSeries, today: NaiveDate) -> TimeSeries {
    // Stepping back by the day-of-month lands on the previous month's tail.
    let last_month_day = today - TimeDelta::try_days(today.day() as i64).unwrap();
    series.retain_rows(|ts| {
        let date = ts.date();
        date.year() == last_month_day.year() && date.month() == last_month_day.month()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::collections::BTreeMap;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample_series() -> TimeSeries {
        let timestamps = vec![
            at(2023, 6, 15),
            at(2024, 1, 22),
            at(2024, 2, 10),
            at(2024, 2, 29),
            at(2024, 3, 5),
        ];
        let mut columns = BTreeMap::new();
        columns.insert("pq".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        TimeSeries::new(timestamps, columns).unwrap()
    }

    #[test]
    fn test_filter_by_date_range_is_inclusive() {
        let series = sample_series();
        let filtered = filter_by_date_range(
            &series,
            NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        );
        assert_eq!(filtered.column("pq").unwrap(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_filter_last_year() {
        let series = sample_series();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let filtered = filter_last_year(&series, today);
        assert_eq!(filtered.column("pq").unwrap(), &[1.0]);
    }

    #[test]
    fn test_filter_last_month() {
        let series = sample_series();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let filtered = filter_last_month(&series, today);
        assert_eq!(filtered.column("pq").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_filter_empty_result() {
        let series = sample_series();
        let filtered = filter_by_date_range(
            &series,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        );
        assert!(filtered.is_empty());
    }
}
