//! Rainfall derivation: interval precipitation, rain-period detection, and
//! calendar-aligned period sums.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use log::debug;
use mrt_meterac::series::{SeriesError, TimeSeries};
use mrt_meterac::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparisons against the detector threshold are rounded to 10 decimal
/// places so accumulated floating-point noise cannot flip the state machine.
const DIFF_PRECISION: f64 = 1e10;

/// Errors raised by the derivation routines.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DeriveError {
    Series(SeriesError),
    /// A period sum was requested with a zero-width interval.
    ZeroInterval,
}

impl From<SeriesError> for DeriveError {
    fn from(err: SeriesError) -> Self {
        DeriveError::Series(err)
    }
}

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeriveError::Series(err) => write!(f, "{err}"),
            DeriveError::ZeroInterval => write!(f, "period sums require a non-zero interval"),
        }
    }
}

impl std::error::Error for DeriveError {}

/// Convert a raw tipping-bucket count to millimeters of precipitation.
pub fn tips_to_mm(raw: f64) -> f64 {
    raw / 10.0 * 0.2
}

/// One fixed-width aggregation window and the value accumulated in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: NaiveDateTime,
    pub value: f64,
}

/// A detected rain period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainEvent {
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub duration_min: f64,
    pub amount_mm: f64,
}

/// How an event still open when the series ends is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPolicy {
    /// Close the event at the last available timestamp.
    CloseAtLast,
    /// Drop the unterminated event.
    Discard,
}

/// Tuning for [`find_rain_periods`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Minimum rise between consecutive readings that opens (or sustains)
    /// an event.
    pub threshold: f64,
    /// Consecutive unchanged readings required to close an event.
    pub stop_window: usize,
    pub tail: TailPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            threshold: 0.01,
            stop_window: 10,
            tail: TailPolicy::CloseAtLast,
        }
    }
}

fn round_diff(diff: f64) -> f64 {
    (diff * DIFF_PRECISION).round() / DIFF_PRECISION
}

fn minutes_between(start: NaiveDateTime, stop: NaiveDateTime) -> f64 {
    (stop - start).num_seconds() as f64 / 60.0
}

/// Total precipitation per interval, converting tipping-bucket counts to
/// millimeters.
///
/// Bucket starts step from the series minimum timestamp through its maximum;
/// every interval in range gets a bucket even when nothing fell in it.
/// `interval_hours == 0` selects the near-instantaneous mode: one bucket per
/// row, each tip count converted on its own.
pub fn amount_precipitation(
    series: &TimeSeries,
    rainfall_column: &str,
    interval_hours: u32,
) -> Result<Vec<Bucket>, DeriveError> {
    let values = series.column(rainfall_column)?;
    let timestamps = series.timestamps();

    if interval_hours == 0 {
        let buckets = timestamps
            .iter()
            .zip(values)
            .map(|(&start, &raw)| Bucket {
                start,
                value: tips_to_mm(raw),
            })
            .collect();
        return Ok(buckets);
    }

    let (Some(min_time), Some(max_time)) = (series.min_time(), series.max_time()) else {
        return Ok(Vec::new());
    };
    let interval = TimeDelta::try_hours(interval_hours as i64).unwrap();

    let mut buckets = Vec::new();
    for start in TimeRange(min_time, max_time, interval) {
        let end = start + interval;
        let mut sum = 0.0;
        for (index, &ts) in timestamps.iter().enumerate() {
            if ts >= start && ts < end {
                sum += tips_to_mm(values[index]);
            }
        }
        buckets.push(Bucket { start, value: sum });
    }
    Ok(buckets)
}

/// Plain rainfall sums per calendar-aligned period.
///
/// Bucketing is identical to [`amount_precipitation`], except each generated
/// bucket start has its time-of-day replaced by `origin` (00:00 for the
/// international day boundary, 07:30 for the regional hydrological-day
/// convention) and values are summed without unit conversion.
pub fn sum_by_period(
    series: &TimeSeries,
    rainfall_column: &str,
    interval_hours: u32,
    origin: NaiveTime,
) -> Result<Vec<Bucket>, DeriveError> {
    if interval_hours == 0 {
        return Err(DeriveError::ZeroInterval);
    }
    let values = series.column(rainfall_column)?;
    let timestamps = series.timestamps();

    let (Some(min_time), Some(max_time)) = (series.min_time(), series.max_time()) else {
        return Ok(Vec::new());
    };
    let interval = TimeDelta::try_hours(interval_hours as i64).unwrap();

    let mut buckets = Vec::new();
    for step in TimeRange(min_time, max_time, interval) {
        let start = step.date().and_time(origin);
        let end = start + interval;
        let mut sum = 0.0;
        for (index, &ts) in timestamps.iter().enumerate() {
            if ts >= start && ts < end {
                sum += values[index];
            }
        }
        buckets.push(Bucket { start, value: sum });
    }
    Ok(buckets)
}

/// Segment a rainfall series into discrete rain events.
///
/// Scans row pairs in timestamp order. A rise of at least
/// `config.threshold` (compared after rounding) opens an event at the risen
/// reading, or resets the no-change counter of an open one. An exactly
/// unchanged reading increments the counter; when it reaches
/// `config.stop_window` the event closes at that reading. A drop, or a rise
/// below the threshold, leaves all state untouched. An event still open at
/// the end of the series is resolved per `config.tail`.
///
/// `amount_mm` is the plain sum of `rainfall_column` over
/// `[start_time, stop_time]` inclusive, so the column is expected to carry
/// per-reading amounts rather than a cumulative counter (see
/// [`subtract_previous`]).
///
/// Input must be strictly ordered; duplicate timestamps are a precondition
/// violation.
pub fn find_rain_periods(
    series: &TimeSeries,
    rainfall_column: &str,
    config: &DetectorConfig,
) -> Result<Vec<RainEvent>, DeriveError> {
    let values = series.column(rainfall_column)?;
    let timestamps = series.timestamps();

    let mut events = Vec::new();
    let mut start_time: Option<NaiveDateTime> = None;
    let mut consecutive_no_change = 0usize;

    for index in 1..values.len() {
        let previous = values[index - 1];
        let current = values[index];

        if round_diff(current - previous) >= config.threshold {
            if start_time.is_none() {
                start_time = Some(timestamps[index]);
            }
            consecutive_no_change = 0;
        } else if current == previous {
            if let Some(start) = start_time {
                consecutive_no_change += 1;
                if consecutive_no_change == config.stop_window {
                    events.push(close_event(start, timestamps[index], timestamps, values));
                    start_time = None;
                }
            }
        }
        // A drop or a sub-threshold rise leaves the state untouched.
    }

    if let Some(start) = start_time {
        match config.tail {
            TailPolicy::CloseAtLast => {
                let stop = timestamps[timestamps.len() - 1];
                if stop > start {
                    events.push(close_event(start, stop, timestamps, values));
                }
            }
            TailPolicy::Discard => {
                debug!("Discarding rain event still open at end of series (started {start})");
            }
        }
    }

    Ok(events)
}

fn close_event(
    start: NaiveDateTime,
    stop: NaiveDateTime,
    timestamps: &[NaiveDateTime],
    values: &[f64],
) -> RainEvent {
    let mut amount = 0.0;
    for (index, &ts) in timestamps.iter().enumerate() {
        if ts >= start && ts <= stop {
            amount += values[index];
        }
    }
    RainEvent {
        start_time: start,
        stop_time: stop,
        duration_min: minutes_between(start, stop),
        amount_mm: amount,
    }
}

/// Replace a cumulative counter column with absolute row-to-row differences.
///
/// The first row becomes 0. Used to turn a running tip counter into
/// per-reading amounts before event detection.
pub fn subtract_previous(series: &TimeSeries, column: &str) -> Result<TimeSeries, DeriveError> {
    let values = series.column(column)?;
    let mut diffs = Vec::with_capacity(values.len());
    for (index, &value) in values.iter().enumerate() {
        if index == 0 {
            diffs.push(0.0);
        } else {
            diffs.push((value - values[index - 1]).abs());
        }
    }
    Ok(series.clone().with_column(column, diffs)?)
}
