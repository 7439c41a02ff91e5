//! Local analyses over previously fetched rainfall CSVs.

use anyhow::Context;
use chrono::Local;
use log::info;
use mrt_data::rainfall::{self, Bucket, DetectorConfig, TailPolicy};
use mrt_data::{filters, time_mapping};
use mrt_meterac::series::TimeSeries;
use mrt_meterac::table::{RawTable, SeriesSchema};
use mrt_utils::dates;

/// Date subsetting options shared by the analysis subcommands.
#[derive(Debug, Default)]
pub struct DateWindow<'a> {
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub last_year: bool,
    pub last_month: bool,
}

fn load_series(path: &str, timestamp_column: &str) -> anyhow::Result<TimeSeries> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let schema = SeriesSchema {
        timestamp_column: timestamp_column.to_string(),
        ..SeriesSchema::default()
    };
    let table = RawTable::from_delimited(&text);
    Ok(table.into_series_from_datetime(&schema)?)
}

fn apply_date_filter(series: TimeSeries, window: &DateWindow) -> anyhow::Result<TimeSeries> {
    if window.last_year || window.last_month {
        if window.start.is_some() || window.end.is_some() {
            anyhow::bail!("--last-year/--last-month cannot be combined with --start/--end");
        }
        if window.last_year && window.last_month {
            anyhow::bail!("--last-year and --last-month are mutually exclusive");
        }
        let today = Local::now().date_naive();
        return Ok(if window.last_year {
            filters::filter_last_year(&series, today)
        } else {
            filters::filter_last_month(&series, today)
        });
    }
    match (window.start, window.end) {
        (Some(s), Some(e)) => Ok(filters::filter_by_date_range(
            &series,
            dates::parse_date(s)?,
            dates::parse_date(e)?,
        )),
        (None, None) => Ok(series),
        _ => anyhow::bail!("--start and --end must be given together"),
    }
}

fn print_buckets(
    buckets: &[Bucket],
    timestamp_column: &str,
    value_header: &str,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(buckets)?);
        return Ok(());
    }
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record([timestamp_column, value_header])?;
    for bucket in buckets {
        wtr.write_record([
            dates::format_datetime(&bucket.start),
            format!("{:.3}", bucket.value),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_events(
    input: &str,
    column: &str,
    timestamp_column: &str,
    threshold: f64,
    stop_window: usize,
    discard_open: bool,
    cumulative: bool,
    window: DateWindow,
    json: bool,
) -> anyhow::Result<()> {
    let mut series = apply_date_filter(load_series(input, timestamp_column)?, &window)?;
    if cumulative {
        series = rainfall::subtract_previous(&series, column)?;
    }
    let config = DetectorConfig {
        threshold,
        stop_window,
        tail: if discard_open {
            TailPolicy::Discard
        } else {
            TailPolicy::CloseAtLast
        },
    };

    let events = rainfall::find_rain_periods(&series, column, &config)?;
    info!("{} rain events detected in {input}", events.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(["Start_Time", "Stop_Time", "Duration_min", "Amount_mm"])?;
    for event in &events {
        wtr.write_record([
            dates::format_datetime(&event.start_time),
            dates::format_datetime(&event.stop_time),
            event.duration_min.to_string(),
            format!("{:.3}", event.amount_mm),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run_precipitation(
    input: &str,
    column: &str,
    timestamp_column: &str,
    interval_hours: u32,
    window: DateWindow,
    json: bool,
) -> anyhow::Result<()> {
    let series = apply_date_filter(load_series(input, timestamp_column)?, &window)?;
    let buckets = rainfall::amount_precipitation(&series, column, interval_hours)?;
    info!("{} precipitation buckets for {input}", buckets.len());
    print_buckets(&buckets, timestamp_column, "pq", json)
}

#[allow(clippy::too_many_arguments)]
pub fn run_period_sum(
    input: &str,
    column: &str,
    timestamp_column: &str,
    interval_hours: u32,
    origin: &str,
    window: DateWindow,
    json: bool,
) -> anyhow::Result<()> {
    let origin = dates::parse_time_hm(origin)
        .with_context(|| format!("invalid reporting origin: {origin}"))?;
    let series = apply_date_filter(load_series(input, timestamp_column)?, &window)?;
    let buckets = rainfall::sum_by_period(&series, column, interval_hours, origin)?;
    info!("{} period sums for {input}", buckets.len());
    print_buckets(&buckets, timestamp_column, "PQ_mm", json)
}

pub fn run_align(
    source: &str,
    target: &str,
    feature: &str,
    timestamp_column: &str,
    window_minutes: f64,
    json: bool,
) -> anyhow::Result<()> {
    let source_series = load_series(source, timestamp_column)?;
    let target_series = load_series(target, timestamp_column)?;

    let mapped = time_mapping::align(&source_series, &target_series, feature, window_minutes)?;
    let missing = mapped.iter().filter(|s| s.value.is_none()).count();
    info!(
        "{} timestamps aligned from {target} onto {source} ({missing} unmatched)",
        mapped.len()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&mapped)?);
        return Ok(());
    }
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record([timestamp_column, feature])?;
    for sample in &mapped {
        let value = sample.value.map(|v| v.to_string()).unwrap_or_default();
        wtr.write_record([dates::format_datetime(&sample.timestamp), value])?;
    }
    wtr.flush()?;
    Ok(())
}
