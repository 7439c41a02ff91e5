//! Network commands: station metadata and per-device rainfall tables.

use anyhow::Context;
use log::info;
use mrt_meterac::reading;
use mrt_meterac::series::TimeSeries;
use mrt_meterac::station::Station;
use mrt_meterac::table::SeriesSchema;
use mrt_utils::dates;
use std::time::Duration;

/// Fetch each device's rainfall table from meter.ac, normalize the epoch
/// timestamps, and write one CSV per device into the output directory.
///
/// Devices that fail to fetch or return nothing are logged and skipped so
/// one dead station does not abort the batch.
pub async fn run_fetch_rain(
    devices: &[String],
    output_dir: &str,
    unixtime_column: &str,
) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {output_dir}"))?;

    let schema = SeriesSchema {
        unixtime_column: unixtime_column.to_string(),
        ..SeriesSchema::default()
    };

    info!("Querying {} devices", devices.len());
    for device in devices {
        info!("Fetching rainfall table for {device}");
        let table = match reading::fetch_rainfall(&client, device).await {
            Ok(t) => t,
            Err(e) => {
                info!("Failed to fetch {device}: {e}");
                continue;
            }
        };
        if table.records.is_empty() {
            info!("No rainfall data for {device}");
            continue;
        }

        let series = table.into_series(&schema)?;
        let path = format!("{output_dir}/{device}-rain.csv");
        write_series_csv(&series, &schema, &path)?;
        info!(
            "  {} observations for {} written to {}",
            series.len(),
            device,
            path
        );

        // Be polite to the meter.ac server
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Ok(())
}

/// Fetch the station metadata table and print it as CSV.
pub async fn run_stations(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    info!("Fetching station metadata from {url}");
    let stations = Station::fetch_stations(&client, url).await?;
    if stations.is_empty() {
        anyhow::bail!("no station metadata available from {url}");
    }

    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for station in &stations {
        wtr.serialize(station)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_series_csv(
    series: &TimeSeries,
    schema: &SeriesSchema,
    path: &str,
) -> anyhow::Result<()> {
    let names: Vec<&str> = series.column_names().collect();
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec![schema.timestamp_column.as_str()];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    for (row, ts) in series.timestamps().iter().enumerate() {
        let mut record = vec![dates::format_datetime(ts)];
        for name in &names {
            record.push(series.column(name)?[row].to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
