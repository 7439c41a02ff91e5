use crate::table::RawTable;
use log::warn;
use reqwest::{Client, StatusCode};

/// Base URL for per-device rainfall tables.
pub const DATA_RAIN_URL: &str = "https://meter.ac/gs/meteo";

/// Fetch the raw rainfall table for a device (e.g. "M08").
///
/// The body is a delimited table whose first row is the header, typically
/// `unixtime` plus a `rainfall` tip-count column. Non-200 responses and
/// near-empty bodies are logged and yield an empty table; transport errors
/// propagate to the caller.
pub async fn fetch_rainfall(client: &Client, device: &str) -> Result<RawTable, reqwest::Error> {
    let url = format!("{DATA_RAIN_URL}/{device}/data-rain.php");
    let response = client.get(&url).send().await?;
    if response.status() != StatusCode::OK {
        warn!("Bad response status for {device}: {}", response.status());
        return Ok(RawTable::default());
    }

    let body = response.text().await?;
    if body.len() <= 2 {
        warn!("Empty response for {device}");
        return Ok(RawTable::default());
    }

    Ok(RawTable::from_delimited(&body))
}
