use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "api")]
use log::warn;
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};

/// Embedded metadata for the meter.ac meteo station network.
pub static STATIONS_CSV: &str = include_str!("../fixtures/stations.csv");

/// URL of the live station metadata table.
pub const METADATA_URL: &str = "https://meter.ac/gs/metadata/meteo.csv";

/// A meteorological station in the meter.ac network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    pub meteo_id: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters above sea level
    pub altitude: f64,
}

fn parse_float(ess: &str) -> f64 {
    let ess_lowered = ess.trim().to_lowercase();
    let ess_lowered_str = ess_lowered.as_str();
    match ess_lowered_str {
        "null" => 0f64,
        "" => 0f64,
        "n/a" => 0f64,
        "na" => 0f64,
        s => s.parse::<f64>().unwrap_or_default(),
    }
}

impl Station {
    /// Get the station vector from the embedded metadata CSV.
    pub fn get_station_vector() -> Vec<Station> {
        if let Ok(s) = Station::parse_station_csv(STATIONS_CSV) {
            s
        } else {
            panic!("failed to parse embedded station csv")
        }
    }

    /// Parse a CSV string of station metadata into a vector of Stations.
    ///
    /// Expected CSV columns: MeteoID, Location, Lat, Lon, Alt
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<Station>, std::io::Error> {
        let mut station_list: Vec<Station> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        for row in rdr.records() {
            let rho = row?;
            let station = Station {
                meteo_id: String::from(rho.get(0).unwrap_or_default()),
                location: String::from(rho.get(1).unwrap_or_default()),
                latitude: parse_float(rho.get(2).unwrap_or_default()),
                longitude: parse_float(rho.get(3).unwrap_or_default()),
                altitude: parse_float(rho.get(4).unwrap_or_default()),
            };
            station_list.push(station);
        }
        Ok(station_list)
    }

    /// Index a vector of stations by meteo_id.
    pub fn vector_to_hashmap(vec_stations: Vec<Station>) -> HashMap<String, Station> {
        let mut result: HashMap<String, Station> = HashMap::new();
        for station in vec_stations {
            result.insert(station.meteo_id.clone(), station);
        }
        result
    }

    /// Fetch the live station metadata table.
    ///
    /// Non-200 responses and malformed bodies are logged and yield an empty
    /// vector; transport errors propagate to the caller.
    #[cfg(feature = "api")]
    pub async fn fetch_stations(client: &Client, url: &str) -> Result<Vec<Station>, reqwest::Error> {
        let response = client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            warn!("Bad response status for station metadata: {}", response.status());
            return Ok(Vec::new());
        }
        let body = response.text().await?;
        match Station::parse_station_csv(&body) {
            Ok(stations) => Ok(stations),
            Err(e) => {
                warn!("Failed to parse station metadata: {e}");
                Ok(Vec::new())
            }
        }
    }
}
