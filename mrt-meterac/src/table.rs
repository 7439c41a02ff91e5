use crate::series::{SeriesError, TimeSeries};
use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;

/// Timestamp column produced by unix-time normalization: "YYYY-MM-DD HH:MM:SS".
pub const DATE_TIME_COLUMN: &str = "Date/Time";

/// Format of the normalized timestamp column when written to or read from CSV.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A fetched table in its rawest usable form: the header row plus string
/// records. This is the entire contract of the metadata and rainfall
/// fetchers; everything downstream consumes a [`TimeSeries`] instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// Explicit schema mapping from a raw table to a [`TimeSeries`].
///
/// The epoch-seconds column is matched case-insensitively (station firmware
/// disagrees on capitalization); every other lookup in the toolkit is
/// case-sensitive against exact column names.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSchema {
    /// Epoch-seconds column in the fetched table.
    pub unixtime_column: String,
    /// Name given to the derived timestamp column in CSV output.
    pub timestamp_column: String,
}

impl Default for SeriesSchema {
    fn default() -> Self {
        SeriesSchema {
            unixtime_column: "unixtime".to_string(),
            timestamp_column: DATE_TIME_COLUMN.to_string(),
        }
    }
}

impl RawTable {
    /// Parse a delimited response body into a raw table.
    ///
    /// Station endpoints disagree on the separator, so it is sniffed from
    /// the header row: semicolon, then comma, then a single space.
    /// Unparseable records are skipped.
    pub fn from_delimited(body: &str) -> RawTable {
        let delimiter = sniff_delimiter(body);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(body.as_bytes());

        let headers = match reader.headers() {
            Ok(h) => h.iter().map(str::to_string).collect(),
            Err(_) => return RawTable::default(),
        };
        let records = reader
            .records()
            .filter_map(|r| r.ok())
            .map(|r| r.iter().map(str::to_string).collect())
            .collect();

        RawTable { headers, records }
    }

    /// Convert to a time series by normalizing an epoch-seconds column.
    ///
    /// The epoch column is located case-insensitively per the collaborator
    /// contract; a missing column fails fast naming it. Rows are sorted by
    /// timestamp. Every other column whose cells all parse as numbers is
    /// carried under its exact original name (empty cells become 0.0);
    /// non-numeric columns are dropped.
    pub fn into_series(self, schema: &SeriesSchema) -> Result<TimeSeries, SeriesError> {
        let wanted = schema.unixtime_column.to_lowercase();
        let epoch_index = self
            .headers
            .iter()
            .position(|h| h.to_lowercase() == wanted)
            .ok_or_else(|| SeriesError::MissingColumn(schema.unixtime_column.clone()))?;

        self.build_series(epoch_index, |row, cell| {
            let seconds: i64 = cell
                .parse()
                .map_err(|_| SeriesError::InvalidTimestamp {
                    row,
                    value: cell.to_string(),
                })?;
            DateTime::from_timestamp(seconds, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| SeriesError::InvalidTimestamp {
                    row,
                    value: cell.to_string(),
                })
        })
    }

    /// Convert to a time series from a table that already carries a
    /// formatted timestamp column (a previously written rainfall CSV).
    pub fn into_series_from_datetime(
        self,
        schema: &SeriesSchema,
    ) -> Result<TimeSeries, SeriesError> {
        let timestamp_index = self
            .headers
            .iter()
            .position(|h| h == &schema.timestamp_column)
            .ok_or_else(|| SeriesError::MissingColumn(schema.timestamp_column.clone()))?;

        self.build_series(timestamp_index, |row, cell| {
            NaiveDateTime::parse_from_str(cell, DATE_TIME_FORMAT).map_err(|_| {
                SeriesError::InvalidTimestamp {
                    row,
                    value: cell.to_string(),
                }
            })
        })
    }

    fn build_series<F>(self, timestamp_index: usize, parse_ts: F) -> Result<TimeSeries, SeriesError>
    where
        F: Fn(usize, &str) -> Result<NaiveDateTime, SeriesError>,
    {
        let mut stamped: Vec<(NaiveDateTime, &Vec<String>)> = Vec::with_capacity(self.records.len());
        for (row, record) in self.records.iter().enumerate() {
            let cell = record.get(timestamp_index).map(String::as_str).unwrap_or("");
            stamped.push((parse_ts(row, cell)?, record));
        }
        stamped.sort_by_key(|(ts, _)| *ts);

        let timestamps: Vec<NaiveDateTime> = stamped.iter().map(|(ts, _)| *ts).collect();
        let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (index, name) in self.headers.iter().enumerate() {
            if index == timestamp_index {
                continue;
            }
            let mut values = Vec::with_capacity(stamped.len());
            let mut numeric = true;
            for (_, record) in &stamped {
                let cell = record.get(index).map(String::as_str).unwrap_or("");
                if cell.is_empty() {
                    values.push(0.0);
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(v) => values.push(v),
                    Err(_) => {
                        numeric = false;
                        break;
                    }
                }
            }
            if numeric {
                columns.insert(name.clone(), values);
            }
        }

        TimeSeries::new(timestamps, columns)
    }
}

fn sniff_delimiter(body: &str) -> u8 {
    let header = body.lines().next().unwrap_or("");
    if header.contains(';') {
        b';'
    } else if header.contains(',') {
        b','
    } else {
        b' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // https://meter.ac/gs/meteo/M08/data-rain.php
    const RAIN_RESULT: &str = "unixtime,rainfall\n1705881600,10\n1705882200,12\n1705882800,12\n";

    #[test]
    fn test_from_delimited_comma() {
        let table = RawTable::from_delimited(RAIN_RESULT);
        assert_eq!(table.headers, vec!["unixtime", "rainfall"]);
        assert_eq!(table.records.len(), 3);
        assert_eq!(table.records[0], vec!["1705881600", "10"]);
    }

    #[test]
    fn test_from_delimited_semicolon() {
        let table = RawTable::from_delimited("unixtime;rainfall\n1705881600;10\n");
        assert_eq!(table.headers, vec!["unixtime", "rainfall"]);
        assert_eq!(table.records[0], vec!["1705881600", "10"]);
    }

    #[test]
    fn test_into_series_unix_conversion() {
        let table = RawTable::from_delimited(RAIN_RESULT);
        let series = table.into_series(&SeriesSchema::default()).unwrap();

        // 1705881600 = 2024-01-22 00:00:00 UTC
        let expected = NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(series.timestamps()[0], expected);
        assert_eq!(series.column("rainfall").unwrap(), &[10.0, 12.0, 12.0]);
    }

    #[test]
    fn test_into_series_epoch_column_case_insensitive() {
        let table = RawTable::from_delimited("UnixTime,rainfall\n1705881600,10\n");
        let series = table.into_series(&SeriesSchema::default()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_into_series_missing_epoch_column() {
        let table = RawTable::from_delimited("time,rainfall\n1705881600,10\n");
        let err = table.into_series(&SeriesSchema::default()).unwrap_err();
        assert_eq!(err, SeriesError::MissingColumn("unixtime".to_string()));
    }

    #[test]
    fn test_into_series_sorts_rows() {
        let table =
            RawTable::from_delimited("unixtime,rainfall\n1705882200,12\n1705881600,10\n");
        let series = table.into_series(&SeriesSchema::default()).unwrap();
        assert_eq!(series.column("rainfall").unwrap(), &[10.0, 12.0]);
    }

    #[test]
    fn test_into_series_drops_text_columns() {
        let table = RawTable::from_delimited(
            "unixtime,rainfall,flag\n1705881600,10,ok\n1705882200,12,ok\n",
        );
        let series = table.into_series(&SeriesSchema::default()).unwrap();
        assert!(series.column("flag").is_err());
        assert!(series.column("rainfall").is_ok());
    }

    #[test]
    fn test_into_series_from_datetime() {
        let table = RawTable::from_delimited(
            "Date/Time,pq\n2024-01-22 00:00:00,0.2\n2024-01-22 00:10:00,0.4\n",
        );
        let series = table
            .into_series_from_datetime(&SeriesSchema::default())
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.column("pq").unwrap(), &[0.2, 0.4]);
    }

    #[test]
    fn test_into_series_bad_epoch_cell() {
        let table = RawTable::from_delimited("unixtime,rainfall\nnot-a-number,10\n");
        let err = table.into_series(&SeriesSchema::default()).unwrap_err();
        assert_eq!(
            err,
            SeriesError::InvalidTimestamp {
                row: 0,
                value: "not-a-number".to_string(),
            }
        );
    }
}
