use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;

/// Errors raised when building or reading a [`TimeSeries`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SeriesError {
    /// A named column was looked up but does not exist in the series.
    MissingColumn(String),
    /// A column's length does not match the timestamp column.
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    /// Timestamps are not in ascending order at the given row.
    UnsortedTimestamps { row: usize },
    /// A timestamp cell could not be converted at the given row.
    InvalidTimestamp { row: usize, value: String },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesError::MissingColumn(name) => write!(f, "missing column: {name}"),
            SeriesError::LengthMismatch {
                column,
                expected,
                actual,
            } => write!(
                f,
                "column {column} has {actual} rows, expected {expected}"
            ),
            SeriesError::UnsortedTimestamps { row } => {
                write!(f, "timestamps not in ascending order at row {row}")
            }
            SeriesError::InvalidTimestamp { row, value } => {
                write!(f, "invalid timestamp at row {row}: {value}")
            }
        }
    }
}

impl std::error::Error for SeriesError {}

/// An in-memory, time-ordered table: one timestamp per row plus named
/// numeric columns of equal length.
///
/// Construction guarantees non-decreasing timestamps and a dense positional
/// index, so components may safely look at "the next row" by position.
/// Filtering allocates a fresh series; rows are never renumbered in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl TimeSeries {
    /// Build a series from parallel vectors, validating that every column
    /// matches the timestamp count and that timestamps never decrease.
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        columns: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, SeriesError> {
        for (row, pair) in timestamps.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(SeriesError::UnsortedTimestamps { row: row + 1 });
            }
        }
        for (name, values) in &columns {
            if values.len() != timestamps.len() {
                return Err(SeriesError::LengthMismatch {
                    column: name.clone(),
                    expected: timestamps.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(TimeSeries {
            timestamps,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Look up a column by its exact name.
    pub fn column(&self, name: &str) -> Result<&[f64], SeriesError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SeriesError::MissingColumn(name.to_string()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn min_time(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn max_time(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Replace a column (or add a new one) with the given values.
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self, SeriesError> {
        if values.len() != self.timestamps.len() {
            return Err(SeriesError::LengthMismatch {
                column: name.to_string(),
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(self)
    }

    /// Keep only the rows whose timestamp satisfies the predicate.
    ///
    /// The result is a freshly allocated, contiguous series; positional
    /// adjacency in the output reflects the surviving rows only.
    pub fn retain_rows<F>(&self, keep: F) -> TimeSeries
    where
        F: Fn(NaiveDateTime) -> bool,
    {
        let kept: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, &ts)| keep(ts))
            .map(|(row, _)| row)
            .collect();

        let timestamps = kept.iter().map(|&row| self.timestamps[row]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let filtered = kept.iter().map(|&row| values[row]).collect();
                (name.clone(), filtered)
            })
            .collect();

        TimeSeries {
            timestamps,
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_new_validates_lengths() {
        let mut columns = BTreeMap::new();
        columns.insert("rainfall".to_string(), vec![1.0]);
        let err = TimeSeries::new(vec![ts(0, 0), ts(0, 10)], columns).unwrap_err();
        assert_eq!(
            err,
            SeriesError::LengthMismatch {
                column: "rainfall".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_new_rejects_unsorted() {
        let err = TimeSeries::new(vec![ts(1, 0), ts(0, 0)], BTreeMap::new()).unwrap_err();
        assert_eq!(err, SeriesError::UnsortedTimestamps { row: 1 });
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let series = TimeSeries::new(vec![ts(0, 0)], BTreeMap::new()).unwrap();
        let err = series.column("pq").unwrap_err();
        assert_eq!(err, SeriesError::MissingColumn("pq".to_string()));
        assert!(err.to_string().contains("pq"));
    }

    #[test]
    fn test_retain_rows_reindexes() {
        let mut columns = BTreeMap::new();
        columns.insert("rainfall".to_string(), vec![1.0, 2.0, 3.0]);
        let series = TimeSeries::new(vec![ts(0, 0), ts(0, 10), ts(0, 20)], columns).unwrap();

        let filtered = series.retain_rows(|t| t >= ts(0, 10));
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.timestamps()[0], ts(0, 10));
        assert_eq!(filtered.column("rainfall").unwrap(), &[2.0, 3.0]);
    }
}
