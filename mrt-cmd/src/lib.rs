//! Command implementations for the MRT CLI.
//!
//! Provides subcommands for fetching meter.ac rainfall data and for
//! deriving rain events, interval precipitation, and period sums from
//! previously fetched tables.

use clap::Subcommand;

pub mod query;
pub mod report;

#[derive(Subcommand)]
pub enum Command {
    /// Fetch per-device rainfall tables from meter.ac and write them as CSV
    FetchRain {
        /// Device identifiers, e.g. M08 (repeatable)
        #[arg(short, long, required = true)]
        device: Vec<String>,

        /// Output directory for the normalized rainfall CSVs
        #[arg(short, long)]
        output_dir: String,

        /// Epoch-seconds column name in the fetched tables
        #[arg(long, default_value = "unixtime")]
        unixtime_column: String,
    },

    /// Fetch station metadata and print it as CSV
    Stations {
        /// Metadata URL
        #[arg(long, default_value = mrt_meterac::station::METADATA_URL)]
        url: String,
    },

    /// Detect rain periods in a rainfall CSV
    Events {
        /// Path to a rainfall CSV with a formatted timestamp column
        #[arg(short, long)]
        input: String,

        /// Rainfall column to scan
        #[arg(short, long, default_value = "pq")]
        column: String,

        /// Timestamp column name
        #[arg(long, default_value = "Date/Time")]
        timestamp_column: String,

        /// Minimum rise between consecutive readings that opens an event
        #[arg(long, default_value_t = 0.01)]
        threshold: f64,

        /// Consecutive unchanged readings that close an event
        #[arg(long, default_value_t = 10)]
        stop_window: usize,

        /// Drop an event still open at the end of the series instead of
        /// closing it at the last timestamp
        #[arg(long)]
        discard_open: bool,

        /// Treat the column as a cumulative tip counter and difference it
        /// before detection
        #[arg(long)]
        cumulative: bool,

        /// Inclusive start date (YYYY-MM-DD) of the analysis window
        #[arg(long)]
        start: Option<String>,

        /// Inclusive end date (YYYY-MM-DD) of the analysis window
        #[arg(long)]
        end: Option<String>,

        /// Analyze the previous calendar year only
        #[arg(long)]
        last_year: bool,

        /// Analyze the previous calendar month only
        #[arg(long)]
        last_month: bool,

        /// Emit JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Total precipitation per interval (tipping-bucket counts to mm)
    Precipitation {
        #[arg(short, long)]
        input: String,

        /// Raw tip-count column to convert
        #[arg(short, long, default_value = "rainfall")]
        column: String,

        #[arg(long, default_value = "Date/Time")]
        timestamp_column: String,

        /// Interval width in hours; 0 converts row by row
        #[arg(long, default_value_t = 24)]
        interval_hours: u32,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        last_year: bool,

        #[arg(long)]
        last_month: bool,

        #[arg(long)]
        json: bool,
    },

    /// Plain rainfall sums per calendar-aligned period
    PeriodSum {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "pq")]
        column: String,

        #[arg(long, default_value = "Date/Time")]
        timestamp_column: String,

        #[arg(long, default_value_t = 24)]
        interval_hours: u32,

        /// Daily reporting origin as HH:MM (00:00 international,
        /// 07:30 regional hydrological day)
        #[arg(long, default_value = "00:00")]
        origin: String,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        last_year: bool,

        #[arg(long)]
        last_month: bool,

        #[arg(long)]
        json: bool,
    },

    /// Map a feature column from one series onto another's timestamps
    Align {
        /// CSV whose timestamps the output follows
        #[arg(long)]
        source: String,

        /// CSV the feature values are read from
        #[arg(long)]
        target: String,

        /// Feature column in the target CSV
        #[arg(short, long)]
        feature: String,

        #[arg(long, default_value = "Date/Time")]
        timestamp_column: String,

        /// Matching window in minutes around each source timestamp
        #[arg(long, default_value_t = 10.0)]
        window_minutes: f64,

        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::FetchRain {
            device,
            output_dir,
            unixtime_column,
        } => query::run_fetch_rain(&device, &output_dir, &unixtime_column).await,
        Command::Stations { url } => query::run_stations(&url).await,
        Command::Events {
            input,
            column,
            timestamp_column,
            threshold,
            stop_window,
            discard_open,
            cumulative,
            start,
            end,
            last_year,
            last_month,
            json,
        } => report::run_events(
            &input,
            &column,
            &timestamp_column,
            threshold,
            stop_window,
            discard_open,
            cumulative,
            report::DateWindow {
                start: start.as_deref(),
                end: end.as_deref(),
                last_year,
                last_month,
            },
            json,
        ),
        Command::Precipitation {
            input,
            column,
            timestamp_column,
            interval_hours,
            start,
            end,
            last_year,
            last_month,
            json,
        } => report::run_precipitation(
            &input,
            &column,
            &timestamp_column,
            interval_hours,
            report::DateWindow {
                start: start.as_deref(),
                end: end.as_deref(),
                last_year,
                last_month,
            },
            json,
        ),
        Command::PeriodSum {
            input,
            column,
            timestamp_column,
            interval_hours,
            origin,
            start,
            end,
            last_year,
            last_month,
            json,
        } => report::run_period_sum(
            &input,
            &column,
            &timestamp_column,
            interval_hours,
            &origin,
            report::DateWindow {
                start: start.as_deref(),
                end: end.as_deref(),
                last_year,
                last_month,
            },
            json,
        ),
        Command::Align {
            source,
            target,
            feature,
            timestamp_column,
            window_minutes,
            json,
        } => report::run_align(
            &source,
            &target,
            &feature,
            &timestamp_column,
            window_minutes,
            json,
        ),
    }
}
