//! Shared utility functions for MRT crates.

/// Date utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Format a NaiveDateTime as "YYYY-MM-DD HH:MM:SS"
    pub fn format_datetime(dt: &NaiveDateTime) -> String {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Parse a timestamp string in "YYYY-MM-DD HH:MM:SS" format
    pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
        Ok(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")?)
    }

    /// Parse a time-of-day string in "HH:MM" format (reporting origins)
    pub fn parse_time_hm(s: &str) -> anyhow::Result<NaiveTime> {
        Ok(NaiveTime::parse_from_str(s, "%H:%M")?)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse_date() {
            let date = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2024-01-22");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_format_and_parse_datetime() {
            let dt = NaiveDate::from_ymd_opt(2024, 1, 22)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap();
            let formatted = format_datetime(&dt);
            assert_eq!(formatted, "2024-01-22 07:30:00");
            let parsed = parse_datetime(&formatted).unwrap();
            assert_eq!(parsed, dt);
        }

        #[test]
        fn test_parse_time_hm() {
            let time = parse_time_hm("07:30").unwrap();
            assert_eq!(time, chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap());
            assert!(parse_time_hm("7h30").is_err());
        }
    }
}
