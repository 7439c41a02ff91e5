use chrono::{NaiveDateTime, TimeDelta};
use std::mem::replace;

/// A timestamp iterator that yields each step from the start timestamp
/// through the end timestamp (inclusive), stepping by a fixed delta.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct TimeRange(pub NaiveDateTime, pub NaiveDateTime, pub TimeDelta);

impl Iterator for TimeRange {
    type Item = NaiveDateTime;
    fn next(&mut self) -> Option<Self::Item> {
        if self.2 <= TimeDelta::zero() {
            return None;
        }
        if self.0 <= self.1 {
            let next = self.0 + self.2;
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimeRange;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_time_range_iteration() {
        let range = TimeRange(at(0), at(12), TimeDelta::try_hours(6).unwrap());
        let steps: Vec<NaiveDateTime> = range.collect();
        assert_eq!(steps, vec![at(0), at(6), at(12)]);
    }

    #[test]
    fn test_time_range_endpoint_not_on_step() {
        let range = TimeRange(at(0), at(11), TimeDelta::try_hours(6).unwrap());
        let steps: Vec<NaiveDateTime> = range.collect();
        assert_eq!(steps, vec![at(0), at(6)]);
    }

    #[test]
    fn test_time_range_single_step() {
        let range = TimeRange(at(3), at(3), TimeDelta::try_hours(1).unwrap());
        let steps: Vec<NaiveDateTime> = range.collect();
        assert_eq!(steps, vec![at(3)]);
    }

    #[test]
    fn test_time_range_empty() {
        let range = TimeRange(at(5), at(4), TimeDelta::try_hours(1).unwrap());
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_time_range_zero_step() {
        let range = TimeRange(at(0), at(5), TimeDelta::zero());
        assert_eq!(range.count(), 0);
    }
}
