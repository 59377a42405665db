pub use chrono;

use chrono::{Datelike as _, Days, Local, NaiveDate};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Day 28 exists in every month and four days later is always in the
/// next one; stepping back by that date's day-of-month lands on the last
/// day of the requested month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = NaiveDate::from_ymd_opt(year, month, 28)?.checked_add_days(Days::new(4))?;
    next_month.checked_sub_days(Days::new(next_month.day() as u64))
}

/// Inclusive first and last day of the month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    Some((month_start(year, month)?, month_end(year, month)?))
}

/// Inclusive Jan 1 .. Dec 31.
pub fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((month_start(year, 1)?, month_end(year, 12)?))
}

pub fn current_month(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    month_range(today.year(), today.month())
}

pub fn current_year(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    year_range(today.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_february() {
        assert_eq!(
            Some((date(2024, 2, 1), date(2024, 2, 29))),
            month_range(2024, 2)
        );
        assert_eq!(Some(date(2023, 2, 28)), month_end(2023, 2));
        assert_eq!(Some(date(2000, 2, 29)), month_end(2000, 2));
        assert_eq!(Some(date(1900, 2, 28)), month_end(1900, 2));
    }

    #[test]
    fn test_every_month_ends_on_its_last_day() {
        for year in [2023, 2024] {
            for month in 1..=12 {
                let end = month_end(year, month).unwrap();
                assert_eq!(month, end.month());
                assert_eq!(year, end.year());
                let next = end.succ_opt().unwrap();
                assert_eq!(1, next.day());
            }
        }
    }

    #[test]
    fn test_thirty_and_thirty_one() {
        assert_eq!(Some(date(2024, 4, 30)), month_end(2024, 4));
        assert_eq!(Some(date(2024, 12, 31)), month_end(2024, 12));
        assert_eq!(Some(date(2024, 1, 31)), month_end(2024, 1));
    }

    #[test]
    fn test_year_range() {
        assert_eq!(
            Some((date(2024, 1, 1), date(2024, 12, 31))),
            year_range(2024)
        );
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(None, month_range(2024, 13));
        assert_eq!(None, month_range(2024, 0));
    }

    #[test]
    fn test_current_month() {
        assert_eq!(
            Some((date(2024, 3, 1), date(2024, 3, 31))),
            current_month(date(2024, 3, 17))
        );
    }
}
