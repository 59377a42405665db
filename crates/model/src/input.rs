//! Parsing of raw user input. Every helper fails before anything is
//! written, so a rejected form never leaves partial state behind.

use chrono::NaiveDate;

use crate::{decimal::Decimal, errors::TrackerError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest amount a single entry may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_cents(100_000_000_000);

pub fn parse_date(value: &str) -> Result<NaiveDate, TrackerError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        TrackerError::invalid(format!(
            "'{}' is not a valid date, expected YYYY-MM-DD",
            value
        ))
    })
}

/// Optional date field: blank means "not given".
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, TrackerError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(value).map(Some)
    }
}

pub fn parse_amount(value: &str) -> Result<Decimal, TrackerError> {
    let amount: Decimal = value
        .parse()
        .map_err(|_| TrackerError::invalid(format!("'{}' is not a valid number", value)))?;
    ensure_positive(amount)
}

pub fn ensure_positive(amount: Decimal) -> Result<Decimal, TrackerError> {
    if !amount.is_positive() {
        Err(TrackerError::invalid(format!(
            "amount must be positive, got {}",
            amount
        )))
    } else if amount > MAX_AMOUNT {
        Err(TrackerError::invalid(format!(
            "amount must not exceed {}, got {}",
            MAX_AMOUNT, amount
        )))
    } else {
        Ok(amount)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            parse_date("2024-02-29").unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29.02.2024").is_err());
        assert_eq!(None, parse_optional_date("  ").unwrap());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!("12.50", parse_amount("12.5").unwrap().to_string());
        assert!(matches!(
            parse_amount("twelve"),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-4").is_err());
    }

    #[test]
    fn test_amount_limit() {
        assert_eq!(MAX_AMOUNT, parse_amount("1000000000").unwrap());
        assert!(matches!(
            parse_amount("1000000000.01"),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(parse_amount("90000000000000000").is_err());
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!("2024-03-07", format_date(date));
    }
}
