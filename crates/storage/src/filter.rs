use bson::{doc, Bson, Document};
use chrono::NaiveDate;
use model::input::format_date;
use mongodb::error::{ErrorKind, WriteFailure};

const DUPLICATE_KEY: i32 = 11000;

/// Dates are stored as `YYYY-MM-DD` strings, which sort chronologically.
pub fn date_key(date: NaiveDate) -> String {
    format_date(date)
}

pub fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Document> {
    match (from, to) {
        (Some(from), Some(to)) => Some(doc! { "$gte": date_key(from), "$lte": date_key(to) }),
        (Some(from), None) => Some(doc! { "$gte": date_key(from) }),
        (None, Some(to)) => Some(doc! { "$lte": date_key(to) }),
        (None, None) => None,
    }
}

/// Escapes regex metacharacters so user input matches literally.
pub fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn contains_ignore_case(value: &str) -> Document {
    doc! { "$regex": escape_regex(value), "$options": "i" }
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(err)) => err.code == DUPLICATE_KEY,
        ErrorKind::Command(err) => err.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Numbers in documents written by older clients may be stored as
/// doubles or integers.
pub fn number(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::Double(value) => Some(*value),
        Bson::Int32(value) => Some(*value as f64),
        Bson::Int64(value) => Some(*value as f64),
        Bson::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!("Cafe", escape_regex("Cafe"));
        assert_eq!(r"St\. Mary's", escape_regex("St. Mary's"));
        assert_eq!(r"a\+b\(c\)", escape_regex("a+b(c)"));
        assert_eq!(r"\\d", escape_regex(r"\d"));
    }

    #[test]
    fn test_date_range() {
        assert_eq!(None, date_range(None, None));
        assert_eq!(
            Some(doc! { "$gte": "2024-01-01", "$lte": "2024-01-31" }),
            date_range(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)))
        );
        assert_eq!(
            Some(doc! { "$lte": "2024-01-31" }),
            date_range(None, Some(date(2024, 1, 31)))
        );
    }

    #[test]
    fn test_number() {
        assert_eq!(Some(12.5), number(Some(&Bson::Double(12.5))));
        assert_eq!(Some(3.0), number(Some(&Bson::Int32(3))));
        assert_eq!(Some(7.0), number(Some(&Bson::String("7".to_owned()))));
        assert_eq!(None, number(Some(&Bson::Null)));
        assert_eq!(None, number(None));
    }
}
