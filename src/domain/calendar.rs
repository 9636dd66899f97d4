use chrono::{NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

/// Wire format for expense occurrence timestamps (naive local time, no offset).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Wire format for day filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Literal shapes checked before chrono sees the input. 'd' stands for any ASCII digit.
const DATE_TIME_SHAPE: &str = "dddd-dd-ddTdd:dd:dd";
const DATE_SHAPE: &str = "dddd-dd-dd";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Invalid date format. Expected format: {expected}")]
    BadFormat { expected: &'static str },

    #[error("Invalid date value: {0}")]
    InvalidValue(String),

    #[error("Future Date is not allowed!")]
    FutureNotAllowed(String),
}

/// Validate an expense occurrence timestamp of the form `YYYY-MM-DDTHH:mm:ss`.
///
/// The input must match the literal shape, name a real calendar date and time,
/// and not be later than `now`.
pub fn parse_occurred_at(raw: &str, now: NaiveDateTime) -> Result<NaiveDateTime, DateError> {
    if !matches_shape(raw, DATE_TIME_SHAPE) {
        return Err(DateError::BadFormat {
            expected: "YYYY-MM-DDTHH:mm:ss",
        });
    }

    let value = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map_err(|_| DateError::InvalidValue(raw.to_string()))?;

    // chrono accepts ":60" as a leap second
    if value.nanosecond() >= 1_000_000_000 {
        return Err(DateError::InvalidValue(raw.to_string()));
    }

    if value > now {
        return Err(DateError::FutureNotAllowed(raw.to_string()));
    }

    Ok(value)
}

/// Validate a day filter of the form `YYYY-MM-DD` that must not be after `today`.
pub fn parse_filter_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    if !matches_shape(raw, DATE_SHAPE) {
        return Err(DateError::BadFormat {
            expected: "YYYY-MM-DD",
        });
    }

    let value = NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| DateError::InvalidValue(raw.to_string()))?;

    if value > today {
        return Err(DateError::FutureNotAllowed(raw.to_string()));
    }

    Ok(value)
}

pub fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

fn matches_shape(raw: &str, shape: &str) -> bool {
    raw.len() == shape.len()
        && raw.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}
