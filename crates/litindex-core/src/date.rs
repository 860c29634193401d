use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

/// A publication date in its raw form and as a sortable `YYYYMMDD` integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    raw: String,
    ordinal: i64,
}

impl DateValue {
    /// Accepts a four digit year (month and day default to `0101`) or a
    /// calendar-valid `YYYY-MM-DD`.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let bytes = raw.as_bytes();
        let ordinal = if bytes.len() == 4 && bytes.iter().all(u8::is_ascii_digit) {
            raw.parse::<i64>().map(|year| year * 10_000 + 101).ok()
        } else if bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() })
        {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| i64::from(d.year()) * 10_000 + i64::from(d.month()) * 100 + i64::from(d.day()))
        } else {
            None
        };
        ordinal
            .map(|ordinal| Self { raw: raw.to_string(), ordinal })
            .ok_or_else(|| Error::DateFormat { field: field.to_string(), value: raw.to_string() })
    }

    pub fn raw(&self) -> &str { &self.raw }

    pub fn ordinal(&self) -> i64 { self.ordinal }
}
