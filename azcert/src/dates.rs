//! Date helpers for certificate validity windows.
//!
//! The remote API is not consistent about timestamp formats, so parsing is
//! lenient: RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]`, or a bare date.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};

pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Display styles, named after the date-fns tokens the admin pages used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateStyle {
    /// `March 15, 2023` (PPP)
    Long,
    /// `Mar 15, 2023` (PP)
    Medium,
    /// `03/15/2023` (P)
    Short,
    /// `14:30` (p)
    Time,
    /// `03/15/2023 14:30` (Pp)
    DateTime,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Long => "%B %-d, %Y",
            DateStyle::Medium => "%b %-d, %Y",
            DateStyle::Short => "%m/%d/%Y",
            DateStyle::Time => "%H:%M",
            DateStyle::DateTime => "%m/%d/%Y %H:%M",
        }
    }
}

pub fn parse_lenient(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_date(date: &NaiveDateTime, style: DateStyle) -> String {
    date.format(style.pattern()).to_string()
}

/// Format an optional date, substituting `fallback` when it is unknown.
pub fn format_or(date: Option<&NaiveDateTime>, style: DateStyle, fallback: &str) -> String {
    date.map(|d| format_date(d, style))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn add_days(date: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}

/// Calendar month arithmetic; the day is clamped to the end of shorter months.
pub fn add_months(date: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

pub fn add_years(date: NaiveDateTime, years: i32) -> Option<NaiveDateTime> {
    add_months(date, years.checked_mul(12)?)
}

pub fn is_same_day(a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
    a.date() == b.date()
}

pub fn start_of_month(date: NaiveDateTime) -> Option<NaiveDateTime> {
    date.date().with_day(1).map(|d| d.and_time(date.time()))
}

pub fn end_of_month(date: NaiveDateTime) -> Option<NaiveDateTime> {
    let first = date.date().with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    next.pred_opt().map(|d| d.and_time(date.time()))
}

/// Serde adapter for required timestamps.
pub mod lenient {
    use super::{WIRE_FORMAT, parse_lenient};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(WIRE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_lenient(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
    }
}

/// Serde adapter for timestamps the remote may omit or garble.
pub mod lenient_option {
    use super::{WIRE_FORMAT, parse_lenient};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(WIRE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_lenient))
    }
}
