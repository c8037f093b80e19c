//! Explicit timestamps found inside sheets.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::source::Cell;

/// `2024-05-01`, `2024-05-01 12:00`, `2024-05-01T12:00:00.5+03:00`
static ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?(?:\.\d+)?)?\s*(Z|[+-]\d{2}:?\d{2})?",
    )
    .expect("iso date pattern")
});

/// Day-first forms: `01.05.2024`, `01/05/2024 12:00`
static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[./](\d{1,2})[./](\d{4})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?")
        .expect("day-first date pattern")
});

fn num(caps: &Captures, idx: usize) -> Option<u32> {
    caps.get(idx).and_then(|m| m.as_str().parse().ok())
}

fn time_of(caps: &Captures, h: usize, m: usize, s: usize) -> Option<NaiveTime> {
    match num(caps, h) {
        Some(hour) => NaiveTime::from_hms_opt(hour, num(caps, m)?, num(caps, s).unwrap_or(0)),
        None => NaiveTime::from_hms_opt(0, 0, 0),
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Drops sub-second precision.
pub fn to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Naive wall-clock times are taken as UTC.
pub fn naive_to_utc(ndt: NaiveDateTime) -> DateTime<Utc> {
    to_second(ndt.and_utc())
}

/// Find a date (optionally with time and offset) anywhere in `text`.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = ISO.captures(text) {
        let date = NaiveDate::from_ymd_opt(num(&caps, 1)? as i32, num(&caps, 2)?, num(&caps, 3)?)?;
        let ndt = date.and_time(time_of(&caps, 4, 5, 6)?);
        return match caps.get(7) {
            Some(raw) => {
                let offset = parse_offset(raw.as_str())?;
                let local = offset.from_local_datetime(&ndt).single()?;
                Some(to_second(local.with_timezone(&Utc)))
            }
            None => Some(naive_to_utc(ndt)),
        };
    }

    let caps = DAY_FIRST.captures(text)?;
    let date = NaiveDate::from_ymd_opt(num(&caps, 3)? as i32, num(&caps, 2)?, num(&caps, 1)?)?;
    Some(naive_to_utc(date.and_time(time_of(&caps, 4, 5, 6)?)))
}

/// Timestamp carried by a single cell, if it holds one.
pub fn cell_timestamp(cell: &Cell) -> Option<DateTime<Utc>> {
    match cell {
        Cell::DateTime(ndt) => Some(naive_to_utc(*ndt)),
        Cell::Text(text) => parse_date_text(text),
        _ => None,
    }
}
