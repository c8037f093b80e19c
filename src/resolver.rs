//! Timestamp resolution for extracted candidates.
//!
//! Precedence: the sheet's own timestamp, then a date embedded in the workbook's
//! file name, then the instant the run started. The run start is captured once, so
//! every fallback row of a run carries the same value.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::{naive_to_utc, to_second};
use crate::models::{Candidate, Observation};

/// `2024-05-01`, `2024_05_01-1530`, `20240501T153000`
static FILENAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|\D)(20\d{2})[-_.]?(\d{2})[-_.]?(\d{2})(?:[-_T ]?(\d{2})[-_.:h]?(\d{2})(?:[-_.:m]?(\d{2}))?)?(?:\D|$)",
    )
    .expect("filename date pattern")
});

/// Date and time encoded in a workbook file name, read as UTC.
pub fn filename_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let caps = FILENAME_DATE.captures(name)?;
    let part = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(part(1)? as i32, part(2)?, part(3)?)?;
    let time = match (part(4), part(5)) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h, m, part(6).unwrap_or(0))?,
        _ => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(naive_to_utc(date.and_time(time)))
}

/// Assigns timestamps for one run.
#[derive(Debug, Clone, Copy)]
pub struct TimestampResolver {
    run_started: DateTime<Utc>,
}

impl TimestampResolver {
    pub fn new(run_started: DateTime<Utc>) -> Self {
        Self {
            run_started: to_second(run_started),
        }
    }

    pub fn run_started(&self) -> DateTime<Utc> {
        self.run_started
    }

    pub fn resolve(&self, candidate: Candidate, source_file: &str) -> Observation {
        let timestamp = candidate
            .timestamp
            .or_else(|| filename_timestamp(source_file))
            .unwrap_or(self.run_started);

        Observation {
            timestamp,
            game: candidate.game.trim().to_string(),
            values: candidate.values,
            source_file: source_file.to_string(),
        }
    }
}
