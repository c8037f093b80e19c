use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{naive_to_utc, to_second};
use crate::models::{Metric, MetricValues, Observation};

/// Column order of the history log. Never reorder: consumers read by name but
/// existing files were written in this order.
pub const HEADER: [&str; 7] = ["timestamp", "game", "24H", "Week", "Month", "RTP", "source_file"];

/// On-disk shape of one observation. Absent metrics serialize as empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub timestamp: String,
    pub game: String,
    #[serde(rename = "24H")]
    pub value_24h: Option<f64>,
    #[serde(rename = "Week")]
    pub value_week: Option<f64>,
    #[serde(rename = "Month")]
    pub value_month: Option<f64>,
    #[serde(rename = "RTP")]
    pub value_rtp: Option<f64>,
    pub source_file: String,
}

impl From<&Observation> for HistoryRow {
    fn from(obs: &Observation) -> Self {
        Self {
            timestamp: obs.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            game: obs.game.clone(),
            value_24h: obs.values.get(Metric::Day),
            value_week: obs.values.get(Metric::Week),
            value_month: obs.values.get(Metric::Month),
            value_rtp: obs.values.get(Metric::Rtp),
            source_file: obs.source_file.clone(),
        }
    }
}

impl TryFrom<HistoryRow> for Observation {
    type Error = anyhow::Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        let timestamp = parse_timestamp(&row.timestamp)
            .with_context(|| format!("Unparsable timestamp '{}'", row.timestamp))?;
        Ok(Observation {
            timestamp,
            game: row.game,
            values: MetricValues::new(row.value_24h, row.value_week, row.value_month, row.value_rtp),
            source_file: row.source_file,
        })
    }
}

/// RFC 3339 as written by this crate, plus the forms the legacy collector wrote
/// (`2024-05-01 12:00:00.123456+00:00`, naive `2024-05-01 12:00:00`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(to_second(ts.with_timezone(&Utc)));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(to_second(ts.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive_to_utc(ndt));
        }
    }
    bail!("not an ISO-8601 timestamp")
}
