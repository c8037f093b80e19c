use chrono::{DateTime, Utc};

use super::MetricValues;

/// A row found by the extractor, before its timestamp is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub game: String,
    pub values: MetricValues,
    /// Timestamp read from the sheet itself, if any
    pub timestamp: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(game: impl Into<String>, values: MetricValues) -> Self {
        Self {
            game: game.into(),
            values,
            timestamp: None,
        }
    }
}

/// One row of the history log.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub game: String,
    pub values: MetricValues,
    pub source_file: String,
}

impl Observation {
    /// A row is storable when it names a game and carries at least one metric.
    pub fn is_valid(&self) -> bool {
        !self.game.trim().is_empty() && !self.values.is_empty()
    }
}
