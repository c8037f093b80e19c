use chrono::{DateTime, Utc};
use serde::Serialize;

/// A workbook that could not be read during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub message: String,
}

/// What one run did. Per-file failures land in `errors`; the run itself only
/// fails when the history log cannot be loaded or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub files_processed: usize,
    pub observations_added: usize,
    /// `skipped_duplicate + skipped_invalid`
    pub observations_skipped: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
    pub errors: Vec<FileError>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            files_processed: 0,
            observations_added: 0,
            observations_skipped: 0,
            skipped_duplicate: 0,
            skipped_invalid: 0,
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
