//! One harvest run: source → extractor → resolver → history.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::Settings;
use crate::extract::extract;
use crate::history::HistoryStore;
use crate::resolver::TimestampResolver;
use crate::source::{FolderSource, WorkbookSource};

use super::{FileError, RunSummary};

/// Drives harvest runs against one source and one history log.
///
/// The pipeline holds no state between runs; the history is reloaded at the
/// start of every run. Callers must not start a run while another is in flight.
pub struct Pipeline<S> {
    source: S,
    history_path: PathBuf,
    resolution_secs: u64,
}

impl Pipeline<FolderSource> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            FolderSource::new(&settings.source.folder, &settings.source.extensions),
            &settings.history.path,
            settings.dedup_resolution_secs(),
        )
    }
}

impl<S: WorkbookSource> Pipeline<S> {
    pub fn new(source: S, history_path: impl Into<PathBuf>, resolution_secs: u64) -> Self {
        Self {
            source,
            history_path: history_path.into(),
            resolution_secs,
        }
    }

    /// Run now.
    pub fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now())
    }

    /// Run with `started` as the fallback timestamp for rows without one.
    pub fn run_at(&self, started: DateTime<Utc>) -> Result<RunSummary> {
        let resolver = TimestampResolver::new(started);
        let mut summary = RunSummary::new(resolver.run_started());

        let mut store = HistoryStore::open(&self.history_path, self.resolution_secs)
            .with_context(|| {
                format!("Failed to load history from {}", self.history_path.display())
            })?;

        let entries = match self.source.list() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list workbooks in {}: {:#}", self.source.describe(), e);
                summary.errors.push(FileError {
                    file: self.source.describe(),
                    message: format!("{:#}", e),
                });
                Vec::new()
            }
        };

        if entries.is_empty() {
            info!("No workbooks found in {}", self.source.describe());
        }

        let mut batch = Vec::new();
        for entry in &entries {
            let workbook = match self.source.open(entry) {
                Ok(wb) => wb,
                Err(e) => {
                    warn!("Skipping {}: {:#}", entry.name, e);
                    summary.errors.push(FileError {
                        file: entry.name.clone(),
                        message: format!("{:#}", e),
                    });
                    continue;
                }
            };

            let before = batch.len();
            batch.extend(extract(&workbook).map(|c| resolver.resolve(c, &workbook.name)));
            debug!(
                "{}: {} candidates from {} sheets",
                workbook.name,
                batch.len() - before,
                workbook.sheets.len()
            );
            summary.files_processed += 1;
        }

        let result = store
            .append(batch)
            .with_context(|| format!("Failed to write history to {}", self.history_path.display()))?;

        summary.observations_added = result.added;
        summary.skipped_duplicate = result.skipped_duplicate;
        summary.skipped_invalid = result.skipped_invalid;
        summary.observations_skipped = result.skipped_duplicate + result.skipped_invalid;

        Ok(summary)
    }
}
