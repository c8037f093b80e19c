//! Job that runs one harvest: new workbook rows into the history log.
//!
//! The pipeline is blocking file I/O, so it runs on tokio's blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::pipeline::{Pipeline, RunSummary};
use crate::source::WorkbookSource;

/// Runs the pipeline once and logs the outcome.
///
/// Per-file failures are part of the returned summary; an `Err` means the
/// history log could not be loaded or written.
pub async fn run<S>(pipeline: &Arc<Pipeline<S>>) -> Result<RunSummary>
where
    S: WorkbookSource + Send + Sync + 'static,
{
    info!("Starting harvest job...");

    let start = std::time::Instant::now();
    let pipeline = pipeline.clone();

    let summary = tokio::task::spawn_blocking(move || pipeline.run())
        .await
        .context("Harvest task panicked")??;

    info!(
        "Completed harvest job in {:?} ({} files, {} added, {} duplicates, {} invalid, {} errors)",
        start.elapsed(),
        summary.files_processed,
        summary.observations_added,
        summary.skipped_duplicate,
        summary.skipped_invalid,
        summary.errors.len()
    );
    Ok(summary)
}
