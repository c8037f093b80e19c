use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::models::Observation;

use super::row::{HistoryRow, HEADER};

/// Identity used to reject rows that are already recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Timestamp truncated to the store's resolution, in Unix seconds
    pub bucket: i64,
    pub game: String,
    pub source_file: String,
}

/// Outcome of one [`HistoryStore::append`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppendResult {
    pub added: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
}

/// The history log plus an in-memory index of what it already holds.
///
/// The store is loaded once per run. It can only grow: there is no update or
/// delete operation, and persisting copies the existing bytes verbatim before
/// adding new rows.
pub struct HistoryStore {
    path: PathBuf,
    resolution_secs: i64,
    rows: Vec<Observation>,
    seen: FxHashSet<DedupKey>,
    needs_header: bool,
}

impl HistoryStore {
    /// Load the log at `path`. A missing or empty file is an empty history; any
    /// malformed row is an error.
    pub fn open(path: impl Into<PathBuf>, resolution_secs: u64) -> Result<Self> {
        let path = path.into();
        let resolution_secs = resolution_secs.max(1) as i64;

        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", path.display()))
            }
        };

        let rows = if needs_header {
            Vec::new()
        } else {
            read_rows(&path)?
        };

        let mut store = Self {
            path,
            resolution_secs,
            rows: Vec::new(),
            seen: FxHashSet::default(),
            needs_header,
        };
        for row in &rows {
            let key = store.key(row);
            store.seen.insert(key);
        }
        store.rows = rows;

        debug!(
            "Loaded {} history rows from {}",
            store.rows.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// Every persisted row, in file order.
    pub fn load(&self) -> &[Observation] {
        &self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self, obs: &Observation) -> DedupKey {
        let secs = obs.timestamp.timestamp();
        DedupKey {
            bucket: secs - secs.rem_euclid(self.resolution_secs),
            game: obs.game.clone(),
            source_file: obs.source_file.clone(),
        }
    }

    /// Validate, dedup and persist `candidates` in the order given.
    ///
    /// Rows without a game or without any metric are skipped as invalid. Rows
    /// whose identity is already stored, or already accepted earlier in this
    /// batch, are skipped as duplicates. The rest is written in one step.
    pub fn append(
        &mut self,
        candidates: impl IntoIterator<Item = Observation>,
    ) -> Result<AppendResult> {
        let mut result = AppendResult::default();
        let mut batch_keys: FxHashSet<DedupKey> = FxHashSet::default();
        let mut fresh = Vec::new();

        for obs in candidates {
            if !obs.is_valid() {
                debug!("Skipping invalid row {:?} from {}", obs.game, obs.source_file);
                result.skipped_invalid += 1;
                continue;
            }
            let key = self.key(&obs);
            if self.seen.contains(&key) || batch_keys.contains(&key) {
                result.skipped_duplicate += 1;
                continue;
            }
            batch_keys.insert(key);
            fresh.push(obs);
        }

        if !fresh.is_empty() || self.needs_header {
            self.persist(&fresh)?;
            self.needs_header = false;
        }

        result.added = fresh.len();
        self.seen.extend(batch_keys);
        self.rows.extend(fresh);

        if result.added > 0 {
            info!("Appended {} rows to {}", result.added, self.path.display());
        }
        Ok(result)
    }

    /// Write existing bytes plus `fresh` to a temp file next to the log, then
    /// rename it over the log.
    fn persist(&self, fresh: &[Observation]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

        if !self.needs_header {
            let existing = fs::read(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            tmp.write_all(&existing)?;
            if !existing.ends_with(b"\n") {
                tmp.write_all(b"\n")?;
            }
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(tmp.as_file_mut());
            if self.needs_header {
                writer.write_record(HEADER)?;
            }
            for obs in fresh {
                writer.serialize(HistoryRow::from(obs))?;
            }
            writer.flush()?;
        }

        tmp.as_file()
            .sync_all()
            .context("Failed to sync history temp file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn read_rows(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    if headers.len() != HEADER.len() || headers.iter().zip(HEADER).any(|(a, b)| a.trim() != b) {
        bail!(
            "{}: unexpected header {:?}, expected {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>(),
            HEADER
        );
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<HistoryRow>().enumerate() {
        // Line 1 is the header
        let line = idx + 2;
        let row = record.with_context(|| format!("{}: malformed row at line {}", path.display(), line))?;
        let obs = Observation::try_from(row)
            .with_context(|| format!("{}: bad row at line {}", path.display(), line))?;
        rows.push(obs);
    }
    Ok(rows)
}
