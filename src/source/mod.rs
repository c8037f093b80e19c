//! Workbook sources.
//!
//! A source lists the workbooks available for the current run and opens them one
//! at a time. Listing and opening are separate so a single unreadable file can be
//! reported without losing the rest of the folder.

mod folder;
mod workbook;

pub use folder::FolderSource;
pub use workbook::{Cell, Sheet, Workbook};

use anyhow::Result;

/// A workbook the source can open, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookEntry {
    /// Name recorded as `source_file` in the history log
    pub name: String,
    /// Adapter-specific handle (a path for [`FolderSource`])
    pub locator: String,
}

/// Supplies the workbooks for one run.
///
/// An empty listing is a valid result.
pub trait WorkbookSource {
    /// Human-readable root, used when the listing itself fails.
    fn describe(&self) -> String;

    fn list(&self) -> Result<Vec<WorkbookEntry>>;

    fn open(&self, entry: &WorkbookEntry) -> Result<Workbook>;
}
