//! Append-only history log.
//!
//! The log is a CSV file with a fixed header
//! (`timestamp,game,24H,Week,Month,RTP,source_file`) read by the dashboard by
//! column name. Rows are only ever added.

mod row;
mod store;

pub use row::{HistoryRow, HEADER};
pub use store::{AppendResult, DedupKey, HistoryStore};
