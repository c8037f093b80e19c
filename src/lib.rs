pub mod config;
pub mod cron;
pub mod extract;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod source;

pub use config::Settings;
pub use cron::{CronScheduler, CronSettings};
pub use history::{AppendResult, HistoryStore};
pub use models::{Candidate, Metric, MetricValues, Observation};
pub use pipeline::{FileError, Pipeline, RunSummary};
pub use resolver::TimestampResolver;
pub use source::{FolderSource, Workbook, WorkbookSource};
