mod config;

pub use config::{HistorySettings, ScheduleSettings, Settings, SourceSettings};
