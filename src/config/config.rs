use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Where workbooks are picked up from.
///
/// The folder is filled by an external sync (Drive download, rsync, CI step);
/// the harvester only reads it.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    #[serde(default = "default_source_folder")]
    pub folder: String,
    /// Lowercase file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_source_folder() -> String {
    "incoming".to_string()
}

fn default_extensions() -> Vec<String> {
    ["xlsx", "xlsm", "xlsb", "xls", "ods"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            folder: default_source_folder(),
            extensions: default_extensions(),
        }
    }
}

/// History log location and dedup resolution.
#[derive(Debug, Deserialize, Clone)]
pub struct HistorySettings {
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Timestamps are truncated to a multiple of this many seconds
    /// before being compared for dedup. Defaults to the schedule interval.
    #[serde(default)]
    pub resolution_secs: Option<u64>,
}

fn default_history_path() -> String {
    "data/history.csv".to_string()
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            resolution_secs: None,
        }
    }
}

/// Run cadence.
///
/// - `once`: run a single harvest and exit (CI mode)
/// - `run_on_start`: harvest immediately instead of waiting for the first tick
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
    #[serde(default)]
    pub once: bool,
}

fn default_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_run_on_start() -> bool {
    true
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_on_start: default_run_on_start(),
            once: false,
        }
    }
}

/// Root application configuration.
///
/// Loaded from an optional `config.yaml` next to the binary, then overridden by
/// `HARVESTER__<SECTION>__<KEY>` environment variables.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("HARVESTER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Dedup bucket width; a rerun inside one schedule interval is a duplicate.
    pub fn dedup_resolution_secs(&self) -> u64 {
        self.history
            .resolution_secs
            .unwrap_or(self.schedule.interval_secs)
            .max(1)
    }
}
