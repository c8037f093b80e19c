//! Cron scheduler for the periodic harvest.
//!
//! Runs are never allowed to overlap: the history dedup reads the log at run
//! start and holds no lock against another writer, so a tick that fires while a
//! run is still in flight is skipped.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::ScheduleSettings;
use crate::pipeline::Pipeline;
use crate::source::WorkbookSource;

use super::jobs;

/// Cron scheduler that triggers harvest runs.
pub struct CronScheduler<S> {
    pipeline: Arc<Pipeline<S>>,
    settings: Arc<CronSettings>,
    in_flight: Arc<Mutex<()>>,
}

/// Configuration for cron job intervals
#[derive(Debug, Clone)]
pub struct CronSettings {
    /// Interval between harvest runs - default 15 minutes
    pub harvest_interval_secs: u64,
    /// Harvest once immediately instead of waiting for the first tick
    pub run_on_start: bool,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            harvest_interval_secs: 900, // 15 minutes
            run_on_start: true,
        }
    }
}

impl From<&ScheduleSettings> for CronSettings {
    fn from(schedule: &ScheduleSettings) -> Self {
        Self {
            harvest_interval_secs: schedule.interval_secs.max(1),
            run_on_start: schedule.run_on_start,
        }
    }
}

impl<S> CronScheduler<S>
where
    S: WorkbookSource + Send + Sync + 'static,
{
    pub fn new(pipeline: Arc<Pipeline<S>>, settings: CronSettings) -> Self {
        Self {
            pipeline,
            settings: Arc::new(settings),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_harvest_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started with {} jobs", 1);

        if self.settings.run_on_start {
            let pipeline = self.pipeline.clone();
            let in_flight = self.in_flight.clone();
            tokio::spawn(async move {
                harvest_once(pipeline, in_flight).await;
            });
        }

        // Wait for cancellation
        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;

        // Let a run that is already writing finish
        let _guard = self.in_flight.lock().await;
        Ok(())
    }

    async fn register_harvest_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let pipeline = self.pipeline.clone();
        let in_flight = self.in_flight.clone();
        let interval = self.settings.harvest_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let pipeline = pipeline.clone();
                let in_flight = in_flight.clone();
                Box::pin(async move {
                    harvest_once(pipeline, in_flight).await;
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered harvest job (every {}s)", interval);
        Ok(())
    }
}

async fn harvest_once<S>(pipeline: Arc<Pipeline<S>>, in_flight: Arc<Mutex<()>>)
where
    S: WorkbookSource + Send + Sync + 'static,
{
    let Ok(_guard) = in_flight.try_lock() else {
        warn!("Previous harvest still running, skipping this tick");
        return;
    };

    if let Err(e) = jobs::harvest::run(&pipeline).await {
        error!("Harvest run failed: {:#}", e);
    }
}
