use std::sync::Arc;

use anyhow::Context;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

use harvester::{cron::jobs, CronScheduler, CronSettings, FolderSource, Pipeline, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .context("Failed to initialise logger")?;

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it is valid")?;

    info!(
        "Harvesting {} into {}",
        settings.source.folder, settings.history.path
    );

    let pipeline = Arc::new(Pipeline::from_settings(&settings));

    if settings.schedule.once {
        // CI mode: one run, summary on stdout, non-zero exit on a fatal failure
        let summary = jobs::harvest::run(&pipeline).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    run_scheduler(settings, pipeline).await
}

async fn run_scheduler(
    settings: Settings,
    pipeline: Arc<Pipeline<FolderSource>>,
) -> anyhow::Result<()> {
    let cancellation_token = CancellationToken::new();

    let cron_scheduler = CronScheduler::new(pipeline, CronSettings::from(&settings.schedule));

    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!("Cron scheduler started - harvest runs every {}s", settings.schedule.interval_secs);

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Harvester running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    cancellation_token.cancel();

    // Wait for the scheduler; it lets an in-flight run finish its write
    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    info!("Harvester stopped");
    Ok(())
}
