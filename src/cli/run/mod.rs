//! Run command - initial sync, retrain scheduling, then wait for shutdown

use tracing::{info, warn};

use crate::infrastructure::services::{JobRegistry, RetrainScheduler};

/// Sync all models and keep their retrain jobs running until ctrl-c
pub async fn run() -> anyhow::Result<()> {
    let config = crate::init()?;
    let lifecycle = crate::create_lifecycle_service(&config).await?;

    let report = lifecycle.sync_all().await;
    info!(
        trained = report.trained.len(),
        retrained = report.retrained.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Initial sync finished"
    );

    let mut scheduler = RetrainScheduler::new(JobRegistry::new());

    if config.scheduler.enabled {
        // without remote history no catch-up runs, but every job is still registered
        let models = match lifecycle.last_runs().await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "Failed to read last runs, scheduling without catch-up");
                lifecycle.scheduled_models()
            }
        };

        let resync = scheduler.resync(
            models,
            lifecycle.retrain_trigger(),
            &config.scheduler.timezone,
            Some(config.scheduler.schedule_table()),
        )?;
        info!(
            scheduled = resync.scheduled.len(),
            catch_up = resync.catch_up.len(),
            "Retrain jobs scheduled"
        );
    } else {
        info!("Retrain scheduler disabled");
    }

    tokio::signal::ctrl_c().await?;
    info!(jobs = scheduler.jobs().len(), "Shutting down");

    Ok(())
}
