//! MindsDB model manager
//!
//! Keeps MindsDB models in line with declarative definitions:
//! - Reconciles each definition against the remote model (train, retrain, or skip)
//! - Renders training, finetune and predict options from templates
//! - Schedules periodic retrains per cadence with missed-run catch-up

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use domain::{ModelRegistry, ModelTrainingService};
use infrastructure::mindsdb::MindsDbClient;
use infrastructure::services::ModelLifecycleService;

/// Load `.env` and configuration, then install logging and metrics
pub fn init() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    infrastructure::logging::init_logging(&config.logging)?;
    infrastructure::observability::init_metrics(&config.metrics)?;

    Ok(config)
}

/// Build the lifecycle service against the configured MindsDB instance.
///
/// A failed connection is logged; remote calls fail until it recovers.
pub async fn create_lifecycle_service(
    config: &AppConfig,
) -> anyhow::Result<Arc<ModelLifecycleService<MindsDbClient>>> {
    let registry = ModelRegistry::load(&config.models_path)?;
    info!(
        path = %config.models_path,
        models = registry.len(),
        "Loaded model definitions"
    );

    let client = MindsDbClient::new(config.mindsdb.connection())?;
    match client.connect().await {
        Ok(()) => info!(host = %config.mindsdb.host, "Connected to MindsDB"),
        Err(e) => warn!(host = %config.mindsdb.host, error = %e, "Failed to connect to MindsDB"),
    }

    Ok(Arc::new(ModelLifecycleService::new(
        Arc::new(client),
        Arc::new(registry),
        config.project.clone(),
        config.integration_prefix(),
    )))
}
