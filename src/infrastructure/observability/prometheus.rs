//! Prometheus metrics for model actions and retrain scheduling

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;

/// Why a retrain was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    CatchUp,
    Scheduled,
}

impl TriggerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatchUp => "catch_up",
            Self::Scheduled => "scheduled",
        }
    }
}

/// Install the Prometheus exporter with its own HTTP listener
pub fn init_metrics(config: &MetricsConfig) -> anyhow::Result<()> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return Ok(());
    }

    let addr: SocketAddr = config.listen.parse()?;
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    gauge!("mindsdb_model_manager_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::info!("Prometheus metrics listening on {}", addr);

    Ok(())
}

/// Record a remote action issued by the lifecycle service
pub fn record_model_action(action: &'static str) {
    counter!("mindsdb_model_actions_total", "action" => action).increment(1);
}

/// Record a retrain trigger fired by the scheduler
pub fn record_retrain_trigger(model: &str, reason: TriggerReason) {
    counter!(
        "mindsdb_retrain_triggers_total",
        "model" => model.to_string(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record a failed retrain trigger
pub fn record_retrain_failure(model: &str) {
    counter!("mindsdb_retrain_failures_total", "model" => model.to_string()).increment(1);
}

/// Current number of registered periodic jobs
pub fn record_scheduled_jobs(count: usize) {
    gauge!("mindsdb_scheduled_jobs").set(count as f64);
}
