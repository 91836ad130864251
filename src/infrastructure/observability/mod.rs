//! Observability infrastructure - Metrics

mod prometheus;

pub use prometheus::{
    init_metrics, record_model_action, record_retrain_failure, record_retrain_trigger,
    record_scheduled_jobs, TriggerReason,
};
