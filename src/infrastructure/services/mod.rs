//! Infrastructure services

mod lifecycle_service;
mod retrain_scheduler;

pub use lifecycle_service::{ModelLifecycleService, ReconcileAction, SyncReport};
pub use retrain_scheduler::{
    job_key, JobRegistry, ResyncReport, RetrainScheduler, RetrainTrigger, ScheduledJob,
    ScheduledModel, JOB_PREFIX,
};
