//! Retrain scheduler - Periodic retrain jobs and missed-run catch-up

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;
use futures::future::{join_all, BoxFuture};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::schedule::{is_due_at, next_fire, parse_cron, parse_timezone};
use crate::domain::{DomainError, RetrainCadence, ScheduleTable};
use crate::infrastructure::observability::{
    record_retrain_failure, record_retrain_trigger, record_scheduled_jobs, TriggerReason,
};

/// Key prefix reserved for retrain jobs
pub const JOB_PREFIX: &str = "retrain-";

/// Callback fired with the model name whenever a retrain is due
pub type RetrainTrigger =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<(), DomainError>> + Send + Sync>;

/// A model as the scheduler sees it
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledModel {
    pub name: String,
    pub cadence: Option<RetrainCadence>,
    /// Last successful training run, if any
    pub last_run: Option<DateTime<Utc>>,
}

pub fn job_key(model: &str) -> String {
    format!("{}{}", JOB_PREFIX, model)
}

/// A registered periodic job
pub struct ScheduledJob {
    pub key: String,
    pub cron_expression: String,
    pub timezone: Tz,
    handle: JoinHandle<()>,
}

impl ScheduledJob {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("key", &self.key)
            .field("cron_expression", &self.cron_expression)
            .field("timezone", &self.timezone)
            .finish()
    }
}

/// Owned table of periodic jobs keyed by job key
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, ScheduledJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job, aborting any job already holding its key
    pub fn add(&mut self, job: ScheduledJob) {
        if let Some(previous) = self.jobs.insert(job.key.clone(), job) {
            previous.handle.abort();
        }
    }

    /// Abort and remove every job whose key starts with `prefix`
    pub fn remove_with_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .jobs
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &keys {
            if let Some(job) = self.jobs.remove(key) {
                job.handle.abort();
            }
        }

        keys.len()
    }

    pub fn get(&self, key: &str) -> Option<&ScheduledJob> {
        self.jobs.get(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.jobs.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        for job in self.jobs.values() {
            job.handle.abort();
        }
    }
}

/// Outcome of a [`RetrainScheduler::resync`]
#[derive(Debug, Default)]
pub struct ResyncReport {
    /// Job keys registered by this resync
    pub scheduled: Vec<String>,
    /// Models left unscheduled because of a configuration fault
    pub skipped: Vec<(String, DomainError)>,
    /// Launched catch-up retrains
    pub catch_up: Vec<JoinHandle<()>>,
}

impl ResyncReport {
    /// Wait until every catch-up retrain launched by the resync has finished
    pub async fn wait_for_catch_up(self) {
        for result in join_all(self.catch_up).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "Catch-up task panicked");
                }
            }
        }
    }
}

/// Scheduler owning every periodic retrain job.
///
/// `resync` takes `&mut self`: a resync replaces the whole job set and must
/// not interleave with another.
#[derive(Debug, Default)]
pub struct RetrainScheduler {
    jobs: JobRegistry,
}

impl RetrainScheduler {
    pub fn new(jobs: JobRegistry) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    /// Replace every retrain job with one per model that declares a cadence.
    ///
    /// Models behind schedule get an immediate catch-up retrain spawned in the
    /// background; its failure is logged and never blocks registration.
    pub fn resync(
        &mut self,
        models: Vec<ScheduledModel>,
        on_due: RetrainTrigger,
        timezone: &str,
        schedule_override: Option<ScheduleTable>,
    ) -> Result<ResyncReport, DomainError> {
        let tz = parse_timezone(timezone)?;
        let table = schedule_override.unwrap_or_default();
        let now = Utc::now();

        let removed = self.jobs.remove_with_prefix(JOB_PREFIX);
        info!(removed, "Cleared retrain jobs");

        let mut report = ResyncReport::default();

        for model in models {
            let Some(cadence) = model.cadence else {
                continue;
            };

            let (expression, cron) = match table
                .expression_for(cadence)
                .and_then(|expression| Ok((expression.to_string(), parse_cron(expression)?)))
            {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(model = %model.name, cadence = %cadence, error = %e, "Cannot schedule model");
                    report.skipped.push((model.name, e));
                    continue;
                }
            };

            match is_due_at(cadence, &table, model.last_run, timezone, now) {
                Ok(true) => {
                    info!(model = %model.name, last_run = ?model.last_run, "Model behind schedule, catching up");
                    report
                        .catch_up
                        .push(spawn_catch_up(model.name.clone(), Arc::clone(&on_due)));
                }
                Ok(false) => debug!(model = %model.name, "Model on schedule"),
                Err(e) => warn!(model = %model.name, error = %e, "Failed to evaluate catch-up"),
            }

            let key = job_key(&model.name);
            let handle = tokio::spawn(run_periodic(
                model.name.clone(),
                cron,
                expression.clone(),
                tz,
                Arc::clone(&on_due),
            ));

            info!(model = %model.name, cron = %expression, timezone = %tz, "Registered retrain job");
            self.jobs.add(ScheduledJob {
                key: key.clone(),
                cron_expression: expression,
                timezone: tz,
                handle,
            });
            report.scheduled.push(key);
        }

        record_scheduled_jobs(self.jobs.len());

        Ok(report)
    }
}

async fn fire(name: String, on_due: &RetrainTrigger, reason: TriggerReason) {
    record_retrain_trigger(&name, reason);

    if let Err(e) = on_due(name.clone()).await {
        if e.is_skip() {
            info!(model = %name, reason = %e, "Retrain skipped");
        } else {
            warn!(model = %name, error = %e, "Retrain failed");
            record_retrain_failure(&name);
        }
    }
}

fn spawn_catch_up(name: String, on_due: RetrainTrigger) -> JoinHandle<()> {
    tokio::spawn(async move { fire(name, &on_due, TriggerReason::CatchUp).await })
}

async fn run_periodic(
    name: String,
    cron: Cron,
    expression: String,
    timezone: Tz,
    on_due: RetrainTrigger,
) {
    let mut after = Utc::now();

    loop {
        let next = match next_fire(&cron, &expression, timezone, after) {
            Ok(next) => next.with_timezone(&Utc),
            Err(e) => {
                warn!(model = %name, error = %e, "Retrain job has no next fire time, stopping");
                return;
            }
        };

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        debug!(model = %name, next_fire = %next, "Waiting for next retrain");
        tokio::time::sleep(wait).await;

        fire(name.clone(), &on_due, TriggerReason::Scheduled).await;
        after = resume_after(next, Utc::now());
    }
}

/// Where to look for the next fire time once a run for `fired` has finished.
///
/// Slots that passed while the run was in progress are skipped.
fn resume_after(fired: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    fired.max(now)
}
