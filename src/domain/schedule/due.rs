//! Catch-up predicate: is a model behind its retrain schedule?

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use croner::Cron;

use super::cadence::{RetrainCadence, ScheduleTable};
use crate::domain::DomainError;

/// Runs finishing this close before the period's slot still count for it
pub const CATCH_UP_TOLERANCE_MINUTES: i64 = 20;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, DomainError> {
    timezone
        .parse::<Tz>()
        .map_err(|e| DomainError::configuration(format!("Invalid timezone '{}': {}", timezone, e)))
}

/// Parse a five-field cron expression
pub fn parse_cron(expression: &str) -> Result<Cron, DomainError> {
    Cron::new(expression)
        .parse()
        .map_err(|e| DomainError::invalid_cron(expression, e.to_string()))
}

/// Next fire time of `cron` strictly after `after`, evaluated in `timezone`
pub fn next_fire(
    cron: &Cron,
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Tz>, DomainError> {
    cron.find_next_occurrence(&after.with_timezone(&timezone), false)
        .map_err(|e| DomainError::invalid_cron(expression, e.to_string()))
}

/// Whether a model with the given cadence and last successful run is due for
/// an immediate catch-up retrain at `now`.
///
/// The current period's slot is the next fire time stepped back by one
/// cadence unit. The model is due when its last run is not after that slot
/// minus [`CATCH_UP_TOLERANCE_MINUTES`]. A model that has never run is never due.
pub fn is_due_at(
    cadence: RetrainCadence,
    table: &ScheduleTable,
    last_run: Option<DateTime<Utc>>,
    timezone: &str,
    now: DateTime<Utc>,
) -> Result<bool, DomainError> {
    let expression = table.expression_for(cadence)?;
    let cron = parse_cron(expression)?;
    let tz = parse_timezone(timezone)?;

    let Some(last_run) = last_run else {
        return Ok(false);
    };

    let next = next_fire(&cron, expression, tz, now)?;
    let anchor = cadence.step_back(&next).ok_or_else(|| {
        DomainError::invalid_cron(expression, format!("cannot step back one {} unit", cadence))
    })?;
    let buffered = anchor - Duration::minutes(CATCH_UP_TOLERANCE_MINUTES);

    tracing::debug!(
        cadence = %cadence,
        last_run = %last_run.with_timezone(&tz),
        next_fire = %next,
        anchor = %anchor,
        "Evaluated catch-up window"
    );

    Ok(last_run.with_timezone(&tz) <= buffered)
}

/// [`is_due_at`] evaluated against the current instant
pub fn is_due_now(
    cadence: RetrainCadence,
    table: &ScheduleTable,
    last_run: Option<DateTime<Utc>>,
    timezone: &str,
) -> Result<bool, DomainError> {
    is_due_at(cadence, table, last_run, timezone, Utc::now())
}
