//! Retrain cadence classes and their cron schedule table

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, Months, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// How often a model is retrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrainCadence {
    Monthly,
    Weekly,
    Daily,
    Hourly,
}

impl RetrainCadence {
    pub const ALL: [RetrainCadence; 4] = [Self::Monthly, Self::Weekly, Self::Daily, Self::Hourly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }

    /// Default cron expression for this cadence
    pub fn default_expression(&self) -> &'static str {
        match self {
            Self::Monthly => "0 4 1 * *",
            Self::Weekly => "0 4 * * 0",
            Self::Daily => "0 4 * * *",
            Self::Hourly => "0 * * * *",
        }
    }

    /// Step a fire time back by exactly one cadence unit.
    ///
    /// Calendar units (month, week, day) keep the local wall-clock time in the
    /// given zone; the hourly step is an absolute hour. A wall-clock time that
    /// falls in a DST gap resolves to the end of the gap.
    pub fn step_back<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local = at.naive_local();
        let stepped = match self {
            Self::Monthly => local.checked_sub_months(Months::new(1)),
            Self::Weekly => local.checked_sub_days(Days::new(7)),
            Self::Daily => local.checked_sub_days(Days::new(1)),
            Self::Hourly => return at.clone().checked_sub_signed(Duration::hours(1)),
        }?;

        resolve_local(&at.timezone(), stepped)
    }
}

/// Longest DST gap searched when resolving a skipped wall-clock time
const MAX_GAP_MINUTES: i64 = 180;

/// Map a wall-clock time to an instant: the earlier one when ambiguous, the
/// first existing minute after a gap
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
        return Some(resolved);
    }

    (1..=MAX_GAP_MINUTES).find_map(|minutes| {
        tz.from_local_datetime(&(local + Duration::minutes(minutes)))
            .earliest()
    })
}

impl fmt::Display for RetrainCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RetrainCadence {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            _ => Err(DomainError::invalid_cadence(s)),
        }
    }
}

/// Mapping from cadence class to cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    entries: HashMap<RetrainCadence, String>,
}

impl Default for ScheduleTable {
    fn default() -> Self {
        let entries = RetrainCadence::ALL
            .iter()
            .map(|cadence| (*cadence, cadence.default_expression().to_string()))
            .collect();

        Self { entries }
    }
}

impl ScheduleTable {
    /// A table with no expressions at all
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, cadence: RetrainCadence, expression: impl Into<String>) -> Self {
        self.entries.insert(cadence, expression.into());
        self
    }

    pub fn get(&self, cadence: RetrainCadence) -> Option<&str> {
        self.entries.get(&cadence).map(String::as_str)
    }

    /// Resolve the expression for a cadence, failing when it is missing or blank
    pub fn expression_for(&self, cadence: RetrainCadence) -> Result<&str, DomainError> {
        match self.get(cadence) {
            Some(expression) if !expression.trim().is_empty() => Ok(expression),
            _ => Err(DomainError::invalid_cadence(cadence.as_str())),
        }
    }

    /// Overlay the given entries on top of this table
    pub fn merged_with<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (RetrainCadence, String)>,
    {
        self.entries.extend(overrides);
        self
    }
}
