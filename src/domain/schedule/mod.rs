//! Schedule domain - Retrain cadences, cron tables and the catch-up predicate

mod cadence;
mod due;

pub use cadence::{RetrainCadence, ScheduleTable};
pub use due::{
    is_due_at, is_due_now, next_fire, parse_cron, parse_timezone, CATCH_UP_TOLERANCE_MINUTES,
};
