//! Workday-aware recurring trigger.

pub mod scheduler;
pub mod window;

pub use scheduler::{run_tick, ScheduleConfig, ScheduledJob, Scheduler, TickOutcome, Trigger};
pub use window::TimeWindow;
