//! Recurring trigger for the firing job.
//!
//! Two trigger modes exist: a fixed interval in minutes, aligned on whole
//! interval boundaries, or one daily trigger per configured time of day.
//! Every tick passes through the [`TimeWindow`] before the job body runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::parse_time_of_day;
use crate::error::{NotifierError, Result};
use crate::schedule::window::TimeWindow;

/// Body executed on every allowed tick.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    fn name(&self) -> &str {
        "job"
    }

    async fn run(&self);
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Zero means no interval trigger.
    pub interval_minutes: u64,
    pub fixed_times: Vec<String>,
    pub window: TimeWindow,
}

impl ScheduleConfig {
    /// Resolves the configured triggers. Interval mode wins when both modes
    /// are configured; no mode at all yields no trigger.
    pub fn triggers(&self) -> Result<Vec<Trigger>> {
        if self.interval_minutes != 0 {
            return Ok(vec![Trigger::Interval {
                minutes: self.interval_minutes,
            }]);
        }

        self.fixed_times
            .iter()
            .map(|raw| parse_time_of_day(raw).map(|at| Trigger::Daily { at }))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Interval { minutes: u64 },
    Daily { at: NaiveTime },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Interval { minutes } => write!(f, "every {}m", minutes),
            Trigger::Daily { at } => write!(f, "daily at {}", at.format("%H:%M:%S")),
        }
    }
}

impl Trigger {
    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>, time_zone: Tz) -> DateTime<Utc> {
        match *self {
            Trigger::Interval { minutes } => next_interval_boundary(now, minutes),
            Trigger::Daily { at } => next_daily(now, at, time_zone),
        }
    }
}

fn next_interval_boundary(now: DateTime<Utc>, minutes: u64) -> DateTime<Utc> {
    let step = (minutes.max(1) * 60) as i64;
    let next = (now.timestamp().div_euclid(step) + 1) * step;
    DateTime::from_timestamp(next, 0).unwrap_or_else(|| now + Duration::seconds(step))
}

fn next_daily(now: DateTime<Utc>, at: NaiveTime, time_zone: Tz) -> DateTime<Utc> {
    let mut date = time_zone.from_utc_datetime(&now.naive_utc()).date_naive();

    // A local time skipped by a DST transition moves to the next day it exists.
    for _ in 0..8 {
        if let Some(candidate) = time_zone.from_local_datetime(&date.and_time(at)).earliest() {
            let candidate = candidate.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    now + Duration::days(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outside the workday window, the job body did not run.
    Suppressed,
    Completed,
    /// The job body panicked; the trigger keeps running.
    Failed,
}

/// Gates one tick through the window and runs the job to completion.
pub async fn run_tick(
    window: &TimeWindow,
    job: Arc<dyn ScheduledJob>,
    now: DateTime<Utc>,
) -> TickOutcome {
    if !window.allows(now) {
        debug!("Tick at {} is outside the workday window, skipping {}", now, job.name());
        return TickOutcome::Suppressed;
    }

    let name = job.name().to_string();
    match tokio::spawn(async move { job.run().await }).await {
        Ok(()) => TickOutcome::Completed,
        Err(e) => {
            error!("Scheduled job {} failed: {}", name, e);
            TickOutcome::Failed
        }
    }
}

/// Source of the current time for trigger arithmetic.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct Entry {
    trigger: Trigger,
    job: Arc<dyn ScheduledJob>,
}

pub struct Scheduler {
    config: ScheduleConfig,
    entries: Vec<Entry>,
    handles: Vec<JoinHandle<()>>,
    clock: Clock,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            handles: Vec::new(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Registers `job` on every configured trigger. Invalid trigger
    /// configuration fails here, before any tick can occur.
    pub fn submit(&mut self, job: Arc<dyn ScheduledJob>) -> Result<()> {
        let triggers = self.config.triggers()?;
        if triggers.is_empty() {
            warn!("No scheduler trigger configured, {} will never run", job.name());
        }

        for trigger in triggers {
            info!("Submitted {} {}", job.name(), trigger);
            self.entries.push(Entry {
                trigger,
                job: job.clone(),
            });
        }
        Ok(())
    }

    pub fn is_armed(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Spawns one timer task per submitted trigger.
    pub fn start(&mut self) -> Result<()> {
        if !self.handles.is_empty() {
            return Err(NotifierError::Schedule("scheduler already started".to_string()));
        }

        for entry in &self.entries {
            let trigger = entry.trigger;
            let job = entry.job.clone();
            let window = self.config.window;
            let clock = self.clock.clone();
            self.handles
                .push(tokio::spawn(drive_trigger(trigger, window, job, clock)));
        }
        Ok(())
    }

    /// Runs until the process receives ctrl-c.
    pub async fn run(mut self) -> Result<()> {
        self.start()?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }

        info!("Scheduler shutting down");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        Ok(())
    }
}

/// Runs one trigger forever. The job is awaited before the next fire time
/// is computed, so a trigger never overlaps itself and boundaries passed
/// during a long run are skipped.
async fn drive_trigger(
    trigger: Trigger,
    window: TimeWindow,
    job: Arc<dyn ScheduledJob>,
    clock: Clock,
) {
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        let now = clock();
        let from = last_fire.map_or(now, |last| last.max(now));
        let next = trigger.next_after(from, window.time_zone);
        debug!("Next tick for {} ({}) at {}", job.name(), trigger, next);

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        last_fire = Some(next);

        // Gate on the scheduled instant unless the wall clock is already past it.
        run_tick(&window, job.clone(), next.max(clock())).await;
    }
}
