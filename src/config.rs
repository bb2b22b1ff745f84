use chrono::NaiveTime;
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{NotifierError, Result};
use crate::schedule::{ScheduleConfig, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub gitlab_url: String,
    pub gitlab_timeout_secs: u64,
    pub log_level: String,
    pub log_mode: String,
    pub time_zone: String,
    pub workday_start_at_hour: u32,
    pub workday_end_at_hour: u32,
    pub scheduler_interval_minutes: u64,
    pub scheduler_fixed_times: String,
    pub discussion_page_limit: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::default().try_parsing(false))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .set_default("database_url", "sqlite://notifier.db?mode=rwc")?
            .set_default("gitlab_url", "")?
            .set_default("gitlab_timeout_secs", "30")?
            .set_default("log_level", "info")?
            .set_default("log_mode", "pretty")?
            .set_default("time_zone", "UTC")?
            .set_default("workday_start_at_hour", "10")?
            .set_default("workday_end_at_hour", "19")?
            .set_default("scheduler_interval_minutes", "0")?
            .set_default("scheduler_fixed_times", "")?
            .set_default("discussion_page_limit", "50")?
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", "8080")?
            .add_source(source)
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gitlab_url.trim().is_empty() {
            return Err(NotifierError::Config("GITLAB_URL is not set".to_string()));
        }

        self.time_zone()?;
        self.log_mode()?;

        if self.workday_end_at_hour > 24 || self.workday_start_at_hour > 24 {
            return Err(NotifierError::Config(format!(
                "workday hours must be within 0..=24, got {}..{}",
                self.workday_start_at_hour, self.workday_end_at_hour
            )));
        }

        if self.workday_start_at_hour > self.workday_end_at_hour {
            return Err(NotifierError::Config(format!(
                "workday start ({}) is after workday end ({})",
                self.workday_start_at_hour, self.workday_end_at_hour
            )));
        }

        if self.discussion_page_limit == 0 {
            return Err(NotifierError::Config(
                "DISCUSSION_PAGE_LIMIT must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn time_zone(&self) -> Result<Tz> {
        self.time_zone.parse::<Tz>().map_err(|e| {
            NotifierError::Config(format!("parse time zone {}: {}", self.time_zone, e))
        })
    }

    pub fn log_mode(&self) -> Result<LogMode> {
        match self.log_mode.to_lowercase().as_str() {
            "" | "pretty" => Ok(LogMode::Pretty),
            "json" => Ok(LogMode::Json),
            other => Err(NotifierError::Config(format!(
                "{} is not a valid log mode: pretty or json",
                other
            ))),
        }
    }

    /// Fixed trigger times, split on spaces, commas and semicolons.
    pub fn fixed_times(&self) -> Vec<String> {
        split_fixed_times(&self.scheduler_fixed_times)
    }

    pub fn schedule(&self) -> Result<ScheduleConfig> {
        Ok(ScheduleConfig {
            interval_minutes: self.scheduler_interval_minutes,
            fixed_times: self.fixed_times(),
            window: TimeWindow::new(
                self.time_zone()?,
                self.workday_start_at_hour,
                self.workday_end_at_hour,
            ),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn split_fixed_times(raw: &str) -> Vec<String> {
    // The pattern is a literal character class, it always compiles.
    let separators = match Regex::new(r"[ ;,]") {
        Ok(re) => re,
        Err(_) => return vec![raw.to_string()],
    };
    separators
        .split(raw)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| NotifierError::Schedule(format!("invalid time of day {:?}: {}", raw, e)))
}
