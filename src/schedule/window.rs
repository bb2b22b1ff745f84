use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Workday gate applied to every scheduler tick.
///
/// A tick is allowed on Monday through Friday when the local hour, in the
/// configured zone, lies in `[start_hour, end_hour)`. Windows crossing
/// midnight are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub time_zone: Tz,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeWindow {
    pub fn new(time_zone: Tz, start_hour: u32, end_hour: u32) -> Self {
        Self {
            time_zone,
            start_hour,
            end_hour,
        }
    }

    pub fn allows(&self, now: DateTime<Utc>) -> bool {
        allowed(now, self.time_zone, self.start_hour, self.end_hour)
    }
}

pub fn allowed(now: DateTime<Utc>, time_zone: Tz, start_hour: u32, end_hour: u32) -> bool {
    let local = time_zone.from_utc_datetime(&now.naive_utc());
    is_workday(local.weekday()) && start_hour <= local.hour() && local.hour() < end_hour
}

fn is_workday(day: Weekday) -> bool {
    !matches!(day, Weekday::Sat | Weekday::Sun)
}
