//! Subcommand implementations and the helpers they share.

pub mod block;
pub mod config;
pub mod schedule;
pub mod task;
pub mod today;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use studyflow_core::{Clock, FixedClock, SystemClock};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Pins "now" for scripted runs, e.g. `STUDYFLOW_NOW="2026-03-02 08:00"`.
pub const NOW_ENV: &str = "STUDYFLOW_NOW";

/// System time, or the instant named by `STUDYFLOW_NOW`.
pub enum CliClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for CliClock {
    fn now(&self) -> NaiveDateTime {
        match self {
            CliClock::System(clock) => clock.now(),
            CliClock::Fixed(clock) => clock.now(),
        }
    }
}

pub fn clock() -> CliResult<CliClock> {
    match std::env::var(NOW_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            let now = parse_datetime(&value, NaiveTime::MIN)?;
            tracing::debug!(%now, "clock pinned by {NOW_ENV}");
            Ok(CliClock::Fixed(FixedClock::new(now)))
        }
        _ => Ok(CliClock::System(SystemClock)),
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM`.
/// A bare date takes `default_time`.
pub fn parse_datetime(value: &str, default_time: NaiveTime) -> CliResult<NaiveDateTime> {
    let value = value.trim();
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}': expected YYYY-MM-DD [HH:MM]"))?;
    Ok(date.and_time(default_time))
}

/// Due dates without a time mean the end of that day.
pub fn parse_due(value: &str) -> CliResult<NaiveDateTime> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
    parse_datetime(value, end_of_day)
}

/// `HH:MM`, with `24:00` allowed as an end-of-day marker.
pub fn parse_clock(value: &str) -> CliResult<(u32, u32)> {
    let (h, m) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("invalid time '{value}': expected HH:MM"))?;
    let hour: u32 = h.parse().map_err(|_| format!("invalid hour in '{value}'"))?;
    let minute: u32 = m.parse().map_err(|_| format!("invalid minute in '{value}'"))?;
    Ok((hour, minute))
}

const WEEKDAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// `0`-`6` (Sunday first) or a weekday name such as `mon` or `Monday`.
pub fn parse_weekday(value: &str) -> CliResult<u8> {
    let value = value.trim().to_ascii_lowercase();
    if let Ok(n) = value.parse::<u8>() {
        return Ok(n);
    }
    WEEKDAYS
        .iter()
        .position(|d| value.starts_with(d))
        .map(|i| i as u8)
        .ok_or_else(|| format!("invalid weekday '{value}'").into())
}

pub fn weekday_name(day_of_week: u8) -> &'static str {
    WEEKDAYS.get(day_of_week as usize).copied().unwrap_or("?")
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
