//! TOML-based application configuration.
//!
//! Stores the tunables of the planner:
//! - Pomodoro lengths and long-break cadence
//! - Per-task packing window and force-placement slot
//! - Auto-schedule horizon and daily cap
//! - Scoring strategy and daily minute budget
//!
//! Configuration is stored at `~/.config/studyflow/config.toml`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::packer::PackerConfig;
use crate::priority::ScoringStrategy;
use crate::scheduler::SchedulerConfig;

/// Pomodoro cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

/// Per-task packing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackerSection {
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_day_end")]
    pub day_end: String,
    #[serde(default = "default_15")]
    pub scan_step_minutes: u32,
    #[serde(default = "default_max_chain")]
    pub max_chain: u32,
    #[serde(default = "default_30")]
    pub realign_minutes: u32,
    #[serde(default = "default_force_start")]
    pub force_start: String,
    #[serde(default = "default_probe_minutes")]
    pub probe_minutes: u32,
    #[serde(default = "default_attempts_per_session")]
    pub attempts_per_session: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScheduleSection {
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_30")]
    pub slot_step_minutes: u32,
    #[serde(default = "default_max_sessions_per_day")]
    pub max_sessions_per_day: u32,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrioritySection {
    #[serde(default)]
    pub strategy: ScoringStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySection {
    #[serde(default = "default_max_daily_minutes")]
    pub max_daily_minutes: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub packer: PackerSection,
    #[serde(default)]
    pub auto_schedule: AutoScheduleSection,
    #[serde(default)]
    pub priority: PrioritySection,
    #[serde(default)]
    pub daily: DailySection,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_day_start() -> String {
    "08:00".to_string()
}
fn default_day_end() -> String {
    "20:00".to_string()
}
fn default_force_start() -> String {
    "21:00".to_string()
}
fn default_15() -> u32 {
    15
}
fn default_30() -> u32 {
    30
}
fn default_max_chain() -> u32 {
    3
}
fn default_probe_minutes() -> u32 {
    5
}
fn default_attempts_per_session() -> u32 {
    4
}
fn default_max_sessions_per_day() -> u32 {
    8
}
fn default_horizon_days() -> u32 {
    7
}
fn default_max_daily_minutes() -> u32 {
    crate::daily::DEFAULT_MAX_DAILY_MINUTES
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl Default for PackerSection {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            scan_step_minutes: default_15(),
            max_chain: default_max_chain(),
            realign_minutes: default_30(),
            force_start: default_force_start(),
            probe_minutes: default_probe_minutes(),
            attempts_per_session: default_attempts_per_session(),
        }
    }
}

impl Default for AutoScheduleSection {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            slot_step_minutes: default_30(),
            max_sessions_per_day: default_max_sessions_per_day(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl Default for DailySection {
    fn default() -> Self {
        Self {
            max_daily_minutes: default_max_daily_minutes(),
        }
    }
}

/// Parse an "HH:MM" clock time.
pub fn parse_clock_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected HH:MM, got '{value}' ({e})"),
    })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("key names a section, not a value".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every dotted key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(serde_json::Value::Object(sections)) = serde_json::to_value(self) {
            for (section, fields) in sections {
                if let serde_json::Value::Object(fields) = fields {
                    for (name, value) in fields {
                        let rendered = match value {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        out.push((format!("{section}.{name}"), rendered));
                    }
                }
            }
        }
        out
    }

    /// Check the clock times and that lengths and steps are non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.packer_config()?;
        self.scheduler_config()?;
        let positive = [
            ("pomodoro.focus_minutes", self.pomodoro.focus_minutes),
            ("pomodoro.sessions_before_long_break", self.pomodoro.sessions_before_long_break),
            ("packer.scan_step_minutes", self.packer.scan_step_minutes),
            ("packer.max_chain", self.packer.max_chain),
            ("packer.realign_minutes", self.packer.realign_minutes),
            ("packer.probe_minutes", self.packer.probe_minutes),
            ("packer.attempts_per_session", self.packer.attempts_per_session),
            ("auto_schedule.slot_step_minutes", self.auto_schedule.slot_step_minutes),
            ("auto_schedule.max_sessions_per_day", self.auto_schedule.max_sessions_per_day),
            ("auto_schedule.horizon_days", self.auto_schedule.horizon_days),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn packer_config(&self) -> Result<PackerConfig, ConfigError> {
        let day_start = parse_clock_time("packer.day_start", &self.packer.day_start)?;
        let day_end = parse_clock_time("packer.day_end", &self.packer.day_end)?;
        if day_end <= day_start {
            return Err(ConfigError::InvalidValue {
                key: "packer.day_end".to_string(),
                message: format!("must be after packer.day_start ({})", self.packer.day_start),
            });
        }
        Ok(PackerConfig {
            focus_minutes: self.pomodoro.focus_minutes,
            short_break_minutes: self.pomodoro.short_break_minutes,
            day_start,
            day_end,
            scan_step_minutes: self.packer.scan_step_minutes,
            max_chain: self.packer.max_chain,
            realign_minutes: self.packer.realign_minutes,
            force_start: parse_clock_time("packer.force_start", &self.packer.force_start)?,
            probe_minutes: self.packer.probe_minutes,
            attempts_per_session: self.packer.attempts_per_session,
        })
    }

    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        Ok(SchedulerConfig {
            focus_minutes: self.pomodoro.focus_minutes,
            short_break_minutes: self.pomodoro.short_break_minutes,
            long_break_minutes: self.pomodoro.long_break_minutes,
            sessions_before_long_break: self.pomodoro.sessions_before_long_break,
            day_start: parse_clock_time("auto_schedule.day_start", &self.auto_schedule.day_start)?,
            slot_step_minutes: self.auto_schedule.slot_step_minutes,
            max_sessions_per_day: self.auto_schedule.max_sessions_per_day,
            horizon_days: self.auto_schedule.horizon_days,
            probe_minutes: self.packer.probe_minutes,
            strategy: self.priority.strategy,
        })
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.priority.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.packer.day_start, "08:00");
        assert_eq!(parsed.daily.max_daily_minutes, 240);
    }

    #[test]
    fn missing_sections_load_as_defaults() {
        let parsed: Config = toml::from_str("[packer]\nmax_chain = 2\n").unwrap();
        assert_eq!(parsed.packer.max_chain, 2);
        assert_eq!(parsed.packer.scan_step_minutes, 15);
        assert_eq!(parsed.auto_schedule.max_sessions_per_day, 8);
        assert_eq!(parsed.priority.strategy, ScoringStrategy::Extended);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("packer.force_start").as_deref(), Some("21:00"));
        assert_eq!(cfg.get("pomodoro.focus_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("priority.strategy").as_deref(), Some("extended"));
        assert!(cfg.get("packer.missing_key").is_none());
        assert!(cfg.get("packer").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("auto_schedule.horizon_days", "14").unwrap();
        cfg.set("priority.strategy", "normalized").unwrap();
        assert_eq!(cfg.auto_schedule.horizon_days, 14);
        assert_eq!(cfg.strategy(), ScoringStrategy::Normalized);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("packer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("packer.max_chain", "three"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("packer.day_end", "25:00"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("priority.strategy", "fancy"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("packer.day_end", "07:00"),
            Err(ConfigError::InvalidValue { .. })
        ));
        // Failed sets leave the config untouched.
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn converts_into_algorithm_configs() {
        let mut cfg = Config::default();
        cfg.set("packer.day_start", "09:30").unwrap();
        let packer = cfg.packer_config().unwrap();
        assert_eq!(packer.day_start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(packer.force_start, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(packer.max_chain, 3);

        let scheduler = cfg.scheduler_config().unwrap();
        assert_eq!(scheduler, SchedulerConfig::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg, Config::default());

        let mut changed = cfg.clone();
        changed.set("daily.max_daily_minutes", "90").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().daily.max_daily_minutes, 90);
    }

    #[test]
    fn entries_list_every_key() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("packer.max_chain".to_string(), "3".to_string())));
        assert!(entries.contains(&("daily.max_daily_minutes".to_string(), "240".to_string())));
    }
}
