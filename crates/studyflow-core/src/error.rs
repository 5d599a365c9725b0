//! Core error types for studyflow-core.
//!
//! Every failure here is local and recoverable: validation errors are raised
//! at the boundary (task and block creation), scheduling errors are reported
//! to the caller, and force-placement is a warning value, not an error.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for studyflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Scheduling errors
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors raised when tasks or unavailable blocks are created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Block end is not after its start
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange { start: String, end: String },

    /// Block overlaps another block on the same weekday
    #[error("Unavailable block overlaps existing block '{existing_id}' on day {day_of_week}")]
    OverlappingBlock { existing_id: String, day_of_week: u8 },

    #[error("Invalid day of week {0}: expected 0 (Sunday) through 6 (Saturday)")]
    InvalidDayOfWeek(u8),

    #[error("Invalid clock time {hour:02}:{minute:02}")]
    InvalidClockTime { hour: u32, minute: u32 },

    /// Duration must be positive when given
    #[error("Invalid duration: {0} minutes (must be greater than zero)")]
    InvalidDuration(u32),

    /// Multi-day tasks need a due date to spread sessions over
    #[error("Task '{0}' is multi-day but has no due date")]
    MissingDueDate(String),

    #[error("Task '{0}' is multi-day but has no duration estimate")]
    MissingDuration(String),

    #[error("Task name must not be empty")]
    EmptyName,

    #[error("Session '{session_id}' does not belong to task '{task_id}'")]
    UnknownSession { task_id: String, session_id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Scheduling failures reported by the auto scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No incomplete tasks were given
    #[error("No incomplete tasks to schedule")]
    NoTasksToSchedule,

    /// Not a single session could be placed within the horizon
    #[error("Scheduling failed: no session could be placed for {task_count} task(s) within {horizon_days} day(s)")]
    SchedulingExhausted { task_count: usize, horizon_days: u32 },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Non-fatal notice that some sessions were force-placed outside normal hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingWarning {
    pub task_id: String,
    pub day: NaiveDate,
    /// Sessions placed at the late-evening fallback slot, ignoring availability.
    pub forced_sessions: u32,
}

impl std::fmt::Display for SchedulingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} on {}: {} session(s) force-placed outside available hours",
            self.task_id, self.day, self.forced_sessions
        )
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
