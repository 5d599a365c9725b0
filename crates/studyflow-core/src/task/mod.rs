//! Task types for study planning.
//!
//! A task owns its pomodoro sessions; sessions have no lifecycle of their own
//! and are discarded together with the task or when it is regenerated.

pub mod session;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use session::{PomodoroSession, SessionKind};

/// Length of one work session, in minutes.
pub const FOCUS_MINUTES: u32 = 25;

/// Work minutes that push a multi-day task's start one more day ahead of its due date.
pub const MINUTES_PER_LEAD_DAY: u32 = 120;

/// How hard a task is to work through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Pomodoro count used when a task carries no duration estimate.
    pub fn pomodoro_multiplier(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 4,
        }
    }

    /// Duration re-estimated when only the difficulty of a task changes.
    pub fn default_duration_minutes(&self) -> u32 {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Medium => 60,
            Difficulty::Hard => 120,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ValidationError::InvalidValue {
                field: "difficulty".to_string(),
                message: format!("expected easy, medium or hard, got '{other}'"),
            }),
        }
    }
}

/// Whether a task is done in one sitting or spread over several days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    OneTime,
    MultiDay,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::OneTime
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::OneTime => write!(f, "one-time"),
            TaskType::MultiDay => write!(f, "multi-day"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "one-time" | "onetime" | "one_time" => Ok(TaskType::OneTime),
            "multi-day" | "multiday" | "multi_day" => Ok(TaskType::MultiDay),
            other => Err(ValidationError::InvalidValue {
                field: "task_type".to_string(),
                message: format!("expected one-time or multi-day, got '{other}'"),
            }),
        }
    }
}

/// Coarse urgency tier derived from due-date proximity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Low
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

/// A study task together with the sessions planned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    /// Estimated total work in minutes.
    pub duration_minutes: Option<u32>,
    pub task_type: TaskType,
    pub due_date: Option<NaiveDateTime>,
    /// Derived for multi-day tasks from due date and duration.
    pub start_date: Option<NaiveDate>,
    /// Derived from the due date; refreshed daily.
    pub urgency: Urgency,
    pub completed: bool,
    #[serde(default)]
    pub sessions: Vec<PomodoroSession>,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Number of work sessions this task needs.
    ///
    /// Falls back to the difficulty multiplier when no duration is estimated.
    pub fn pomodoros_needed(&self) -> u32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => pomodoros_for(minutes),
            _ => self.difficulty.pomodoro_multiplier(),
        }
    }

    /// Work sessions needed when each lasts `focus_minutes`.
    pub fn sessions_needed(&self, focus_minutes: u32) -> u32 {
        self.effective_minutes().div_ceil(focus_minutes.max(1))
    }

    /// Duration estimate, or the fallback pomodoro count expressed in minutes.
    pub fn effective_minutes(&self) -> u32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => self.difficulty.pomodoro_multiplier() * FOCUS_MINUTES,
        }
    }

    pub fn is_multi_day(&self) -> bool {
        self.task_type == TaskType::MultiDay
    }

    /// Work sessions only, in time order.
    pub fn work_sessions(&self) -> impl Iterator<Item = &PomodoroSession> {
        self.sessions.iter().filter(|s| !s.is_break())
    }

    /// (completed work sessions, total work sessions)
    pub fn progress(&self) -> (usize, usize) {
        let total = self.work_sessions().count();
        let done = self.work_sessions().filter(|s| s.completed).count();
        (done, total)
    }

    /// Minutes of incomplete work sessions starting on `day`.
    pub fn open_session_minutes_on(&self, day: NaiveDate) -> i64 {
        self.work_sessions()
            .filter(|s| !s.completed && s.start_time.date() == day)
            .map(|s| s.duration_minutes())
            .sum()
    }
}

/// `ceil(minutes / 25)`
pub fn pomodoros_for(minutes: u32) -> u32 {
    minutes.div_ceil(FOCUS_MINUTES)
}

/// Start date of a multi-day task: `due - max(1, ceil(duration / 120))` days.
pub fn derive_start_date(due: NaiveDateTime, duration_minutes: u32) -> NaiveDate {
    let lead_days = duration_minutes.div_ceil(MINUTES_PER_LEAD_DAY).max(1);
    due.date() - Duration::days(i64::from(lead_days))
}

/// User input for a new task, validated before anything is scheduled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub task_type: TaskType,
    pub due_date: Option<NaiveDateTime>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_due(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn multi_day(mut self) -> Self {
        self.task_type = TaskType::MultiDay;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Boundary checks; the scheduler assumes these hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(0) = self.duration_minutes {
            return Err(ValidationError::InvalidDuration(0));
        }
        if self.task_type == TaskType::MultiDay {
            if self.due_date.is_none() {
                return Err(ValidationError::MissingDueDate(self.name.clone()));
            }
            if self.duration_minutes.is_none() {
                return Err(ValidationError::MissingDuration(self.name.clone()));
            }
        }
        Ok(())
    }
}

/// Partial update to an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub duration_minutes: Option<u32>,
    pub task_type: Option<TaskType>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDateTime>>,
}

impl TaskPatch {
    /// Whether applying this patch invalidates the task's planned sessions.
    pub fn reshapes_schedule(&self) -> bool {
        self.difficulty.is_some()
            || self.duration_minutes.is_some()
            || self.task_type.is_some()
            || self.due_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn task(duration: Option<u32>, difficulty: Difficulty) -> Task {
        Task {
            id: "t".to_string(),
            name: "Read chapter".to_string(),
            description: String::new(),
            difficulty,
            duration_minutes: duration,
            task_type: TaskType::OneTime,
            due_date: None,
            start_date: None,
            urgency: Urgency::Low,
            completed: false,
            sessions: Vec::new(),
            created_at: at(2026, 3, 1, 9, 0),
        }
    }

    #[test]
    fn pomodoros_round_up() {
        assert_eq!(pomodoros_for(120), 5);
        assert_eq!(pomodoros_for(25), 1);
        assert_eq!(pomodoros_for(26), 2);
        assert_eq!(pomodoros_for(1), 1);
    }

    #[test]
    fn pomodoros_fall_back_to_difficulty() {
        assert_eq!(task(None, Difficulty::Easy).pomodoros_needed(), 1);
        assert_eq!(task(None, Difficulty::Medium).pomodoros_needed(), 2);
        assert_eq!(task(None, Difficulty::Hard).pomodoros_needed(), 4);
        assert_eq!(task(Some(50), Difficulty::Hard).pomodoros_needed(), 2);
        assert_eq!(task(None, Difficulty::Hard).effective_minutes(), 100);
    }

    #[test]
    fn sessions_needed_follows_focus_length() {
        assert_eq!(task(Some(100), Difficulty::Medium).sessions_needed(25), 4);
        assert_eq!(task(Some(100), Difficulty::Medium).sessions_needed(50), 2);
        assert_eq!(task(Some(101), Difficulty::Medium).sessions_needed(50), 3);
        assert_eq!(task(None, Difficulty::Hard).sessions_needed(50), 2);
    }

    #[test]
    fn start_date_leads_due_by_work_days() {
        let due = at(2026, 3, 10, 17, 0);
        assert_eq!(derive_start_date(due, 120), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(derive_start_date(due, 121), NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert_eq!(derive_start_date(due, 30), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(derive_start_date(due, 600), NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn draft_validation() {
        assert_eq!(TaskDraft::new("  ").validate(), Err(ValidationError::EmptyName));
        assert_eq!(
            TaskDraft::new("x").with_duration(0).validate(),
            Err(ValidationError::InvalidDuration(0))
        );
        assert!(matches!(
            TaskDraft::new("x").with_duration(60).multi_day().validate(),
            Err(ValidationError::MissingDueDate(_))
        ));
        assert!(matches!(
            TaskDraft::new("x").with_due(at(2026, 3, 4, 0, 0)).multi_day().validate(),
            Err(ValidationError::MissingDuration(_))
        ));
        assert!(TaskDraft::new("x").validate().is_ok());
    }

    #[test]
    fn enums_parse_and_serialize_as_kebab_case() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("multi-day".parse::<TaskType>().unwrap(), TaskType::MultiDay);
        assert!("urgent".parse::<Difficulty>().is_err());
        assert_eq!(serde_json::to_string(&TaskType::OneTime).unwrap(), "\"one-time\"");
        assert_eq!(serde_json::to_string(&Urgency::High).unwrap(), "\"high\"");
    }

    #[test]
    fn patch_reshapes_only_on_schedule_fields() {
        let rename = TaskPatch {
            name: Some("new".to_string()),
            ..Default::default()
        };
        assert!(!rename.reshapes_schedule());

        let harder = TaskPatch {
            difficulty: Some(Difficulty::Hard),
            ..Default::default()
        };
        assert!(harder.reshapes_schedule());
    }
}
