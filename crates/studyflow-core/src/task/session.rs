//! Pomodoro sessions placed on the calendar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What a session slot is used for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Work,
    ShortBreak,
    LongBreak,
}

/// A fixed-length interval owned by one task.
///
/// Breaks carry the 0/0 sentinel in `session_number` / `total_sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSession {
    pub id: String,
    pub task_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub kind: SessionKind,
    pub completed: bool,
    pub session_number: u32,
    pub total_sessions: u32,
    /// Placed by the late-evening fallback rather than inside normal hours.
    #[serde(default)]
    pub forced: bool,
}

impl PomodoroSession {
    pub fn work(
        id: String,
        task_id: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        session_number: u32,
        total_sessions: u32,
    ) -> Self {
        Self {
            id,
            task_id,
            start_time,
            end_time,
            kind: SessionKind::Work,
            completed: false,
            session_number,
            total_sessions,
            forced: false,
        }
    }

    pub fn break_slot(
        id: String,
        task_id: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        kind: SessionKind,
    ) -> Self {
        Self {
            id,
            task_id,
            start_time,
            end_time,
            kind,
            completed: false,
            session_number: 0,
            total_sessions: 0,
            forced: false,
        }
    }

    pub fn is_break(&self) -> bool {
        self.kind != SessionKind::Work
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Half-open interval overlap: back-to-back sessions do not overlap.
    pub fn overlaps_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time < end && self.end_time > start
    }

    pub fn overlaps(&self, other: &PomodoroSession) -> bool {
        self.overlaps_range(other.start_time, other.end_time)
    }
}

/// True if `[start, end)` collides with any of `sessions`.
pub fn collides(sessions: &[PomodoroSession], start: NaiveDateTime, end: NaiveDateTime) -> bool {
    sessions.iter().any(|s| s.overlaps_range(start, end))
}
