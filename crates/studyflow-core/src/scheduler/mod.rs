//! Global auto scheduler.
//!
//! Packs every incomplete task onto one shared timeline:
//! - Tasks are walked in priority order
//! - A single cursor scans forward in fixed steps, skipping unavailable time
//!   and anything already booked
//! - Breaks follow each work session (long after every 4th in a row) when free
//! - A per-day cap rolls the cursor to the next morning

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::availability::{is_window_free, AvailabilityOracle};
use crate::error::{Result, ScheduleError};
use crate::ids::IdGenerator;
use crate::priority::{score_tasks, ScoringStrategy};
use crate::task::session::collides;
use crate::task::{PomodoroSession, SessionKind, Task, FOCUS_MINUTES};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Focus duration per Pomodoro (minutes)
    pub focus_minutes: u32,
    /// Short break duration (minutes)
    pub short_break_minutes: u32,
    /// Long break duration (minutes)
    pub long_break_minutes: u32,
    /// Consecutive sessions before a long break
    pub sessions_before_long_break: u32,
    /// Where each new day's scan begins
    pub day_start: NaiveTime,
    /// Scan increment (minutes)
    pub slot_step_minutes: u32,
    /// Default daily cap for requests built from this config
    pub max_sessions_per_day: u32,
    /// Default horizon for requests built from this config
    pub horizon_days: u32,
    /// Availability probe spacing inside a slot (minutes)
    pub probe_minutes: u32,
    pub strategy: ScoringStrategy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: FOCUS_MINUTES,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_before_long_break: 4,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_step_minutes: 30,
            max_sessions_per_day: 8,
            horizon_days: 7,
            probe_minutes: 5,
            strategy: ScoringStrategy::default(),
        }
    }
}

/// Input to one auto-schedule run.
#[derive(Debug, Clone)]
pub struct AutoScheduleRequest<'a> {
    pub tasks: &'a [Task],
    /// First instant the cursor may use. Also "today" for ranking.
    pub start: NaiveDateTime,
    pub horizon_days: u32,
    pub max_sessions_per_day: u32,
}

/// Placed versus needed work sessions for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAllocation {
    pub task_id: String,
    pub task_name: String,
    pub priority_score: u32,
    pub needed: u32,
    pub placed: u32,
}

impl TaskAllocation {
    pub fn is_complete(&self) -> bool {
        self.placed >= self.needed
    }
}

/// Output of an auto-schedule run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoScheduleResult {
    /// Work and break sessions in placement (chronological) order
    pub sessions: Vec<PomodoroSession>,
    /// One entry per incomplete task, in rank order
    pub tasks: Vec<TaskAllocation>,
    pub total_work_sessions: u32,
}

impl AutoScheduleResult {
    /// Sessions (work and breaks) belonging to one task.
    pub fn sessions_for<'a>(
        &'a self,
        task_id: &'a str,
    ) -> impl Iterator<Item = &'a PomodoroSession> + 'a {
        self.sessions.iter().filter(move |s| s.task_id == task_id)
    }

    pub fn work_sessions(&self) -> impl Iterator<Item = &PomodoroSession> {
        self.sessions.iter().filter(|s| s.kind == SessionKind::Work)
    }

    /// True if every task got all the sessions it needed.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(TaskAllocation::is_complete)
    }
}

/// Scan position shared by every task in a run.
#[derive(Debug, Clone)]
struct Cursor {
    day: NaiveDate,
    at: NaiveDateTime,
    sessions_today: u32,
    sequential: u32,
}

impl Cursor {
    fn midnight(&self) -> NaiveDateTime {
        next_midnight(self.day)
    }

    fn roll_over(&mut self, day_start: NaiveTime) {
        self.day += Duration::days(1);
        self.at = self.day.and_time(day_start);
        self.sessions_today = 0;
        self.sequential = 0;
    }
}

fn next_midnight(day: NaiveDate) -> NaiveDateTime {
    (day + Duration::days(1)).and_time(NaiveTime::MIN)
}

/// Automatic scheduler for Pomodoro sessions across all tasks
#[derive(Debug, Clone, Default)]
pub struct AutoScheduler {
    config: SchedulerConfig,
}

impl AutoScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Request over `tasks` using this scheduler's default horizon and cap.
    pub fn request<'a>(&self, tasks: &'a [Task], start: NaiveDateTime) -> AutoScheduleRequest<'a> {
        AutoScheduleRequest {
            tasks,
            start,
            horizon_days: self.config.horizon_days,
            max_sessions_per_day: self.config.max_sessions_per_day,
        }
    }

    /// Place work sessions for every incomplete task.
    ///
    /// # Arguments
    /// * `request` - Tasks, start instant, horizon and daily cap
    /// * `oracle` - Weekly unavailable time
    /// * `existing` - Sessions already on the calendar to avoid
    /// * `ids` - Session id source
    ///
    /// # Errors
    /// `NoTasksToSchedule` if nothing is incomplete, `SchedulingExhausted` if
    /// not a single work session fit in the horizon. Partial placement is a
    /// normal result.
    pub fn schedule<O, G>(
        &self,
        request: &AutoScheduleRequest<'_>,
        oracle: &O,
        existing: &[PomodoroSession],
        ids: &G,
    ) -> Result<AutoScheduleResult>
    where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let incomplete: Vec<Task> = request
            .tasks
            .iter()
            .filter(|t| !t.completed)
            .cloned()
            .collect();
        if incomplete.is_empty() {
            return Err(ScheduleError::NoTasksToSchedule.into());
        }

        let horizon_days = request.horizon_days.max(1);
        let horizon_end = (request.start.date() + Duration::days(i64::from(horizon_days)))
            .and_time(NaiveTime::MIN);
        let cap = request.max_sessions_per_day.max(1);
        let ranked = score_tasks(&incomplete, request.start.date(), self.config.strategy);

        let mut cursor = Cursor {
            day: request.start.date(),
            at: request.start.max(request.start.date().and_time(self.config.day_start)),
            sessions_today: 0,
            sequential: 0,
        };
        let mut taken: Vec<PomodoroSession> = existing.to_vec();
        let mut result = AutoScheduleResult::default();
        let mut horizon_reached = false;

        for scored in &ranked {
            let task = &scored.task;
            let done = task.work_sessions().filter(|s| s.completed).count() as u32;
            let needed = task
                .sessions_needed(self.config.focus_minutes)
                .saturating_sub(done);
            let mut placed = 0;

            while placed < needed && !horizon_reached {
                if cursor.sessions_today >= cap {
                    cursor.roll_over(self.config.day_start);
                }

                let Some(start) = self.next_free_slot(&mut cursor, horizon_end, oracle, &taken) else {
                    horizon_reached = true;
                    break;
                };

                let end = start + self.focus();
                let session = PomodoroSession::work(
                    ids.next_id(),
                    task.id.clone(),
                    start,
                    end,
                    placed + 1,
                    needed,
                );
                taken.push(session.clone());
                result.sessions.push(session);
                placed += 1;
                cursor.at = end;
                cursor.sessions_today += 1;
                cursor.sequential += 1;

                if placed < needed {
                    self.insert_break(&mut cursor, &task.id, oracle, &mut taken, &mut result, ids);
                }
            }

            result.total_work_sessions += placed;
            result.tasks.push(TaskAllocation {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                priority_score: scored.score,
                needed,
                placed,
            });
        }

        if result.total_work_sessions == 0 {
            return Err(ScheduleError::SchedulingExhausted {
                task_count: incomplete.len(),
                horizon_days,
            }
            .into());
        }

        tracing::info!(
            tasks = result.tasks.len(),
            work_sessions = result.total_work_sessions,
            complete = result.is_complete(),
            "auto schedule finished"
        );
        Ok(result)
    }

    /// Advance `cursor` to the first free slot, rolling days at midnight.
    /// `None` once the horizon is reached.
    fn next_free_slot<O>(
        &self,
        cursor: &mut Cursor,
        horizon_end: NaiveDateTime,
        oracle: &O,
        taken: &[PomodoroSession],
    ) -> Option<NaiveDateTime>
    where
        O: AvailabilityOracle + ?Sized,
    {
        let step = Duration::minutes(i64::from(self.config.slot_step_minutes.max(1)));
        loop {
            if cursor.at >= horizon_end {
                return None;
            }
            let end = cursor.at + self.focus();
            if end > cursor.midnight() {
                cursor.roll_over(self.config.day_start);
                continue;
            }
            if is_window_free(oracle, cursor.at, end, self.config.probe_minutes)
                && !collides(taken, cursor.at, end)
            {
                return Some(cursor.at);
            }
            cursor.at += step;
        }
    }

    /// Short or long break right after the session that just ended at
    /// `cursor.at`. Skipped without moving the cursor when the slot is not free.
    fn insert_break<O, G>(
        &self,
        cursor: &mut Cursor,
        task_id: &str,
        oracle: &O,
        taken: &mut Vec<PomodoroSession>,
        result: &mut AutoScheduleResult,
        ids: &G,
    ) where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let long = cursor.sequential >= self.config.sessions_before_long_break.max(1);
        let (kind, minutes) = if long {
            (SessionKind::LongBreak, self.config.long_break_minutes)
        } else {
            (SessionKind::ShortBreak, self.config.short_break_minutes)
        };
        if minutes == 0 {
            return;
        }

        let start = cursor.at;
        let end = start + Duration::minutes(i64::from(minutes));
        let free = end <= cursor.midnight()
            && is_window_free(oracle, start, end, self.config.probe_minutes)
            && !collides(taken, start, end);
        if !free {
            tracing::debug!(%start, ?kind, "break skipped");
            return;
        }

        let slot = PomodoroSession::break_slot(ids.next_id(), task_id.to_string(), start, end, kind);
        taken.push(slot.clone());
        result.sessions.push(slot);
        cursor.at = end;
        if long {
            cursor.sequential = 0;
        }
    }

    fn focus(&self) -> Duration {
        Duration::minutes(i64::from(self.config.focus_minutes))
    }
}
