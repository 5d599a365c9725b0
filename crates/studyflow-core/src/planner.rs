//! Task lifecycle: creation, edits, completion.
//!
//! The planner never owns storage. Callers hand in snapshots (the task, the
//! sessions of other tasks already on the calendar) and merge the returned
//! copies back into their store.

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityOracle;
use crate::clock::Clock;
use crate::error::{Result, SchedulingWarning, ValidationError};
use crate::ids::IdGenerator;
use crate::packer::SessionPacker;
use crate::task::{derive_start_date, PomodoroSession, Task, TaskDraft, TaskPatch, TaskType};
use crate::urgency::{classify, UrgencyClassifier};

/// A task as created or updated, plus any force-placement warnings from packing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub task: Task,
    #[serde(default)]
    pub warnings: Vec<SchedulingWarning>,
}

pub struct Planner<C: Clock, I: IdGenerator> {
    clock: C,
    ids: I,
    packer: SessionPacker,
}

impl<C: Clock, I: IdGenerator> Planner<C, I> {
    pub fn new(clock: C, ids: I) -> Self {
        Self::with_packer(clock, ids, SessionPacker::new())
    }

    pub fn with_packer(clock: C, ids: I, packer: SessionPacker) -> Self {
        Self { clock, ids, packer }
    }

    pub fn packer(&self) -> &SessionPacker {
        &self.packer
    }

    /// Validate a draft and turn it into a task. Multi-day tasks get their
    /// sessions packed between the derived start date and the due date.
    pub fn create_task<O>(
        &self,
        draft: TaskDraft,
        oracle: &O,
        occupied: &[PomodoroSession],
    ) -> Result<PlannedTask>
    where
        O: AvailabilityOracle + ?Sized,
    {
        draft.validate()?;

        let task = Task {
            id: self.ids.next_id(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            difficulty: draft.difficulty,
            duration_minutes: draft.duration_minutes,
            task_type: draft.task_type,
            due_date: draft.due_date,
            start_date: None,
            urgency: classify(draft.due_date, self.clock.today()),
            completed: false,
            sessions: Vec::new(),
            created_at: self.clock.now(),
        };

        let planned = self.replan(task, oracle, occupied);
        tracing::info!(
            task_id = %planned.task.id,
            sessions = planned.task.sessions.len(),
            forced = planned.warnings.len(),
            "task created"
        );
        Ok(planned)
    }

    /// Apply `patch` to a copy of `task`.
    ///
    /// For a task that is or becomes multi-day, a change to difficulty,
    /// duration, type or due date discards its sessions and packs new ones.
    /// One-time tasks keep their sessions. Changing difficulty without a
    /// duration re-estimates the duration from the difficulty.
    pub fn update_task<O>(
        &self,
        task: &Task,
        patch: TaskPatch,
        oracle: &O,
        occupied: &[PomodoroSession],
    ) -> Result<PlannedTask>
    where
        O: AvailabilityOracle + ?Sized,
    {
        let reshape = patch.reshapes_schedule();
        let mut updated = task.clone();

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
            updated.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(difficulty) = patch.difficulty {
            updated.difficulty = difficulty;
            if patch.duration_minutes.is_none() {
                updated.duration_minutes = Some(difficulty.default_duration_minutes());
            }
        }
        if let Some(minutes) = patch.duration_minutes {
            if minutes == 0 {
                return Err(ValidationError::InvalidDuration(0).into());
            }
            updated.duration_minutes = Some(minutes);
        }
        if let Some(task_type) = patch.task_type {
            updated.task_type = task_type;
        }
        if let Some(due_date) = patch.due_date {
            updated.due_date = due_date;
        }

        if updated.task_type == TaskType::MultiDay {
            if updated.due_date.is_none() {
                return Err(ValidationError::MissingDueDate(updated.name).into());
            }
            if updated.duration_minutes.is_none() {
                return Err(ValidationError::MissingDuration(updated.name).into());
            }
        }

        updated.urgency = classify(updated.due_date, self.clock.today());
        // Sessions of one-time tasks come from the auto scheduler and survive edits.
        if !reshape || !(task.is_multi_day() || updated.is_multi_day()) {
            return Ok(PlannedTask {
                task: updated,
                warnings: Vec::new(),
            });
        }

        updated.sessions.clear();
        let others: Vec<PomodoroSession> = occupied
            .iter()
            .filter(|s| s.task_id != updated.id)
            .cloned()
            .collect();
        let planned = self.replan(updated, oracle, &others);
        tracing::info!(
            task_id = %planned.task.id,
            sessions = planned.task.sessions.len(),
            "task sessions regenerated"
        );
        Ok(planned)
    }

    /// Re-pack the open work of a multi-day task from today on.
    ///
    /// Completed sessions are kept and count toward the task's minutes; only
    /// the remainder is packed, from `max(start date, today)` through the due
    /// date. Other task types are returned unchanged.
    pub fn repack_task<O>(&self, task: &Task, oracle: &O, occupied: &[PomodoroSession]) -> PlannedTask
    where
        O: AvailabilityOracle + ?Sized,
    {
        let today = self.clock.today();
        let mut updated = task.clone();
        if !task.is_multi_day() {
            return PlannedTask {
                task: updated,
                warnings: Vec::new(),
            };
        }

        let kept: Vec<PomodoroSession> = task.sessions.iter().filter(|s| s.completed).cloned().collect();
        let done = kept.iter().filter(|s| !s.is_break()).count() as u32;
        let focus = self.packer.config().focus_minutes;
        let remaining = task.effective_minutes().saturating_sub(done * focus);

        let mut request = self.packer.request_for(task, today);
        request.start_date = request.start_date.max(today);
        request.due_date = request.due_date.max(request.start_date);
        request.total_minutes = remaining;

        let mut blocked = occupied.to_vec();
        blocked.extend(kept.iter().cloned());
        let outcome = self.packer.pack(&request, oracle, &blocked, &self.ids);

        let total = done + outcome.sessions.len() as u32;
        let mut sessions = kept;
        for session in sessions.iter_mut().filter(|s| !s.is_break()) {
            session.total_sessions = total;
        }
        sessions.extend(outcome.sessions.into_iter().map(|mut s| {
            s.session_number += done;
            s.total_sessions = total;
            s
        }));
        sessions.sort_by_key(|s| s.start_time);
        updated.sessions = sessions;

        tracing::info!(
            task_id = %updated.id,
            kept = done,
            packed = total - done,
            "task re-packed"
        );
        PlannedTask {
            task: updated,
            warnings: outcome.warnings,
        }
    }

    /// Mark one session done. The task completes with its last work session.
    pub fn complete_session(&self, task: &Task, session_id: &str) -> Result<Task> {
        let mut updated = task.clone();
        let session = updated
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| ValidationError::UnknownSession {
                task_id: task.id.clone(),
                session_id: session_id.to_string(),
            })?;
        session.completed = true;

        let (done, total) = updated.progress();
        if total > 0 && done == total {
            updated.completed = true;
        }
        Ok(updated)
    }

    pub fn complete_task(&self, task: &Task) -> Task {
        Task {
            completed: true,
            ..task.clone()
        }
    }

    /// Urgency recomputed for today on copies of `tasks`.
    pub fn refresh_urgency(&self, tasks: &[Task]) -> Vec<Task> {
        UrgencyClassifier::new(&self.clock).refresh(tasks)
    }

    /// Derive the start date and, for multi-day tasks, pack fresh sessions.
    fn replan<O>(&self, mut task: Task, oracle: &O, occupied: &[PomodoroSession]) -> PlannedTask
    where
        O: AvailabilityOracle + ?Sized,
    {
        let today = self.clock.today();
        task.start_date = match (task.task_type, task.due_date, task.duration_minutes) {
            (TaskType::MultiDay, Some(due), Some(minutes)) => {
                // Never plan into the past, and never past the due date.
                Some(derive_start_date(due, minutes).max(today).min(due.date()))
            }
            _ => None,
        };

        if !task.is_multi_day() {
            return PlannedTask {
                task,
                warnings: Vec::new(),
            };
        }

        let outcome = self.packer.pack_task(&task, today, oracle, occupied, &self.ids);
        task.sessions = outcome.sessions;
        PlannedTask {
            task,
            warnings: outcome.warnings,
        }
    }
}
