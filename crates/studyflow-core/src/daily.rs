//! Today's workload under a minute budget.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::priority::{score_tasks, PriorityCategory, ScoringStrategy};
use crate::task::Task;

/// Default daily budget in minutes.
pub const DEFAULT_MAX_DAILY_MINUTES: u32 = 240;

/// One task picked for today and the minutes it takes today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub task: Task,
    pub minutes: u32,
    pub score: u32,
    pub category: PriorityCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySelection {
    pub day: NaiveDate,
    pub tasks: Vec<DailyEntry>,
    pub total_minutes: u32,
    pub budget_minutes: u32,
}

impl DailySelection {
    pub fn remaining_minutes(&self) -> u32 {
        self.budget_minutes.saturating_sub(self.total_minutes)
    }
}

/// Minutes `task` contributes on `day`: open work sessions starting that day
/// for multi-day tasks, the whole estimate for one-time tasks.
pub fn minutes_on(task: &Task, day: NaiveDate) -> u32 {
    if task.is_multi_day() {
        task.open_session_minutes_on(day).max(0) as u32
    } else {
        task.effective_minutes()
    }
}

/// Pick today's tasks in priority order until the budget is spent.
pub fn select_for_day(
    tasks: &[Task],
    day: NaiveDate,
    max_daily_minutes: u32,
    strategy: ScoringStrategy,
) -> DailySelection {
    let open: Vec<Task> = tasks.iter().filter(|t| !t.completed).cloned().collect();
    let mut selection = DailySelection {
        day,
        tasks: Vec::new(),
        total_minutes: 0,
        budget_minutes: max_daily_minutes,
    };

    for scored in score_tasks(&open, day, strategy) {
        let minutes = minutes_on(&scored.task, day);
        if scored.task.is_multi_day() && minutes == 0 {
            continue;
        }
        let total = selection.total_minutes.saturating_add(minutes);
        if total > max_daily_minutes {
            break;
        }
        selection.total_minutes = total;
        selection.tasks.push(DailyEntry {
            task: scored.task,
            minutes,
            score: scored.score,
            category: scored.category,
        });
    }

    tracing::debug!(
        %day,
        picked = selection.tasks.len(),
        minutes = selection.total_minutes,
        budget = max_daily_minutes,
        "daily workload selected"
    );
    selection
}

/// Daily selector bound to a clock.
#[derive(Debug, Clone)]
pub struct DailyWorkloadSelector<C: Clock> {
    clock: C,
    strategy: ScoringStrategy,
}

impl<C: Clock> DailyWorkloadSelector<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            strategy: ScoringStrategy::default(),
        }
    }

    pub fn with_strategy(clock: C, strategy: ScoringStrategy) -> Self {
        Self { clock, strategy }
    }

    pub fn select_today(&self, tasks: &[Task], max_daily_minutes: u32) -> DailySelection {
        select_for_day(tasks, self.clock.today(), max_daily_minutes, self.strategy)
    }
}
