//! Task priority scoring.
//!
//! Score = urgency * 5 + deadline * 3 + difficulty * 2, where each factor is
//! a small integer weight taken from the active [`ScoringStrategy`]:
//!
//! | factor     | `Normalized` (1-3 scale)                  | `Extended` (1-5 scale)      |
//! |------------|-------------------------------------------|-----------------------------|
//! | urgency    | high 3, medium 2, low 1                   | high 5, medium 3, low 1     |
//! | difficulty | hard 3, medium 2, easy 1                  | hard 5, medium 3, easy 1    |
//! | deadline   | overdue 10, today 5, 1d 4, 3d 3, 7d 2, 1  | `5 - min(5, days)`, none 0  |
//!
//! Ranking is descending by score; ties go to the nearest deadline, with
//! overdue tasks first (least overdue leading), and undated tasks last.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::task::{Difficulty, Task, Urgency};
use crate::urgency::{classify, days_until};

/// Which weight scale to score with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// 1-3 weights with a stepped deadline table.
    Normalized,
    /// 1-5 weights with a linear deadline countdown.
    #[default]
    Extended,
}

impl ScoringStrategy {
    pub fn urgency_weight(&self, urgency: Urgency) -> u32 {
        match (self, urgency) {
            (ScoringStrategy::Normalized, Urgency::High) => 3,
            (ScoringStrategy::Normalized, Urgency::Medium) => 2,
            (ScoringStrategy::Extended, Urgency::High) => 5,
            (ScoringStrategy::Extended, Urgency::Medium) => 3,
            (_, Urgency::Low) => 1,
        }
    }

    pub fn difficulty_weight(&self, difficulty: Difficulty) -> u32 {
        match (self, difficulty) {
            (ScoringStrategy::Normalized, Difficulty::Hard) => 3,
            (ScoringStrategy::Normalized, Difficulty::Medium) => 2,
            (ScoringStrategy::Extended, Difficulty::Hard) => 5,
            (ScoringStrategy::Extended, Difficulty::Medium) => 3,
            (_, Difficulty::Easy) => 1,
        }
    }

    /// Weight from signed days until due (`None` = no due date).
    pub fn deadline_weight(&self, days_until_due: Option<i64>) -> u32 {
        match self {
            ScoringStrategy::Normalized => match days_until_due {
                Some(d) if d < 0 => 10,
                Some(0) => 5,
                Some(1) => 4,
                Some(d) if d <= 3 => 3,
                Some(d) if d <= 7 => 2,
                _ => 1,
            },
            ScoringStrategy::Extended => match days_until_due {
                Some(d) => 5 - d.clamp(0, 5) as u32,
                None => 0,
            },
        }
    }

    /// Lower bounds for critical, high and medium categories.
    pub fn thresholds(&self) -> (u32, u32, u32) {
        match self {
            ScoringStrategy::Normalized => (36, 26, 15),
            ScoringStrategy::Extended => (35, 25, 15),
        }
    }

    pub fn categorize(&self, score: u32) -> PriorityCategory {
        let (critical, high, medium) = self.thresholds();
        if score >= critical {
            PriorityCategory::Critical
        } else if score >= high {
            PriorityCategory::High
        } else if score >= medium {
            PriorityCategory::Medium
        } else {
            PriorityCategory::Low
        }
    }
}

impl std::str::FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normalized" => Ok(ScoringStrategy::Normalized),
            "extended" => Ok(ScoringStrategy::Extended),
            other => Err(format!("unknown scoring strategy '{other}'")),
        }
    }
}

/// Coarse bucket of a priority score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PriorityCategory {
    Low,
    Medium,
    High,
    Critical,
}

/// Ephemeral ranking record for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    pub task: Task,
    pub score: u32,
    pub category: PriorityCategory,
    /// Signed calendar days until due; negative when overdue, `None` without a due date.
    pub deadline_proximity: Option<i64>,
}

/// Score one task against `today`.
pub fn score_task(task: &Task, today: NaiveDate, strategy: ScoringStrategy) -> PriorityScore {
    let proximity = task.due_date.map(|due| days_until(due, today));
    let urgency = classify(task.due_date, today);

    let score = strategy.urgency_weight(urgency) * 5
        + strategy.deadline_weight(proximity) * 3
        + strategy.difficulty_weight(task.difficulty) * 2;

    PriorityScore {
        task: task.clone(),
        score,
        category: strategy.categorize(score),
        deadline_proximity: proximity,
    }
}

/// Score and rank `tasks`; stable, so equal entries keep input order.
pub fn score_tasks(tasks: &[Task], today: NaiveDate, strategy: ScoringStrategy) -> Vec<PriorityScore> {
    let mut scores: Vec<PriorityScore> = tasks
        .iter()
        .map(|task| score_task(task, today, strategy))
        .collect();
    scores.sort_by(compare_scores);
    scores
}

fn compare_scores(a: &PriorityScore, b: &PriorityScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| proximity_key(a.deadline_proximity).cmp(&proximity_key(b.deadline_proximity)))
}

// (bucket, magnitude): overdue < upcoming < undated, smaller magnitude first.
fn proximity_key(proximity: Option<i64>) -> (u8, i64) {
    match proximity {
        Some(d) if d < 0 => (0, -d),
        Some(d) => (1, d),
        None => (2, 0),
    }
}

/// Priority scorer bound to a clock and a strategy.
#[derive(Debug, Clone)]
pub struct PriorityScorer<C: Clock> {
    clock: C,
    strategy: ScoringStrategy,
}

impl<C: Clock> PriorityScorer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            strategy: ScoringStrategy::default(),
        }
    }

    pub fn with_strategy(clock: C, strategy: ScoringStrategy) -> Self {
        Self { clock, strategy }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Rank all tasks, completed ones included.
    pub fn score(&self, tasks: &[Task]) -> Vec<PriorityScore> {
        score_tasks(tasks, self.clock.today(), self.strategy)
    }

    /// Rank only tasks that are not completed.
    pub fn rank_incomplete(&self, tasks: &[Task]) -> Vec<PriorityScore> {
        let open: Vec<Task> = tasks.iter().filter(|t| !t.completed).cloned().collect();
        self.score(&open)
    }
}
