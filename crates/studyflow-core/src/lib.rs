//! # Studyflow Core Library
//!
//! This library provides the planning engine behind the studyflow study
//! planner: it turns tasks with difficulty, duration and deadline attributes
//! plus recurring unavailable time into conflict-free Pomodoro sessions.
//! Everything is available through the standalone `studyflow` CLI.
//!
//! ## Architecture
//!
//! - **Urgency / Priority**: due-date tiers and a weighted score that ranks tasks
//! - **Availability**: weekly unavailable blocks behind an injectable oracle
//! - **Session Packer**: spreads one task's sessions evenly up to its due date
//! - **Auto Scheduler**: packs all incomplete tasks on one shared timeline
//! - **Daily Selector**: picks today's tasks under a minute budget
//! - **Storage**: TOML configuration and a JSON snapshot store
//!
//! The algorithms are synchronous and pure: inputs are borrowed, outputs are
//! new values, and time, ids and availability are injected.
//!
//! ## Key Components
//!
//! - [`SessionPacker`]: per-task distribution and placement
//! - [`AutoScheduler`]: global greedy scheduler
//! - [`Planner`]: task creation and edits that keep sessions in sync
//! - [`Config`]: application configuration management

pub mod availability;
pub mod clock;
pub mod daily;
pub mod error;
pub mod ids;
pub mod packer;
pub mod planner;
pub mod priority;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod urgency;

pub use availability::{
    is_unavailable, is_window_free, AlwaysAvailable, AvailabilityOracle, PredicateOracle,
    UnavailableTimeBlock, WeeklyAvailability,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use daily::{DailyEntry, DailySelection, DailyWorkloadSelector};
pub use error::{ConfigError, CoreError, ScheduleError, SchedulingWarning, ValidationError};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use packer::{distribution_plan, PackOutcome, PackRequest, PackerConfig, SessionPacker};
pub use planner::{PlannedTask, Planner};
pub use priority::{PriorityCategory, PriorityScore, PriorityScorer, ScoringStrategy};
pub use scheduler::{
    AutoScheduleRequest, AutoScheduleResult, AutoScheduler, SchedulerConfig, TaskAllocation,
};
pub use storage::{data_dir, Config, JsonStore};
pub use task::{
    Difficulty, PomodoroSession, SessionKind, Task, TaskDraft, TaskPatch, TaskType, Urgency,
};
pub use urgency::{classify, refresh_on, UrgencyClassifier, UrgencyRefresher};
