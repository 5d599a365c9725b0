//! Ranking, auto-scheduling and per-task packing.

use clap::Subcommand;
use studyflow_core::{
    AutoScheduler, Clock, Config, JsonStore, PriorityScorer, Task, UuidGenerator,
};

use super::task::{find_task, planner};
use super::{clock, parse_datetime, print_json, CliResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Rank incomplete tasks by priority
    Rank {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Place sessions for every incomplete task on one timeline
    Auto {
        /// Start instant: YYYY-MM-DD [HH:MM] (default: now)
        #[arg(long)]
        start: Option<String>,
        /// Horizon in days (default: auto_schedule.horizon_days)
        #[arg(long)]
        days: Option<u32>,
        /// Daily cap (default: auto_schedule.max_sessions_per_day)
        #[arg(long)]
        max_per_day: Option<u32>,
        /// Attach the result to the stored tasks
        #[arg(long)]
        apply: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-pack a multi-day task's open work from today, keeping completed sessions
    Pack {
        /// Task ID
        id: String,
    },
}

pub fn run(action: ScheduleAction) -> CliResult {
    let store = JsonStore::open()?;
    let config = Config::load()?;
    let clock = clock()?;

    match action {
        ScheduleAction::Rank { json } => {
            let scorer = PriorityScorer::with_strategy(&clock, config.strategy());
            let ranked = scorer.rank_incomplete(&store.load_tasks()?);
            if json {
                print_json(&ranked)?;
            } else if ranked.is_empty() {
                println!("no open tasks");
            } else {
                for (i, p) in ranked.iter().enumerate() {
                    let proximity = p
                        .deadline_proximity
                        .map(|d| format!("{d:+}d"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:>2}. {:>3} {:<8} {:>5}  {}  {}",
                        i + 1,
                        p.score,
                        format!("{:?}", p.category).to_lowercase(),
                        proximity,
                        p.task.id,
                        p.task.name
                    );
                }
            }
        }
        ScheduleAction::Auto {
            start,
            days,
            max_per_day,
            apply,
            json,
        } => {
            let scheduler = AutoScheduler::with_config(config.scheduler_config()?);
            let start = match start {
                Some(s) => parse_datetime(&s, scheduler.config().day_start)?,
                None => clock.now(),
            };

            let mut tasks = store.load_tasks()?;
            // Completed sessions stay on the calendar; open ones are re-planned.
            let history: Vec<_> = tasks
                .iter()
                .flat_map(|t| t.sessions.iter().filter(|s| s.completed).cloned())
                .collect();

            let mut request = scheduler.request(&tasks, start);
            if let Some(days) = days {
                request.horizon_days = days;
            }
            if let Some(cap) = max_per_day {
                request.max_sessions_per_day = cap;
            }
            let availability = store.load_blocks()?;
            let result = scheduler.schedule(&request, &availability, &history, &UuidGenerator)?;

            if json {
                print_json(&result)?;
            } else {
                for allocation in &result.tasks {
                    println!(
                        "{}  {}/{} session(s)  {}",
                        allocation.task_id, allocation.placed, allocation.needed, allocation.task_name
                    );
                }
                for s in result.work_sessions() {
                    println!(
                        "  {} {}-{}  {} #{}/{}",
                        s.start_time.format("%a %Y-%m-%d"),
                        s.start_time.format("%H:%M"),
                        s.end_time.format("%H:%M"),
                        s.task_id,
                        s.session_number,
                        s.total_sessions
                    );
                }
                println!("total work sessions: {}", result.total_work_sessions);
            }

            if apply {
                for task in tasks.iter_mut().filter(|t| !t.completed) {
                    task.sessions.retain(|s| s.completed);
                    task.sessions.extend(result.sessions_for(&task.id).cloned());
                }
                store.save_tasks(&tasks)?;
                eprintln!("applied to {} task(s)", result.tasks.len());
            }
        }
        ScheduleAction::Pack { id } => {
            let task: Task = find_task(&store, &id)?;
            if !task.is_multi_day() {
                return Err(format!("Task {id} is not multi-day; use `schedule auto`").into());
            }
            let availability = store.load_blocks()?;
            let occupied = store.occupied_sessions(Some(&id))?;
            let planned = planner(&config)?.repack_task(&task, &availability, &occupied);
            for warning in &planned.warnings {
                eprintln!("warning: {warning}");
            }
            store.upsert_task(&planned.task)?;
            let (done, total) = planned.task.progress();
            println!("Task packed: {id} ({total} session(s), {done} completed)");
        }
    }
    Ok(())
}
