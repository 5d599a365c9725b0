//! Task management commands for CLI.

use clap::Subcommand;
use studyflow_core::{
    Config, Difficulty, JsonStore, PlannedTask, Planner, SessionPacker, Task, TaskDraft,
    TaskPatch, TaskType, UuidGenerator,
};

use super::{clock, parse_due, print_json, CliClock, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Estimated total work in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Due date: YYYY-MM-DD [HH:MM]
        #[arg(long)]
        due: Option<String>,
        /// Spread sessions over the days before the due date
        #[arg(long)]
        multi_day: bool,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its sessions
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        duration: Option<u32>,
        /// New due date: YYYY-MM-DD [HH:MM]
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// one-time or multi-day
        #[arg(long)]
        task_type: Option<TaskType>,
    },
    /// Mark a task, or one of its sessions, as done
    Complete {
        /// Task ID
        id: String,
        /// Complete only this session
        #[arg(long)]
        session: Option<String>,
    },
    /// Delete a task and its sessions
    Remove {
        /// Task ID
        id: String,
    },
}

pub(crate) fn planner(config: &Config) -> CliResult<Planner<CliClock, UuidGenerator>> {
    let packer = SessionPacker::with_config(config.packer_config()?);
    Ok(Planner::with_packer(clock()?, UuidGenerator, packer))
}

pub(crate) fn find_task(store: &JsonStore, id: &str) -> CliResult<Task> {
    store
        .load_tasks()?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("Task not found: {id}").into())
}

fn report_warnings(planned: &PlannedTask) {
    for warning in &planned.warnings {
        eprintln!("warning: {warning}");
    }
}

fn summary_line(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let (done, total) = task.progress();
    let state = if task.completed { "done" } else { "open" };
    format!(
        "{}  {:<6} {:<6} {:<9} due {}  sessions {}/{}  {}",
        task.id,
        state,
        task.urgency.to_string(),
        task.task_type.to_string(),
        due,
        done,
        total,
        task.name
    )
}

pub fn run(action: TaskAction) -> CliResult {
    let store = JsonStore::open()?;

    match action {
        TaskAction::Add {
            name,
            description,
            difficulty,
            duration,
            due,
            multi_day,
        } => {
            let config = Config::load()?;
            let mut draft = TaskDraft::new(name).with_difficulty(difficulty);
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            if let Some(minutes) = duration {
                draft = draft.with_duration(minutes);
            }
            if let Some(due) = due {
                draft = draft.with_due(parse_due(&due)?);
            }
            if multi_day {
                draft = draft.multi_day();
            }

            let availability = store.load_blocks()?;
            let occupied = store.occupied_sessions(None)?;
            let planned = planner(&config)?.create_task(draft, &availability, &occupied)?;
            store.upsert_task(&planned.task)?;

            report_warnings(&planned);
            println!("Task created: {}", planned.task.id);
            print_json(&planned.task)?;
        }
        TaskAction::List { all, json } => {
            let tasks: Vec<Task> = store
                .load_tasks()?
                .into_iter()
                .filter(|t| all || !t.completed)
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for task in &tasks {
                    println!("{}", summary_line(task));
                }
            }
        }
        TaskAction::Show { id } => {
            print_json(&find_task(&store, &id)?)?;
        }
        TaskAction::Update {
            id,
            name,
            description,
            difficulty,
            duration,
            due,
            clear_due,
            task_type,
        } => {
            let config = Config::load()?;
            let task = find_task(&store, &id)?;
            let due_date = match (due, clear_due) {
                (Some(due), _) => Some(Some(parse_due(&due)?)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let patch = TaskPatch {
                name,
                description,
                difficulty,
                duration_minutes: duration,
                task_type,
                due_date,
            };

            let availability = store.load_blocks()?;
            let occupied = store.occupied_sessions(Some(&id))?;
            let planned = planner(&config)?.update_task(&task, patch, &availability, &occupied)?;
            store.upsert_task(&planned.task)?;

            report_warnings(&planned);
            println!("Task updated:");
            print_json(&planned.task)?;
        }
        TaskAction::Complete { id, session } => {
            let config = Config::load()?;
            let planner = planner(&config)?;
            let task = find_task(&store, &id)?;
            let updated = match session {
                Some(session_id) => planner.complete_session(&task, &session_id)?,
                None => planner.complete_task(&task),
            };
            store.upsert_task(&updated)?;

            let (done, total) = updated.progress();
            if updated.completed {
                println!("Task completed: {id}");
            } else {
                println!("Session completed: {done}/{total}");
            }
        }
        TaskAction::Remove { id } => match store.remove_task(&id)? {
            Some(task) => println!("Task deleted: {} ({} session(s))", id, task.sessions.len()),
            None => return Err(format!("Task not found: {id}").into()),
        },
    }
    Ok(())
}
