//! Today's workload and the daily urgency tick.

use studyflow_core::{
    Clock, Config, DailyWorkloadSelector, JsonStore, UrgencyRefresher,
};

use super::{clock, print_json, CliResult};

pub fn run(budget: Option<u32>, json: bool) -> CliResult {
    let store = JsonStore::open()?;
    let config = Config::load()?;
    let clock = clock()?;

    let selector = DailyWorkloadSelector::with_strategy(&clock, config.strategy());
    let budget = budget.unwrap_or(config.daily.max_daily_minutes);
    let selection = selector.select_today(&store.load_tasks()?, budget);

    if json {
        return print_json(&selection);
    }

    println!("{} ({} of {} min)", selection.day, selection.total_minutes, selection.budget_minutes);
    if selection.tasks.is_empty() {
        println!("nothing planned");
    }
    for entry in &selection.tasks {
        println!(
            "  {:>4} min  {:<8} {}  {}",
            entry.minutes,
            format!("{:?}", entry.category).to_lowercase(),
            entry.task.id,
            entry.task.name
        );
    }
    Ok(())
}

/// Recompute urgency if it has not been done yet today.
pub fn tick() -> CliResult {
    let store = JsonStore::open()?;
    let now = clock()?.now();
    let mut meta = store.load_meta()?;

    let mut refresher = match meta.last_urgency_refresh {
        Some(day) => UrgencyRefresher::resume_from(day),
        None => UrgencyRefresher::new(),
    };

    match refresher.tick(now, &store.load_tasks()?) {
        Some(tasks) => {
            store.save_tasks(&tasks)?;
            meta.last_urgency_refresh = refresher.last_refreshed();
            store.save_meta(&meta)?;
            println!("urgency refreshed for {} task(s)", tasks.len());
        }
        None => println!("already refreshed today"),
    }
    println!("next refresh: {}", UrgencyRefresher::next_midnight(now));
    Ok(())
}
