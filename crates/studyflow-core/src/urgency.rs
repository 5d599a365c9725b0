//! Urgency classification from due-date proximity.
//!
//! Urgency is recomputed when a task is created, when its due date changes,
//! and once per calendar day. The daily refresh is driven from outside via
//! [`UrgencyRefresher::tick`]; the core never owns a timer.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::clock::Clock;
use crate::task::{Task, Urgency};

/// Signed calendar days from `today` until `due` (negative when overdue).
pub fn days_until(due: NaiveDateTime, today: NaiveDate) -> i64 {
    (due.date() - today).num_days()
}

/// Map a due date to an urgency tier.
///
/// - no due date: low
/// - due today, tomorrow, or overdue: high
/// - due within 3 days: medium
/// - otherwise: low
pub fn classify(due: Option<NaiveDateTime>, today: NaiveDate) -> Urgency {
    let Some(due) = due else {
        return Urgency::Low;
    };

    match days_until(due, today) {
        d if d <= 1 => Urgency::High,
        d if d <= 3 => Urgency::Medium,
        _ => Urgency::Low,
    }
}

/// Classifier bound to a clock.
#[derive(Debug, Clone)]
pub struct UrgencyClassifier<C: Clock> {
    clock: C,
}

impl<C: Clock> UrgencyClassifier<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn classify_task(&self, task: &Task) -> Urgency {
        classify(task.due_date, self.clock.today())
    }

    /// Copies of `tasks` with urgency recomputed for today.
    pub fn refresh(&self, tasks: &[Task]) -> Vec<Task> {
        refresh_on(tasks, self.clock.today())
    }
}

/// Copies of `tasks` with urgency recomputed as of `today`.
pub fn refresh_on(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| Task {
            urgency: classify(task.due_date, today),
            ..task.clone()
        })
        .collect()
}

/// Once-per-day urgency refresh, driven by the caller's own timer.
#[derive(Debug, Clone, Default)]
pub struct UrgencyRefresher {
    last_refreshed: Option<NaiveDate>,
}

impl UrgencyRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously recorded refresh date.
    pub fn resume_from(last_refreshed: NaiveDate) -> Self {
        Self {
            last_refreshed: Some(last_refreshed),
        }
    }

    pub fn last_refreshed(&self) -> Option<NaiveDate> {
        self.last_refreshed
    }

    /// Returns refreshed copies of `tasks` the first time it is called on a
    /// new calendar day, `None` otherwise.
    pub fn tick(&mut self, now: NaiveDateTime, tasks: &[Task]) -> Option<Vec<Task>> {
        let today = now.date();
        if self.last_refreshed == Some(today) {
            return None;
        }
        self.last_refreshed = Some(today);

        let refreshed = refresh_on(tasks, today);

        tracing::debug!(day = %today, tasks = refreshed.len(), "urgency refreshed");
        Some(refreshed)
    }

    /// Next local midnight strictly after `now`.
    pub fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
        (now.date() + Duration::days(1)).and_time(chrono::NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::task::{Difficulty, TaskType};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn due(d: u32, h: u32) -> Option<NaiveDateTime> {
        day(d).and_hms_opt(h, 0, 0)
    }

    fn task(id: &str, due_date: Option<NaiveDateTime>) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            difficulty: Difficulty::Medium,
            duration_minutes: Some(60),
            task_type: TaskType::OneTime,
            due_date,
            start_date: None,
            urgency: Urgency::Low,
            completed: false,
            sessions: Vec::new(),
            created_at: day(1).and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn boundaries() {
        let today = day(10);
        assert_eq!(classify(None, today), Urgency::Low);
        assert_eq!(classify(due(10, 23), today), Urgency::High);
        assert_eq!(classify(due(11, 0), today), Urgency::High);
        assert_eq!(classify(due(12, 9), today), Urgency::Medium);
        assert_eq!(classify(due(13, 9), today), Urgency::Medium);
        assert_eq!(classify(due(14, 9), today), Urgency::Low);
    }

    #[test]
    fn overdue_is_high() {
        assert_eq!(classify(due(2, 9), day(10)), Urgency::High);
    }

    #[test]
    fn classifier_refresh_uses_clock() {
        let clock = FixedClock::new(day(10).and_hms_opt(7, 0, 0).unwrap());
        let classifier = UrgencyClassifier::new(&clock);
        let tasks = vec![task("a", due(14, 9)), task("b", due(11, 9))];

        let refreshed = classifier.refresh(&tasks);
        assert_eq!(refreshed[0].urgency, Urgency::Low);
        assert_eq!(refreshed[1].urgency, Urgency::High);

        clock.set(day(12).and_hms_opt(7, 0, 0).unwrap());
        assert_eq!(classifier.classify_task(&tasks[0]), Urgency::Medium);
    }

    #[test]
    fn refresher_and_classifier_agree() {
        let now = day(11).and_hms_opt(6, 0, 0).unwrap();
        let tasks = vec![task("a", due(12, 9)), task("b", due(20, 9)), task("c", None)];
        let clock = FixedClock::new(now);

        let ticked = UrgencyRefresher::new().tick(now, &tasks).unwrap();
        assert_eq!(ticked, UrgencyClassifier::new(&clock).refresh(&tasks));
        assert_eq!(ticked, refresh_on(&tasks, day(11)));
        let urgencies: Vec<_> = ticked.iter().map(|t| t.urgency).collect();
        assert_eq!(urgencies, vec![Urgency::High, Urgency::Low, Urgency::Low]);
    }

    #[test]
    fn refresher_fires_once_per_day() {
        let mut refresher = UrgencyRefresher::new();
        let tasks = vec![task("a", due(12, 9))];

        let morning = day(10).and_hms_opt(0, 0, 5).unwrap();
        let first = refresher.tick(morning, &tasks).expect("first tick refreshes");
        assert_eq!(first[0].urgency, Urgency::Medium);
        assert!(refresher.tick(morning + Duration::hours(12), &tasks).is_none());

        let next_day = UrgencyRefresher::next_midnight(morning);
        assert_eq!(next_day, day(11).and_hms_opt(0, 0, 0).unwrap());
        let second = refresher.tick(next_day, &tasks).expect("new day refreshes");
        assert_eq!(second[0].urgency, Urgency::High);
        assert_eq!(refresher.last_refreshed(), Some(day(11)));
    }
}
