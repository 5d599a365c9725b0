//! Property tests for the packing and scheduling invariants.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use studyflow_core::availability::is_window_free;
use studyflow_core::priority::score_tasks;
use studyflow_core::{
    distribution_plan, AutoScheduler, Difficulty, PackRequest, PackerConfig, PomodoroSession,
    ScoringStrategy, SequentialIds, SessionPacker, Task, TaskType, UnavailableTimeBlock, Urgency,
    WeeklyAvailability,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn availability_from(raw: Vec<(u8, u32, u32)>) -> WeeklyAvailability {
    let mut availability = WeeklyAvailability::new();
    for (i, (dow, start_hour, hours)) in raw.into_iter().enumerate() {
        let end_hour = (start_hour + hours).min(24);
        if let Ok(block) = UnavailableTimeBlock::new(format!("b{i}"), dow, (start_hour, 0), (end_hour, 0), None) {
            // Overlapping blocks are rejected; skipping them keeps the set valid.
            let _ = availability.add_block(block);
        }
    }
    availability
}

fn blocks() -> impl Strategy<Value = Vec<(u8, u32, u32)>> {
    prop::collection::vec((0u8..7, 0u32..24, 1u32..8), 0..8)
}

fn horizon_and_minutes() -> impl Strategy<Value = (i64, u32)> {
    (0i64..6, 1u32..=3000)
}

fn task(id: usize, minutes: u32, due_in: i64, difficulty: Difficulty) -> Task {
    let created = monday().and_hms_opt(7, 0, 0).unwrap();
    Task {
        id: format!("t{id}"),
        name: format!("task {id}"),
        description: String::new(),
        difficulty,
        duration_minutes: Some(minutes),
        task_type: TaskType::MultiDay,
        due_date: Some(created + Duration::days(due_in)),
        start_date: Some(monday()),
        urgency: Urgency::Low,
        completed: false,
        sessions: Vec::new(),
        created_at: created,
    }
}

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard)
    ]
}

fn assert_disjoint(sessions: &[&PomodoroSession]) -> Result<(), TestCaseError> {
    for (i, a) in sessions.iter().enumerate() {
        for b in &sessions[i + 1..] {
            prop_assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
        }
    }
    Ok(())
}

fn in_normal_window(start: NaiveDateTime, config: &PackerConfig) -> bool {
    let time = start.time();
    time >= config.day_start && time < config.day_end
}

proptest! {
    #[test]
    fn distribution_is_balanced(units in 0u32..200, days in 1u32..30) {
        let plan = distribution_plan(units, days);
        prop_assert_eq!(plan.len() as u32, days);
        prop_assert_eq!(plan.iter().sum::<u32>(), units);
        let max = plan.iter().copied().max().unwrap_or(0);
        let min = plan.iter().copied().min().unwrap_or(0);
        prop_assert!(max - min <= 1);
        // Extra units go to the earliest days.
        prop_assert!(plan.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn packer_covers_respects_and_balances(
        (horizon, minutes) in horizon_and_minutes(),
        raw in blocks(),
    ) {
        let availability = availability_from(raw);
        let packer = SessionPacker::new();
        let ids = SequentialIds::new("s");
        let request = PackRequest {
            task_id: "t".to_string(),
            total_minutes: minutes,
            start_date: monday(),
            due_date: monday() + Duration::days(horizon),
        };

        let outcome = packer.pack(&request, &availability, &[], &ids);
        let n = minutes.div_ceil(25);

        // Coverage: exactly N numbered work sessions.
        prop_assert_eq!(outcome.sessions.len() as u32, n);
        for (i, s) in outcome.sessions.iter().enumerate() {
            prop_assert_eq!(s.session_number, i as u32 + 1);
            prop_assert_eq!(s.total_sessions, n);
            prop_assert_eq!(s.duration_minutes(), 25);
        }

        // No overlap within the task.
        let refs: Vec<_> = outcome.sessions.iter().collect();
        assert_disjoint(&refs)?;

        // Availability: normally placed sessions sit inside the window with free
        // endpoints; forced ones only need that where they reach into normal hours.
        for s in &outcome.sessions {
            if !s.forced {
                prop_assert!(in_normal_window(s.start_time, packer.config()));
                prop_assert!(is_window_free(&availability, s.start_time, s.end_time, 5));
            } else if packer.touches_normal_hours(s.start_time, s.end_time) {
                prop_assert!(is_window_free(&availability, s.start_time, s.end_time, 5));
            }
        }

        // Balance: per-day placements plus that day's forced count follow the even plan.
        let days = request.horizon_days();
        let plan = distribution_plan(n, days);
        for (offset, quota) in plan.iter().enumerate() {
            let day = monday() + Duration::days(offset as i64);
            let placed = outcome
                .sessions
                .iter()
                .filter(|s| !s.forced && s.start_time.date() == day)
                .count() as u32;
            let forced: u32 = outcome
                .warnings
                .iter()
                .filter(|w| w.day == day)
                .map(|w| w.forced_sessions)
                .sum();
            prop_assert_eq!(placed + forced, *quota);
        }
        prop_assert_eq!(
            outcome.forced_sessions() as usize,
            outcome.sessions.iter().filter(|s| s.forced).count()
        );
    }

    #[test]
    fn ranked_packing_never_double_books(
        specs in prop::collection::vec((25u32..400, 1i64..5, difficulty()), 1..5),
        raw in blocks(),
    ) {
        let availability = availability_from(raw);
        let tasks: Vec<Task> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, due_in, difficulty))| task(i, minutes, due_in, difficulty))
            .collect();
        let ranked: Vec<Task> = score_tasks(&tasks, monday(), ScoringStrategy::Extended)
            .into_iter()
            .map(|s| s.task)
            .collect();

        let packer = SessionPacker::new();
        let ids = SequentialIds::new("s");
        let outcomes = packer.pack_ranked(&ranked, monday(), &availability, &[], &ids);

        for (task, outcome) in ranked.iter().zip(&outcomes) {
            prop_assert_eq!(outcome.sessions.len() as u32, task.pomodoros_needed());
        }
        let all: Vec<_> = outcomes.iter().flat_map(|o| o.sessions.iter()).collect();
        assert_disjoint(&all)?;
    }

    #[test]
    fn auto_schedule_never_double_books(
        specs in prop::collection::vec((25u32..300, 1i64..8, difficulty()), 1..6),
        raw in blocks(),
        cap in 1u32..10,
    ) {
        let availability = availability_from(raw);
        let tasks: Vec<Task> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, due_in, difficulty))| task(i, minutes, due_in, difficulty))
            .collect();

        let scheduler = AutoScheduler::new();
        let mut request = scheduler.request(&tasks, monday().and_hms_opt(8, 0, 0).unwrap());
        request.max_sessions_per_day = cap;
        let ids = SequentialIds::new("a");

        if let Ok(result) = scheduler.schedule(&request, &availability, &[], &ids) {
            let all: Vec<_> = result.sessions.iter().collect();
            assert_disjoint(&all)?;

            for s in &result.sessions {
                prop_assert!(is_window_free(&availability, s.start_time, s.end_time, 5));
            }

            let mut per_day = std::collections::BTreeMap::new();
            for s in result.work_sessions() {
                *per_day.entry(s.start_time.date()).or_insert(0u32) += 1;
            }
            prop_assert!(per_day.values().all(|&count| count <= cap));

            let placed: u32 = result.tasks.iter().map(|a| a.placed).sum();
            prop_assert_eq!(placed, result.total_work_sessions);
        }
    }

    #[test]
    fn scoring_is_idempotent(
        specs in prop::collection::vec((25u32..300, -3i64..12, difficulty()), 0..8),
    ) {
        let tasks: Vec<Task> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, due_in, difficulty))| task(i, minutes, due_in, difficulty))
            .collect();

        for strategy in [ScoringStrategy::Normalized, ScoringStrategy::Extended] {
            let first = score_tasks(&tasks, monday(), strategy);
            let second = score_tasks(&tasks, monday(), strategy);
            prop_assert_eq!(first, second);
        }
    }
}
