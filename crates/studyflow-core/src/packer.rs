//! Per-task session packer.
//!
//! Spreads a task's `N = ceil(minutes / focus)` work sessions evenly across the
//! days between its start and due date, then places each day's quota inside
//! the normal working window in short back-to-back chains. Whatever does not
//! fit is force-placed in the late evening so required work is never dropped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::availability::{is_window_free, AvailabilityOracle};
use crate::error::SchedulingWarning;
use crate::ids::IdGenerator;
use crate::task::session::collides;
use crate::task::{PomodoroSession, Task, FOCUS_MINUTES};

/// How far past its own day a forced chain keeps honouring availability.
const FORCE_SEARCH_DAYS: i64 = 7;

/// Packing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackerConfig {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    /// First candidate start of the normal window.
    pub day_start: NaiveTime,
    /// Sessions placed normally must end by this time.
    pub day_end: NaiveTime,
    pub scan_step_minutes: u32,
    /// Maximum sessions chained from one candidate start.
    pub max_chain: u32,
    /// After a chain, the scan resumes on the next multiple of this many minutes.
    pub realign_minutes: u32,
    /// Where leftover sessions go, ignoring availability.
    pub force_start: NaiveTime,
    pub probe_minutes: u32,
    /// Rejected candidate starts allowed per session of a day's quota.
    pub attempts_per_session: u32,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: FOCUS_MINUTES,
            short_break_minutes: 5,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            scan_step_minutes: 15,
            max_chain: 3,
            realign_minutes: 30,
            force_start: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
            probe_minutes: 5,
            attempts_per_session: 4,
        }
    }
}

/// What to pack for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    pub task_id: String,
    pub total_minutes: u32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl PackRequest {
    /// Number of days the work is spread over, at least one.
    pub fn horizon_days(&self) -> u32 {
        (self.due_date - self.start_date).num_days().max(1) as u32
    }
}

/// Sessions for one task plus any force-placement warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackOutcome {
    pub task_id: String,
    pub sessions: Vec<PomodoroSession>,
    pub warnings: Vec<SchedulingWarning>,
}

impl PackOutcome {
    pub fn forced_sessions(&self) -> u32 {
        self.warnings.iter().map(|w| w.forced_sessions).sum()
    }
}

/// Even split of `units` over `days`: the first `units % days` days get one extra.
pub fn distribution_plan(units: u32, days: u32) -> Vec<u32> {
    let days = days.max(1);
    let base = units / days;
    let remainder = units - base * days;
    (0..days)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Per-task packer.
#[derive(Debug, Clone, Default)]
pub struct SessionPacker {
    config: PackerConfig,
}

impl SessionPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Build the request for a task: from its start date (or `today`) through
    /// its due date (or the start date).
    pub fn request_for(&self, task: &Task, today: NaiveDate) -> PackRequest {
        let start_date = task.start_date.unwrap_or(today);
        let due_date = task.due_date.map(|d| d.date()).unwrap_or(start_date);
        PackRequest {
            task_id: task.id.clone(),
            total_minutes: task.effective_minutes(),
            start_date,
            due_date,
        }
    }

    pub fn pack_task<O, G>(
        &self,
        task: &Task,
        today: NaiveDate,
        oracle: &O,
        occupied: &[PomodoroSession],
        ids: &G,
    ) -> PackOutcome
    where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        self.pack(&self.request_for(task, today), oracle, occupied, ids)
    }

    /// Pack tasks in the given (ranked) order. Each task sees the sessions of
    /// the tasks before it as occupied, so the outputs never overlap.
    pub fn pack_ranked<O, G>(
        &self,
        ranked: &[Task],
        today: NaiveDate,
        oracle: &O,
        occupied: &[PomodoroSession],
        ids: &G,
    ) -> Vec<PackOutcome>
    where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let mut taken: Vec<PomodoroSession> = occupied.to_vec();
        let mut outcomes = Vec::with_capacity(ranked.len());
        for task in ranked {
            let outcome = self.pack_task(task, today, oracle, &taken, ids);
            taken.extend(outcome.sessions.iter().cloned());
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Lay out exactly `ceil(total_minutes / focus)` work sessions.
    pub fn pack<O, G>(
        &self,
        request: &PackRequest,
        oracle: &O,
        occupied: &[PomodoroSession],
        ids: &G,
    ) -> PackOutcome
    where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let mut outcome = PackOutcome {
            task_id: request.task_id.clone(),
            ..Default::default()
        };

        let units = request.total_minutes.div_ceil(self.config.focus_minutes.max(1));
        if units == 0 {
            return outcome;
        }

        let plan = distribution_plan(units, request.horizon_days());
        for (offset, quota) in plan.into_iter().enumerate() {
            if quota == 0 {
                continue;
            }
            let day = request.start_date + Duration::days(offset as i64);
            let placed = self.pack_day(day, quota, &request.task_id, oracle, occupied, &mut outcome, ids);

            let missing = quota - placed;
            if missing > 0 {
                self.force_place(day, missing, &request.task_id, oracle, occupied, &mut outcome, ids);
                let warning = SchedulingWarning {
                    task_id: request.task_id.clone(),
                    day,
                    forced_sessions: missing,
                };
                tracing::warn!(
                    task_id = %warning.task_id,
                    day = %day,
                    forced = missing,
                    "not enough available time; sessions force-placed after {}",
                    self.config.force_start
                );
                outcome.warnings.push(warning);
            }
        }

        outcome.sessions.sort_by_key(|s| s.start_time);
        let total = outcome.sessions.len() as u32;
        for (i, session) in outcome.sessions.iter_mut().enumerate() {
            session.session_number = i as u32 + 1;
            session.total_sessions = total;
        }
        outcome
    }

    /// Place up to `quota` sessions inside the normal window of `day`.
    #[allow(clippy::too_many_arguments)]
    fn pack_day<O, G>(
        &self,
        day: NaiveDate,
        quota: u32,
        task_id: &str,
        oracle: &O,
        occupied: &[PomodoroSession],
        outcome: &mut PackOutcome,
        ids: &G,
    ) -> u32
    where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let window_end = day.and_time(self.config.day_end);
        let max_rejections = quota * self.config.attempts_per_session;
        let step = Duration::minutes(i64::from(self.config.scan_step_minutes.max(1)));

        let mut cursor = day.and_time(self.config.day_start);
        let mut placed = 0;
        let mut rejections = 0;

        while placed < quota && cursor < window_end && rejections < max_rejections {
            let want = (quota - placed).min(self.config.max_chain);
            let chain = self.chain_at(cursor, want, window_end, oracle, occupied, &outcome.sessions);

            let Some(last_end) = chain.last().map(|(_, end)| *end) else {
                rejections += 1;
                cursor += step;
                continue;
            };

            for (start, end) in chain {
                outcome.sessions.push(PomodoroSession::work(
                    ids.next_id(),
                    task_id.to_string(),
                    start,
                    end,
                    0,
                    0,
                ));
                placed += 1;
            }
            cursor = self.realign(last_end + self.short_break());
        }

        tracing::debug!(%day, task_id, quota, placed, rejections, "packed day");
        placed
    }

    /// Back-to-back sessions from `start`, stopping at the first that does not fit.
    fn chain_at<O>(
        &self,
        start: NaiveDateTime,
        want: u32,
        window_end: NaiveDateTime,
        oracle: &O,
        occupied: &[PomodoroSession],
        own: &[PomodoroSession],
    ) -> Vec<(NaiveDateTime, NaiveDateTime)>
    where
        O: AvailabilityOracle + ?Sized,
    {
        let mut chain = Vec::new();
        let mut slot_start = start;
        while (chain.len() as u32) < want {
            let slot_end = slot_start + self.focus();
            let fits = slot_end <= window_end
                && is_window_free(oracle, slot_start, slot_end, self.config.probe_minutes)
                && !collides(occupied, slot_start, slot_end)
                && !collides(own, slot_start, slot_end);
            if !fits {
                break;
            }
            chain.push((slot_start, slot_end));
            slot_start = slot_end + self.short_break();
        }
        chain
    }

    /// Chain `count` sessions from the late-evening slot, skipping sessions
    /// already on the calendar. Availability is ignored outside normal hours
    /// only: a chain long enough to reach the next morning's window still
    /// steps over unavailable time there.
    #[allow(clippy::too_many_arguments)]
    fn force_place<O, G>(
        &self,
        day: NaiveDate,
        count: u32,
        task_id: &str,
        oracle: &O,
        occupied: &[PomodoroSession],
        outcome: &mut PackOutcome,
        ids: &G,
    ) where
        O: AvailabilityOracle + ?Sized,
        G: IdGenerator + ?Sized,
    {
        let step = Duration::minutes(i64::from(self.config.scan_step_minutes.max(1)));
        // Past this point availability is ignored everywhere so the chain
        // terminates even when every window is blocked.
        let give_up = (day + Duration::days(FORCE_SEARCH_DAYS)).and_time(self.config.force_start);

        let mut cursor = day.and_time(self.config.force_start);
        for _ in 0..count {
            loop {
                let end = cursor + self.focus();
                let blocking_end = occupied
                    .iter()
                    .chain(outcome.sessions.iter())
                    .filter(|s| s.overlaps_range(cursor, end))
                    .map(|s| s.end_time)
                    .max();
                if let Some(after) = blocking_end {
                    cursor = after;
                    continue;
                }
                if cursor < give_up
                    && self.touches_normal_hours(cursor, end)
                    && !is_window_free(oracle, cursor, end, self.config.probe_minutes)
                {
                    cursor += step;
                    continue;
                }
                break;
            }
            let end = cursor + self.focus();
            let mut session = PomodoroSession::work(ids.next_id(), task_id.to_string(), cursor, end, 0, 0);
            session.forced = true;
            outcome.sessions.push(session);
            cursor = end + self.short_break();
        }
    }

    /// True if `[start, end)` overlaps the normal packing window of any day it spans.
    pub fn touches_normal_hours(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        let mut day = start.date();
        while day <= end.date() {
            let open = day.and_time(self.config.day_start);
            let close = day.and_time(self.config.day_end);
            if start < close && end > open {
                return true;
            }
            day += Duration::days(1);
        }
        false
    }

    /// Next multiple of `realign_minutes` past midnight at or after `t`.
    fn realign(&self, t: NaiveDateTime) -> NaiveDateTime {
        let step = i64::from(self.config.realign_minutes.max(1));
        let minutes = i64::from(t.hour() * 60 + t.minute());
        let has_seconds = t.second() > 0 || t.nanosecond() > 0;
        let rem = minutes % step;
        let base = t.date().and_time(NaiveTime::MIN);
        if rem == 0 && !has_seconds {
            base + Duration::minutes(minutes)
        } else {
            base + Duration::minutes(minutes - rem + step)
        }
    }

    fn focus(&self) -> Duration {
        Duration::minutes(i64::from(self.config.focus_minutes))
    }

    fn short_break(&self) -> Duration {
        Duration::minutes(i64::from(self.config.short_break_minutes))
    }
}
