//! Recurring weekly unavailable time and the availability predicate.
//!
//! Blocks are validated when added: end must be after start within the same
//! day, and blocks on the same weekday may not overlap.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A weekly interval during which no session may be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableTimeBlock {
    pub id: String,
    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: u8,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    #[serde(default)]
    pub label: Option<String>,
}

impl UnavailableTimeBlock {
    /// Build a validated block.
    pub fn new(
        id: impl Into<String>,
        day_of_week: u8,
        (start_hour, start_minute): (u32, u32),
        (end_hour, end_minute): (u32, u32),
        label: Option<String>,
    ) -> Result<Self, ValidationError> {
        let block = Self {
            id: id.into(),
            day_of_week,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
            label,
        };
        block.validate()?;
        Ok(block)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.day_of_week > 6 {
            return Err(ValidationError::InvalidDayOfWeek(self.day_of_week));
        }
        check_clock(self.start_hour, self.start_minute)?;
        // 24:00 is allowed as an end-of-day marker.
        if !(self.end_hour == 24 && self.end_minute == 0) {
            check_clock(self.end_hour, self.end_minute)?;
        }
        if self.end_minutes() <= self.start_minutes() {
            return Err(ValidationError::InvalidTimeRange {
                start: format!("{:02}:{:02}", self.start_hour, self.start_minute),
                end: format!("{:02}:{:02}", self.end_hour, self.end_minute),
            });
        }
        Ok(())
    }

    pub fn start_minutes(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    pub fn end_minutes(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }

    /// `start <= minute < end` on the matching weekday.
    pub fn contains(&self, day_of_week: u8, minute_of_day: u32) -> bool {
        self.day_of_week == day_of_week
            && self.start_minutes() <= minute_of_day
            && minute_of_day < self.end_minutes()
    }

    pub fn overlaps(&self, other: &UnavailableTimeBlock) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_minutes() < other.end_minutes()
            && other.start_minutes() < self.end_minutes()
    }
}

fn check_clock(hour: u32, minute: u32) -> Result<(), ValidationError> {
    if hour > 23 || minute > 59 {
        return Err(ValidationError::InvalidClockTime { hour, minute });
    }
    Ok(())
}

/// Weekday of `instant` as 0 = Sunday ... 6 = Saturday.
pub fn day_of_week(instant: NaiveDateTime) -> u8 {
    instant.weekday().num_days_from_sunday() as u8
}

pub fn minute_of_day(instant: NaiveDateTime) -> u32 {
    instant.hour() * 60 + instant.minute()
}

/// True iff `instant` falls inside any of `blocks`. O(blocks).
pub fn is_unavailable(instant: NaiveDateTime, blocks: &[UnavailableTimeBlock]) -> bool {
    let dow = day_of_week(instant);
    let minute = minute_of_day(instant);
    blocks.iter().any(|b| b.contains(dow, minute))
}

/// Injected availability predicate consulted by the packers.
pub trait AvailabilityOracle {
    fn is_unavailable(&self, instant: NaiveDateTime) -> bool;
}

impl<O: AvailabilityOracle + ?Sized> AvailabilityOracle for &O {
    fn is_unavailable(&self, instant: NaiveDateTime) -> bool {
        (**self).is_unavailable(instant)
    }
}

/// Nothing is ever blocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl AvailabilityOracle for AlwaysAvailable {
    fn is_unavailable(&self, _instant: NaiveDateTime) -> bool {
        false
    }
}

/// Adapts a plain predicate into an oracle.
pub struct PredicateOracle<F>(pub F);

impl<F: Fn(NaiveDateTime) -> bool> AvailabilityOracle for PredicateOracle<F> {
    fn is_unavailable(&self, instant: NaiveDateTime) -> bool {
        (self.0)(instant)
    }
}

/// The user's validated set of weekly unavailable blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    blocks: Vec<UnavailableTimeBlock>,
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored blocks, re-validating each one in order.
    pub fn from_blocks(
        blocks: impl IntoIterator<Item = UnavailableTimeBlock>,
    ) -> Result<Self, ValidationError> {
        let mut availability = Self::new();
        for block in blocks {
            availability.add_block(block)?;
        }
        Ok(availability)
    }

    /// Add a block, rejecting invalid ranges and same-day overlaps.
    pub fn add_block(&mut self, block: UnavailableTimeBlock) -> Result<(), ValidationError> {
        block.validate()?;
        if let Some(existing) = self.blocks.iter().find(|b| b.overlaps(&block)) {
            return Err(ValidationError::OverlappingBlock {
                existing_id: existing.id.clone(),
                day_of_week: block.day_of_week,
            });
        }
        self.blocks.push(block);
        self.blocks
            .sort_by_key(|b| (b.day_of_week, b.start_minutes()));
        Ok(())
    }

    /// Remove a block by id, returning it if present.
    pub fn remove_block(&mut self, id: &str) -> Option<UnavailableTimeBlock> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(index))
    }

    pub fn blocks(&self) -> &[UnavailableTimeBlock] {
        &self.blocks
    }

    pub fn blocks_for(&self, day_of_week: u8) -> impl Iterator<Item = &UnavailableTimeBlock> {
        self.blocks.iter().filter(move |b| b.day_of_week == day_of_week)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl AvailabilityOracle for WeeklyAvailability {
    fn is_unavailable(&self, instant: NaiveDateTime) -> bool {
        is_unavailable(instant, &self.blocks)
    }
}

/// Probe `[start, end]` every `probe_minutes` plus both endpoints; true if
/// no probe is unavailable.
pub fn is_window_free<O: AvailabilityOracle + ?Sized>(
    oracle: &O,
    start: NaiveDateTime,
    end: NaiveDateTime,
    probe_minutes: u32,
) -> bool {
    let step = Duration::minutes(i64::from(probe_minutes.max(1)));
    let mut probe = start;
    while probe < end {
        if oracle.is_unavailable(probe) {
            return false;
        }
        probe += step;
    }
    !oracle.is_unavailable(end)
}
