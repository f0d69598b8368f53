//! Queue of upcoming instants shared by all fake time sources.
//!
//! Each query pops the front of the queue. Whenever a query drains the
//! last entry, the following instant is computed from the drained one and
//! queued straight away, so a source never runs dry.

use std::collections::VecDeque;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Deserialize;

use super::error::ClockError;

/// Step used between automatically generated instants when no explicit
/// `delta` was configured. The gap grows by this much on every refill.
pub const DEFAULT_GAP_STEP: i64 = 10;

/// Unit in which `delta` is expressed.
///
/// Parsed case-insensitively, from settings files as well as `str::parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DeltaUnit {
    Weeks,
    Days,
    Hours,
    Minutes,
    #[default]
    Seconds,
    Milliseconds,
    Microseconds,
}

impl DeltaUnit {
    /// Build a `TimeDelta` of `amount` units. Returns `None` when the
    /// result does not fit.
    pub fn duration(self, amount: i64) -> Option<TimeDelta> {
        match self {
            DeltaUnit::Weeks => TimeDelta::try_weeks(amount),
            DeltaUnit::Days => TimeDelta::try_days(amount),
            DeltaUnit::Hours => TimeDelta::try_hours(amount),
            DeltaUnit::Minutes => TimeDelta::try_minutes(amount),
            DeltaUnit::Seconds => TimeDelta::try_seconds(amount),
            DeltaUnit::Milliseconds => TimeDelta::try_milliseconds(amount),
            DeltaUnit::Microseconds => Some(TimeDelta::microseconds(amount)),
        }
    }
}

impl FromStr for DeltaUnit {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weeks" => Ok(DeltaUnit::Weeks),
            "days" => Ok(DeltaUnit::Days),
            "hours" => Ok(DeltaUnit::Hours),
            "minutes" => Ok(DeltaUnit::Minutes),
            "seconds" => Ok(DeltaUnit::Seconds),
            "milliseconds" => Ok(DeltaUnit::Milliseconds),
            "microseconds" => Ok(DeltaUnit::Microseconds),
            other => Err(ClockError::UnknownDeltaUnit(other.to_string())),
        }
    }
}

impl TryFrom<String> for DeltaUnit {
    type Error = ClockError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Values that can be moved forward by a number of `DeltaUnit`s.
pub trait Advance: Copy + std::fmt::Debug {
    fn advance(self, unit: DeltaUnit, amount: i64) -> Option<Self>;
}

impl Advance for NaiveDateTime {
    fn advance(self, unit: DeltaUnit, amount: i64) -> Option<Self> {
        self.checked_add_signed(unit.duration(amount)?)
    }
}

impl Advance for NaiveDate {
    // Only whole days count for dates; smaller units leave the date as-is.
    fn advance(self, unit: DeltaUnit, amount: i64) -> Option<Self> {
        self.checked_add_signed(unit.duration(amount)?)
    }
}

/// Ordered queue of upcoming values plus the rule for generating more.
#[derive(Debug, Clone)]
pub struct TimeQueue<T> {
    entries: VecDeque<T>,
    fallback: T,
    gap: i64,
    gap_step: i64,
    unit: DeltaUnit,
}

impl<T: Advance> TimeQueue<T> {
    /// Create a queue.
    ///
    /// - `start`: first value handed out, or `None` for an empty queue.
    /// - `fallback`: value used when the queue is queried while empty.
    /// - `delta`: fixed gap between generated values. `None` selects the
    ///   growing gap (0, then +10, +20, ... units).
    pub fn new(start: Option<T>, fallback: T, delta: Option<i64>, unit: DeltaUnit) -> Self {
        let (gap, gap_step) = match delta {
            Some(d) => (d, 0),
            None => (0, DEFAULT_GAP_STEP),
        };
        TimeQueue {
            entries: start.into_iter().collect(),
            fallback,
            gap,
            gap_step,
            unit,
        }
    }

    /// Pop the next value, refilling the queue when it runs out.
    pub fn next_value(&mut self) -> T {
        let current = self.entries.pop_front().unwrap_or(self.fallback);
        if self.entries.is_empty() {
            self.gap += self.gap_step;
            match current.advance(self.unit, self.gap) {
                Some(following) => {
                    tracing::debug!(?current, ?following, gap = self.gap, "time queue refilled");
                    self.entries.push_back(following);
                }
                None => {
                    // Out of representable range: keep handing out the last value.
                    tracing::warn!(?current, gap = self.gap, "time queue cannot advance further");
                    self.entries.push_back(current);
                }
            }
        }
        current
    }

    /// Append a value after anything already queued.
    pub fn push(&mut self, value: T) {
        self.entries.push_back(value);
    }

    /// Drop everything queued and start over from `value`. The gap keeps
    /// its current size.
    pub fn reset(&mut self, value: T) {
        self.entries.clear();
        self.entries.push_back(value);
    }

    /// Values still waiting to be handed out, front first.
    pub fn pending(&self) -> Vec<T> {
        self.entries.iter().copied().collect()
    }

    pub fn unit(&self) -> DeltaUnit {
        self.unit
    }
}
