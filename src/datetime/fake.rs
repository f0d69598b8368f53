//! Queue-backed fake clock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};

use super::clock::Clock;
use super::error::{ClockError, QueueOp};
use super::input::{ClockInput, Components};
use super::queue::{DeltaUnit, TimeQueue};
use super::stamp::{Flavour, Timestamp};

/// First instant handed out by a clock built without an explicit start.
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Everything that can be configured on a `FakeClock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeClockConfig {
    /// First queued instant. `None` starts with an empty queue.
    pub start: Option<NaiveDateTime>,
    /// Zone the queued instants are read in.
    pub tzinfo: Option<FixedOffset>,
    /// Fixed gap between generated instants. `None` selects the growing gap.
    pub delta: Option<i64>,
    pub delta_type: DeltaUnit,
    /// Hand out `Flavour::Strict` values instead of `Flavour::Lightweight`.
    pub strict: bool,
    /// Flavour of dates derived from returned values.
    pub date_flavour: Flavour,
}

impl Default for FakeClockConfig {
    fn default() -> Self {
        FakeClockConfig {
            start: Some(default_start()),
            tzinfo: None,
            delta: None,
            delta_type: DeltaUnit::Seconds,
            strict: false,
            date_flavour: Flavour::Native,
        }
    }
}

/// A clock whose readings come from a queue the test controls.
///
/// Clones share the same queue, so a test can keep one handle to `add`
/// or `set` instants while the code under test reads from another.
///
/// ```
/// use fixturekit::datetime::{Clock, Components, FakeClock};
///
/// let clock = FakeClock::empty();
/// clock.add(Components::ymd(2002, 1, 1).hms(1, 0, 0)).unwrap();
/// clock.add(Components::ymd(2002, 1, 1).hms(2, 0, 0)).unwrap();
/// assert_eq!(clock.now().to_string(), "2002-01-01 01:00:00");
/// assert_eq!(clock.now().to_string(), "2002-01-01 02:00:00");
/// // Past the end of the queue the clock keeps moving forward.
/// assert_eq!(clock.now().to_string(), "2002-01-01 02:00:10");
/// ```
#[derive(Debug, Clone)]
pub struct FakeClock {
    queue: Arc<Mutex<TimeQueue<NaiveDateTime>>>,
    tzinfo: Option<FixedOffset>,
    flavour: Flavour,
    date_flavour: Flavour,
}

impl Default for FakeClock {
    fn default() -> Self {
        FakeClock::new()
    }
}

impl FakeClock {
    /// Clock starting at 2001-01-01 00:00:00.
    pub fn new() -> Self {
        FakeClock::with_config(FakeClockConfig::default())
    }

    /// Clock with nothing queued. Fill it with `add`/`set`.
    pub fn empty() -> Self {
        FakeClock::with_config(FakeClockConfig {
            start: None,
            ..FakeClockConfig::default()
        })
    }

    /// Clock starting at `start`. A zone in the components becomes the
    /// clock's zone.
    pub fn starting_at(start: Components) -> Result<Self, ClockError> {
        Ok(FakeClock::with_config(FakeClockConfig {
            start: Some(start.to_naive()?),
            tzinfo: start.tzinfo,
            ..FakeClockConfig::default()
        }))
    }

    pub fn with_config(config: FakeClockConfig) -> Self {
        let queue = TimeQueue::new(
            config.start,
            config.start.unwrap_or_else(default_start),
            config.delta,
            config.delta_type,
        );
        FakeClock {
            queue: Arc::new(Mutex::new(queue)),
            tzinfo: config.tzinfo,
            flavour: Flavour::for_fake(config.strict),
            date_flavour: config.date_flavour,
        }
    }

    pub fn tzinfo(&self) -> Option<FixedOffset> {
        self.tzinfo
    }

    pub fn is_strict(&self) -> bool {
        self.flavour == Flavour::Strict
    }

    /// Queue an instant after those already waiting.
    pub fn add(&self, input: impl Into<ClockInput>) -> Result<(), ClockError> {
        let naive = input.into().resolve(QueueOp::Add)?;
        self.lock().push(naive);
        Ok(())
    }

    /// Discard everything queued; the next `now()` returns this instant.
    pub fn set(&self, input: impl Into<ClockInput>) -> Result<(), ClockError> {
        let naive = input.into().resolve(QueueOp::Set)?;
        self.lock().reset(naive);
        Ok(())
    }

    /// Build a value of this clock's flavour without touching the queue.
    /// This mirrors constructing the clock's datetime type directly.
    pub fn construct(&self, parts: Components) -> Result<Timestamp, ClockError> {
        Ok(self.stamp(parts.to_naive()?, parts.tzinfo))
    }

    /// Instants still queued, front first.
    pub fn pending(&self) -> Vec<NaiveDateTime> {
        self.lock().pending()
    }

    fn lock(&self) -> MutexGuard<'_, TimeQueue<NaiveDateTime>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_naive(&self) -> NaiveDateTime {
        self.lock().next_value()
    }

    fn stamp(&self, naive: NaiveDateTime, offset: Option<FixedOffset>) -> Timestamp {
        Timestamp::new(naive, offset, self.flavour, self.date_flavour)
    }

    // Reading in the clock's zone converted to UTC.
    fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        match self.tzinfo {
            Some(zone) => shift(local, -i64::from(zone.local_minus_utc())),
            None => local,
        }
    }
}

// Out of range saturates at chrono's limits.
fn shift(value: NaiveDateTime, seconds: i64) -> NaiveDateTime {
    match value.checked_add_signed(TimeDelta::seconds(seconds)) {
        Some(shifted) => shifted,
        None => {
            let bound = if seconds < 0 {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            };
            tracing::warn!(?value, seconds, ?bound, "zone shift out of range, saturating");
            bound
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Timestamp {
        self.stamp(self.next_naive(), None)
    }

    fn now_in(&self, tz: FixedOffset) -> Timestamp {
        let local = self.next_naive();
        if self.tzinfo == Some(tz) {
            return self.stamp(local, Some(tz));
        }
        let utc = self.to_utc(local);
        self.stamp(shift(utc, i64::from(tz.local_minus_utc())), Some(tz))
    }

    fn utcnow(&self) -> Timestamp {
        let local = self.next_naive();
        self.stamp(self.to_utc(local), None)
    }
}
