//! Fake source of epoch seconds.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;

use super::error::{ClockError, QueueOp};
use super::fake::default_start;
use super::input::ClockInput;
use super::queue::{DeltaUnit, TimeQueue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeTimeConfig {
    pub start: Option<NaiveDateTime>,
    pub delta: Option<i64>,
    pub delta_type: DeltaUnit,
}

impl Default for FakeTimeConfig {
    fn default() -> Self {
        FakeTimeConfig {
            start: Some(default_start()),
            delta: None,
            delta_type: DeltaUnit::Seconds,
        }
    }
}

/// Queue-backed replacement for reading the system time as float seconds
/// since the Unix epoch. Queued instants are read as UTC.
#[derive(Debug, Clone)]
pub struct FakeTimeSource {
    queue: Arc<Mutex<TimeQueue<NaiveDateTime>>>,
}

impl Default for FakeTimeSource {
    fn default() -> Self {
        FakeTimeSource::new()
    }
}

impl FakeTimeSource {
    pub fn new() -> Self {
        FakeTimeSource::with_config(FakeTimeConfig::default())
    }

    pub fn empty() -> Self {
        FakeTimeSource::with_config(FakeTimeConfig {
            start: None,
            ..FakeTimeConfig::default()
        })
    }

    pub fn with_config(config: FakeTimeConfig) -> Self {
        FakeTimeSource {
            queue: Arc::new(Mutex::new(TimeQueue::new(
                config.start,
                config.start.unwrap_or_else(default_start),
                config.delta,
                config.delta_type,
            ))),
        }
    }

    /// Seconds since the epoch, with microsecond precision.
    pub fn time(&self) -> f64 {
        let utc = self.lock().next_value().and_utc();
        utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) / 1_000_000.0
    }

    pub fn add(&self, input: impl Into<ClockInput>) -> Result<(), ClockError> {
        let naive = input.into().resolve(QueueOp::Add)?;
        self.lock().push(naive);
        Ok(())
    }

    pub fn set(&self, input: impl Into<ClockInput>) -> Result<(), ClockError> {
        let naive = input.into().resolve(QueueOp::Set)?;
        self.lock().reset(naive);
        Ok(())
    }

    /// Queue a raw epoch reading.
    pub fn add_seconds(&self, seconds: f64) -> Result<(), ClockError> {
        let naive = from_epoch_seconds(seconds)?;
        self.lock().push(naive);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, TimeQueue<NaiveDateTime>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn from_epoch_seconds(seconds: f64) -> Result<NaiveDateTime, ClockError> {
    if !seconds.is_finite() {
        return Err(ClockError::Overflow(seconds.to_string()));
    }
    let whole = seconds.floor();
    let micros = ((seconds - whole) * 1_000_000.0).round() as u32;
    chrono::DateTime::from_timestamp(whole as i64, micros.min(999_999) * 1_000)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| ClockError::Overflow(seconds.to_string()))
}
