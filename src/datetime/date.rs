//! Fake source of "today".

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use super::fake::default_start;
use super::queue::{DeltaUnit, TimeQueue};
use super::stamp::{Datestamp, Flavour};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDateConfig {
    pub start: Option<NaiveDate>,
    pub delta: Option<i64>,
    pub delta_type: DeltaUnit,
    pub strict: bool,
}

impl Default for FakeDateConfig {
    fn default() -> Self {
        FakeDateConfig {
            start: Some(default_start().date()),
            delta: None,
            delta_type: DeltaUnit::Days,
            strict: false,
        }
    }
}

/// Queue-backed `today()`. Gap rules match `FakeClock`, counted in days
/// unless configured otherwise.
#[derive(Debug, Clone)]
pub struct FakeDateSource {
    queue: Arc<Mutex<TimeQueue<NaiveDate>>>,
    flavour: Flavour,
}

impl Default for FakeDateSource {
    fn default() -> Self {
        FakeDateSource::new()
    }
}

impl FakeDateSource {
    pub fn new() -> Self {
        FakeDateSource::with_config(FakeDateConfig::default())
    }

    pub fn empty() -> Self {
        FakeDateSource::with_config(FakeDateConfig {
            start: None,
            ..FakeDateConfig::default()
        })
    }

    pub fn with_config(config: FakeDateConfig) -> Self {
        let fallback = config.start.unwrap_or_else(|| default_start().date());
        FakeDateSource {
            queue: Arc::new(Mutex::new(TimeQueue::new(
                config.start,
                fallback,
                config.delta,
                config.delta_type,
            ))),
            flavour: Flavour::for_fake(config.strict),
        }
    }

    pub fn today(&self) -> Datestamp {
        Datestamp::new(self.lock().next_value(), self.flavour)
    }

    pub fn add(&self, date: impl Into<NaiveDate>) {
        self.lock().push(date.into());
    }

    pub fn set(&self, date: impl Into<NaiveDate>) {
        self.lock().reset(date.into());
    }

    /// A date of this source's flavour; the queue is left alone.
    pub fn construct(&self, date: NaiveDate) -> Datestamp {
        Datestamp::new(date, self.flavour)
    }

    fn lock(&self) -> MutexGuard<'_, TimeQueue<NaiveDate>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_sequence_grows_in_days() {
        let source = FakeDateSource::new();
        assert_eq!(source.today(), ymd(2001, 1, 1));
        assert_eq!(source.today(), ymd(2001, 1, 11));
        assert_eq!(source.today(), ymd(2001, 1, 31));
    }

    #[test]
    fn add_then_set() {
        let source = FakeDateSource::with_config(FakeDateConfig {
            start: None,
            delta: Some(1),
            strict: true,
            ..FakeDateConfig::default()
        });
        source.add(ymd(2002, 1, 1));
        source.add(ymd(2002, 1, 2));
        source.set(ymd(2002, 3, 1));
        let today = source.today();
        assert_eq!(today, ymd(2002, 3, 1));
        assert!(today.is_strict());
        assert_eq!(source.today(), ymd(2002, 3, 2));
    }
}
