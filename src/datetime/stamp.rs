//! Values handed out by clocks.
//!
//! A `Timestamp` always converts to chrono's `NaiveDateTime` (and a
//! `Datestamp` to `NaiveDate`), so code that only needs the chrono value
//! keeps working whichever clock produced it. The `Flavour` records where
//! the value came from, which lets tests tell a real reading apart from a
//! fake one.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

/// Provenance of a clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavour {
    /// A real reading, as produced by `SystemClock`.
    #[default]
    Native,
    /// Produced by a non-strict fake.
    Lightweight,
    /// Produced by a strict fake. Never passes a native-identity check.
    Strict,
}

impl Flavour {
    /// Flavour handed out by a fake clock.
    pub fn for_fake(strict: bool) -> Self {
        if strict {
            Flavour::Strict
        } else {
            Flavour::Lightweight
        }
    }
}

/// A date and time reading, optionally with the offset it was read in.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    naive: NaiveDateTime,
    offset: Option<FixedOffset>,
    flavour: Flavour,
    date_flavour: Flavour,
}

impl Timestamp {
    pub(crate) fn new(
        naive: NaiveDateTime,
        offset: Option<FixedOffset>,
        flavour: Flavour,
        date_flavour: Flavour,
    ) -> Self {
        Timestamp {
            naive,
            offset,
            flavour,
            date_flavour,
        }
    }

    /// Wrap a real chrono value.
    pub fn native(naive: NaiveDateTime) -> Self {
        Timestamp::new(naive, None, Flavour::Native, Flavour::Native)
    }

    /// Wrap a real zone-aware chrono value.
    pub fn native_aware<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        let fixed = dt.fixed_offset();
        Timestamp::new(
            fixed.naive_local(),
            Some(*fixed.offset()),
            Flavour::Native,
            Flavour::Native,
        )
    }

    /// Local wall-clock reading, without the offset.
    pub fn naive(&self) -> NaiveDateTime {
        self.naive
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    /// True only for values that came from the real clock.
    pub fn is_native(&self) -> bool {
        self.flavour == Flavour::Native
    }

    pub fn is_strict(&self) -> bool {
        self.flavour == Flavour::Strict
    }

    /// The zone-aware value, when the reading carries an offset.
    pub fn to_aware(&self) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset?;
        offset.from_local_datetime(&self.naive).single()
    }

    /// Date part, in the date flavour of the clock that produced this value.
    pub fn date(&self) -> Datestamp {
        Datestamp::new(self.naive.date(), self.date_flavour)
    }
}

impl Deref for Timestamp {
    type Target = NaiveDateTime;

    fn deref(&self) -> &NaiveDateTime {
        &self.naive
    }
}

impl From<Timestamp> for NaiveDateTime {
    fn from(ts: Timestamp) -> Self {
        ts.naive
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Timestamp::native(naive)
    }
}

// Equality compares the reading only. Flavour is provenance, not value.
impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.naive == other.naive && self.offset == other.offset
    }
}

impl Eq for Timestamp {}

impl PartialEq<NaiveDateTime> for Timestamp {
    fn eq(&self, other: &NaiveDateTime) -> bool {
        self.offset.is_none() && self.naive == *other
    }
}

impl PartialEq<DateTime<FixedOffset>> for Timestamp {
    fn eq(&self, other: &DateTime<FixedOffset>) -> bool {
        self.offset == Some(*other.offset()) && self.naive == other.naive_local()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} {}", self.naive, offset),
            None => write!(f, "{}", self.naive),
        }
    }
}

/// A calendar date reading.
#[derive(Debug, Clone, Copy)]
pub struct Datestamp {
    date: NaiveDate,
    flavour: Flavour,
}

impl Datestamp {
    pub(crate) fn new(date: NaiveDate, flavour: Flavour) -> Self {
        Datestamp { date, flavour }
    }

    pub fn native(date: NaiveDate) -> Self {
        Datestamp::new(date, Flavour::Native)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    pub fn is_native(&self) -> bool {
        self.flavour == Flavour::Native
    }

    pub fn is_strict(&self) -> bool {
        self.flavour == Flavour::Strict
    }
}

impl Deref for Datestamp {
    type Target = NaiveDate;

    fn deref(&self) -> &NaiveDate {
        &self.date
    }
}

impl From<Datestamp> for NaiveDate {
    fn from(ds: Datestamp) -> Self {
        ds.date
    }
}

impl PartialEq for Datestamp {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl Eq for Datestamp {}

impl PartialEq<NaiveDate> for Datestamp {
    fn eq(&self, other: &NaiveDate) -> bool {
        self.date == *other
    }
}

impl fmt::Display for Datestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2001, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn equality_ignores_flavour() {
        let real = Timestamp::native(dt(1, 0));
        let fake = Timestamp::new(dt(1, 0), None, Flavour::Strict, Flavour::Native);
        assert_eq!(real, fake);
        assert!(real.is_native());
        assert!(!fake.is_native());
        assert!(fake.is_strict());
    }

    #[test]
    fn derefs_to_chrono() {
        let ts = Timestamp::new(dt(3, 4), None, Flavour::Lightweight, Flavour::Native);
        assert_eq!(ts.hour(), 3);
        assert_eq!(ts.minute(), 4);
        assert_eq!(ts, dt(3, 4));
        let plain: NaiveDateTime = ts.into();
        assert_eq!(plain, dt(3, 4));
    }

    #[test]
    fn aware_values_compare_with_offset() {
        let offset = FixedOffset::east_opt(4 * 60).unwrap();
        let ts = Timestamp::new(dt(0, 4), Some(offset), Flavour::Lightweight, Flavour::Native);
        let expected = offset.from_local_datetime(&dt(0, 4)).unwrap();
        assert_eq!(ts, expected);
        assert_eq!(ts.to_aware(), Some(expected));
        // An aware reading never equals a naive one.
        assert_ne!(ts, dt(0, 4));
        assert_eq!(ts.to_string(), "2001-01-01 00:04:00 +00:04");
    }

    #[test]
    fn date_uses_date_flavour() {
        let ts = Timestamp::new(dt(0, 0), None, Flavour::Strict, Flavour::Native);
        assert!(ts.date().is_native());
        let ts = Timestamp::new(dt(0, 0), None, Flavour::Strict, Flavour::Strict);
        assert!(ts.date().is_strict());
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());
    }
}
