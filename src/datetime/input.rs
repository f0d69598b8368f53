use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use super::error::{ClockError, QueueOp};
use super::stamp::Timestamp;

/// Date and time given field by field.
///
/// ```
/// use fixturekit::datetime::Components;
///
/// let c = Components::ymd(2002, 1, 1).hms(1, 2, 3);
/// assert_eq!(c.to_naive().unwrap().to_string(), "2002-01-01 01:02:03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
    pub tzinfo: Option<FixedOffset>,
}

impl Components {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Components {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            microsecond: 0,
            tzinfo: None,
        }
    }

    pub fn hms(mut self, hour: u32, minute: u32, second: u32) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    pub fn microsecond(mut self, microsecond: u32) -> Self {
        self.microsecond = microsecond;
        self
    }

    pub fn tz(mut self, offset: FixedOffset) -> Self {
        self.tzinfo = Some(offset);
        self
    }

    /// Build the naive value, ignoring `tzinfo`.
    pub fn to_naive(&self) -> Result<NaiveDateTime, ClockError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| {
                d.and_hms_micro_opt(self.hour, self.minute, self.second, self.microsecond)
            })
            .ok_or_else(|| ClockError::InvalidComponents(format!("{:?}", self)))
    }
}

impl From<NaiveDate> for Components {
    fn from(d: NaiveDate) -> Self {
        use chrono::Datelike;
        Components::ymd(d.year(), d.month(), d.day())
    }
}

/// Anything accepted by `add`/`set` on a fake clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockInput {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
    Parts(Components),
}

impl ClockInput {
    /// Reduce to the naive instant to queue, enforcing the zone rules.
    pub(crate) fn resolve(self, op: QueueOp) -> Result<NaiveDateTime, ClockError> {
        match self {
            ClockInput::Naive(naive) => Ok(naive),
            ClockInput::Aware(_) => Err(ClockError::InstantHasZone { op }),
            ClockInput::Parts(parts) if parts.tzinfo.is_some() => {
                Err(ClockError::ZoneArgument { op })
            }
            ClockInput::Parts(parts) => parts.to_naive(),
        }
    }
}

impl From<NaiveDateTime> for ClockInput {
    fn from(naive: NaiveDateTime) -> Self {
        ClockInput::Naive(naive)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ClockInput {
    fn from(dt: DateTime<Tz>) -> Self {
        ClockInput::Aware(dt.fixed_offset())
    }
}

impl From<Components> for ClockInput {
    fn from(parts: Components) -> Self {
        ClockInput::Parts(parts)
    }
}

impl From<Timestamp> for ClockInput {
    fn from(ts: Timestamp) -> Self {
        match ts.to_aware() {
            Some(aware) => ClockInput::Aware(aware),
            None => ClockInput::Naive(ts.naive()),
        }
    }
}
