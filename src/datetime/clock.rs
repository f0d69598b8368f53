//! The time-source port and its production adapter.
//!
//! Code that needs the current time takes a `Clock` (generic parameter or
//! `Arc<dyn Clock>`) instead of calling chrono directly. Production passes
//! `SystemClock`; tests pass a `FakeClock`.

use std::fmt::Debug;

use chrono::{FixedOffset, Local, Utc};

use super::stamp::{Datestamp, Timestamp};

/// Source of "current time" readings.
pub trait Clock: Send + Sync + Debug {
    /// Local wall-clock reading, without an offset.
    fn now(&self) -> Timestamp;

    /// The current instant expressed in `tz`, carrying that offset.
    fn now_in(&self, tz: FixedOffset) -> Timestamp;

    /// The current instant as a naive UTC reading.
    fn utcnow(&self) -> Timestamp;

    /// Date part of `now()`.
    fn today(&self) -> Datestamp {
        self.now().date()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::native(Local::now().naive_local())
    }

    fn now_in(&self, tz: FixedOffset) -> Timestamp {
        Timestamp::native_aware(Utc::now().with_timezone(&tz))
    }

    fn utcnow(&self) -> Timestamp {
        Timestamp::native(Utc::now().naive_utc())
    }
}
