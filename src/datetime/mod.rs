//! Controllable time sources.
//!
//! - [`Clock`] is the port code under test should read time through.
//! - [`SystemClock`] is the real adapter.
//! - [`FakeClock`], [`FakeDateSource`] and [`FakeTimeSource`] serve
//!   readings from a queue the test fills with `add`/`set`.
//!
//! Code that cannot take a clock parameter can read the process-wide
//! [`CLOCK`] slot instead; tests swap it with a `Replacer`.

pub mod clock;
pub mod date;
pub mod error;
pub mod fake;
pub mod input;
pub mod queue;
pub mod stamp;
pub mod time;

use std::sync::Arc;

pub use clock::{Clock, SystemClock};
pub use date::{FakeDateConfig, FakeDateSource};
pub use error::{ClockError, QueueOp};
pub use fake::{FakeClock, FakeClockConfig};
pub use input::{ClockInput, Components};
pub use queue::{DeltaUnit, TimeQueue};
pub use stamp::{Datestamp, Flavour, Timestamp};
pub use time::{FakeTimeConfig, FakeTimeSource};

use crate::replace::Slot;

/// Shared handle to any clock.
pub type SharedClock = Arc<dyn Clock>;

fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Process-wide clock used by [`now`]. Holds `SystemClock` unless a test
/// replaced it.
pub static CLOCK: Slot<SharedClock> = Slot::new("fixturekit.datetime.CLOCK", system_clock);

/// Read the process-wide clock.
pub fn now() -> Timestamp {
    CLOCK.get().now()
}

/// Read the process-wide clock as UTC.
pub fn utcnow() -> Timestamp {
    CLOCK.get().utcnow()
}
