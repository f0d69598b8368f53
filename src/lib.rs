//! Test fixtures: fake clocks, scoped temporary directories and scoped
//! replacement of process-wide bindings.

pub mod datetime;
pub mod errors;
pub mod logging;
pub mod replace;
pub mod settings;
pub mod tempdir;

pub use crate::datetime::{Clock, FakeClock, FakeDateSource, FakeTimeSource, SystemClock};
pub use crate::errors::{Error, Result};
pub use crate::replace::{Replacer, Slot};
pub use crate::settings::{load_settings, Settings};
pub use crate::tempdir::{TempDirOptions, TempDirectory};
