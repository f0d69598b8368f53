use thiserror::Error;

use crate::datetime::ClockError;
use crate::settings::SettingsError;
use crate::tempdir::TempDirError;

/// Any error produced by this crate. Handy for tests that mix clocks,
/// directories and settings and want a single `?`.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    TempDir(#[from] TempDirError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
