//! Scoped temporary directories.
//!
//! [`TempDirectory`] owns a scratch directory and offers write, read, list
//! and check operations that refuse to leave its root. Live directories are
//! tracked by a [`Registry`] so forgotten ones can be swept or reported at
//! process exit.

pub mod directory;
pub mod error;
pub mod helpers;
pub mod listing;
pub mod path;
pub mod registry;

pub use directory::{TempDirOptions, TempDirectory, DEFAULT_PREFIX};
pub use error::TempDirError;
pub use listing::{IgnoreSet, Listing};
pub use path::RelPath;
pub use registry::{
    exit_hook_installed, install_exit_hook, report_leaks, RegisteredDir, Registry,
};
