//! Registry of live temporary directories.
//!
//! Every `TempDirectory` registers itself on creation and unregisters on
//! cleanup. Whatever is still registered can be swept with `cleanup_all`
//! or reported as leaked by `atexit`.
//!
//! Most callers use the process-wide registry returned by
//! [`Registry::global`]. A test harness that wants isolation can build its
//! own and pass it through `TempDirOptions::registry`. The registry is
//! meant for serial test execution; the internal lock only keeps the
//! bookkeeping consistent and does not order concurrent users.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use super::helpers::remove_path;

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static EXIT_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Registry record for one live directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDir {
    pub id: u64,
    pub path: PathBuf,
    /// Whether the directory was created by its `TempDirectory` and so
    /// may be removed.
    pub owned: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<BTreeMap<u64, RegisteredDir>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Registry> {
        Arc::clone(&*GLOBAL)
    }

    /// True when `self` is the process-wide registry.
    pub fn is_global(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(&*GLOBAL))
    }

    pub fn register(&self, path: PathBuf, owned: bool) -> u64 {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, path = %path.display(), owned, "temp directory registered");
        self.lock().insert(id, RegisteredDir { id, path, owned });
        id
    }

    /// Remove the record for `id`. `None` means it was already gone.
    pub fn unregister(&self, id: u64) -> Option<RegisteredDir> {
        self.lock().remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    /// Snapshot of everything registered, oldest first.
    pub fn live(&self) -> Vec<RegisteredDir> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Unregister everything and remove the directories that were created
    /// by their instances. Returns how many records were swept.
    ///
    /// Removal failures are logged, not returned: the sweep always empties
    /// the registry.
    pub fn cleanup_all(&self) -> usize {
        let swept = std::mem::take(&mut *self.lock());
        for dir in swept.values() {
            if !dir.owned {
                continue;
            }
            if let Err(e) = remove_path(&dir.path) {
                tracing::warn!(path = %dir.path.display(), error = %e, "failed to remove temp directory");
            }
        }
        tracing::debug!(count = swept.len(), "temp directory registry swept");
        swept.len()
    }

    /// One message per directory that is still registered.
    pub fn leak_warnings(&self) -> Vec<String> {
        self.lock()
            .values()
            .map(|dir| {
                format!(
                    "TempDirectory instances not cleaned up by shutdown:\n{}",
                    dir.path.display()
                )
            })
            .collect()
    }

    /// Exit-time check. Emits one warning per leaked directory and returns
    /// the messages. Nothing is removed, so running it twice reports the
    /// same leaks again and is otherwise harmless.
    pub fn atexit(&self) -> Vec<String> {
        let warnings = self.leak_warnings();
        for message in &warnings {
            tracing::warn!("{}", message);
        }
        warnings
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, RegisteredDir>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write one `warning:` line per leaked directory to `out`. Returns how
/// many were reported. Write failures are ignored.
pub fn report_leaks(registry: &Registry, out: &mut impl Write) -> usize {
    let warnings = registry.leak_warnings();
    for message in &warnings {
        let _ = writeln!(out, "warning: {}", message);
    }
    let _ = out.flush();
    warnings.len()
}

// Runs after thread-local destructors, so it must not go through a
// tracing subscriber, and must not unwind.
extern "C" fn run_exit_hook() {
    let _ = std::panic::catch_unwind(|| {
        report_leaks(&GLOBAL, &mut io::stderr());
    });
}

/// Arrange for the global registry's leaks to be reported on stderr when
/// the process exits normally. Only the first call registers the hook; it
/// returns `true` when this call did the registering.
pub fn install_exit_hook() -> bool {
    if EXIT_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }
    // SAFETY: `run_exit_hook` is a plain `extern "C"` function that takes
    // no arguments and does not unwind.
    let rc = unsafe { libc::atexit(run_exit_hook) };
    if rc != 0 {
        tracing::warn!(rc, "could not register temp directory exit hook");
        EXIT_HOOK_INSTALLED.store(false, Ordering::SeqCst);
        return false;
    }
    true
}

pub fn exit_hook_installed() -> bool {
    EXIT_HOOK_INSTALLED.load(Ordering::SeqCst)
}
