//! Scoped replacement of named bindings and environment variables.
//!
//! A `Slot` is a process-wide binding that tests are allowed to swap. It
//! is declared `static` next to the code that reads it. The original value
//! is snapshotted when a replacement is installed and put back when the
//! guard (or the `Replacer`) goes out of scope, including during a panic
//! unwind.
//!
//! ```
//! use fixturekit::replace::{Replacer, Slot};
//!
//! static GREETING: Slot<&'static str> = Slot::new("app.greeting", || "hello");
//!
//! {
//!     let mut r = Replacer::new();
//!     r.replace(&GREETING, "bonjour");
//!     assert_eq!(GREETING.get(), "bonjour");
//! }
//! assert_eq!(GREETING.get(), "hello");
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A named, replaceable, process-wide binding.
///
/// The value is created lazily by `init` on first access. Slots are meant
/// for serial test execution: concurrent replacements of the same slot
/// from several threads are not coordinated.
pub struct Slot<T> {
    name: &'static str,
    init: fn() -> T,
    value: Mutex<Option<T>>,
}

impl<T: Clone> Slot<T> {
    /// `name` is the dotted target name reported in logs and by
    /// `Replacer::targets`.
    pub const fn new(name: &'static str, init: fn() -> T) -> Self {
        Slot {
            name,
            init,
            value: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.lock().get_or_insert_with(self.init).clone()
    }

    /// Install `value` until the returned guard is dropped.
    #[must_use = "the original value is restored as soon as the guard is dropped"]
    pub fn replace(&self, value: T) -> SlotGuard<'_, T> {
        let previous = self.swap(Some(value));
        tracing::debug!(target_name = self.name, "slot replaced");
        SlotGuard {
            slot: self,
            previous: Some(previous),
        }
    }

    // Returns the raw previous state so restoring puts back exactly what
    // was there, including "never initialised".
    fn swap(&self, value: Option<T>) -> Option<T> {
        std::mem::replace(&mut *self.lock(), value)
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("name", &self.name).finish()
    }
}

/// Restores a `Slot` to its previous value on drop.
pub struct SlotGuard<'a, T: Clone> {
    slot: &'a Slot<T>,
    previous: Option<Option<T>>,
}

impl<T: Clone> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.slot.swap(previous);
            tracing::debug!(target_name = self.slot.name, "slot restored");
        }
    }
}

type Restore = Box<dyn FnOnce() + Send>;

/// Collects replacements and undoes them in reverse order.
#[derive(Default)]
pub struct Replacer {
    restores: Vec<(String, Restore)>,
}

impl Replacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of a static slot.
    pub fn replace<T>(&mut self, slot: &'static Slot<T>, value: T)
    where
        T: Clone + Send + 'static,
    {
        let previous = slot.swap(Some(value));
        tracing::debug!(target_name = slot.name(), "slot replaced");
        self.restores.push((
            slot.name().to_string(),
            Box::new(move || {
                slot.swap(previous);
            }),
        ));
    }

    /// Set an environment variable for the lifetime of this replacer.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl AsRef<OsStr>) {
        let key = key.into();
        let previous = std::env::var_os(&key);
        std::env::set_var(&key, value);
        self.push_env_restore(key, previous);
    }

    /// Remove an environment variable for the lifetime of this replacer.
    pub fn remove_env(&mut self, key: impl Into<String>) {
        let key = key.into();
        let previous = std::env::var_os(&key);
        std::env::remove_var(&key);
        self.push_env_restore(key, previous);
    }

    fn push_env_restore(&mut self, key: String, previous: Option<OsString>) {
        let name = format!("env.{}", key);
        self.restores.push((
            name,
            Box::new(move || match previous {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }),
        ));
    }

    /// Names of everything currently replaced, oldest first.
    pub fn targets(&self) -> Vec<&str> {
        self.restores.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Put every original back, newest replacement first. Safe to call
    /// more than once.
    pub fn restore(&mut self) {
        while let Some((name, undo)) = self.restores.pop() {
            undo();
            tracing::debug!(target_name = %name, "restored");
        }
    }
}

impl Drop for Replacer {
    fn drop(&mut self) {
        self.restore();
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacer")
            .field("targets", &self.targets())
            .finish()
    }
}
