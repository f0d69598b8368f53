use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::TempDirError;
use super::helpers::{atomic_write, remove_path};
use super::listing::{list, IgnoreSet, Listing};
use super::path::RelPath;
use super::registry::{install_exit_hook, Registry};

/// Prefix used for directories created under the OS temp dir.
pub const DEFAULT_PREFIX: &str = "fixturekit";

/// Options for [`TempDirectory::with_options`].
#[derive(Debug, Clone, Default)]
pub struct TempDirOptions {
    /// Manage this existing path instead of creating a directory. It is
    /// neither created nor removed.
    pub path: Option<PathBuf>,
    /// Regex patterns hiding matching path segments from listings.
    pub ignore: Vec<String>,
    pub prefix: Option<String>,
    /// Registry to track the directory in. Defaults to the global one.
    pub registry: Option<Arc<Registry>>,
}

impl TempDirOptions {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// A scratch directory whose every operation stays inside its root.
///
/// The directory is removed by [`cleanup`](TempDirectory::cleanup) or when
/// the value is dropped, whichever comes first. An instance that escapes
/// both (leaked, or alive at process exit) stays in the registry and is
/// reported by the exit hook.
///
/// ```
/// use fixturekit::tempdir::TempDirectory;
///
/// let d = TempDirectory::new().unwrap();
/// d.write("a/b/c", "data").unwrap();
/// assert_eq!(d.read_to_string("a/b/c").unwrap(), "data");
/// d.check_all("", ["a/", "a/b/", "a/b/c"]).unwrap();
/// ```
#[derive(Debug)]
pub struct TempDirectory {
    root: PathBuf,
    owned: bool,
    ignore: IgnoreSet,
    registry: Arc<Registry>,
    id: u64,
}

impl TempDirectory {
    /// Create a fresh directory tracked by the global registry.
    pub fn new() -> Result<Self, TempDirError> {
        TempDirectory::with_options(TempDirOptions::default())
    }

    pub fn with_options(options: TempDirOptions) -> Result<Self, TempDirError> {
        let ignore = IgnoreSet::new(&options.ignore)?;
        let registry = options.registry.unwrap_or_else(Registry::global);
        let (root, owned) = match options.path {
            Some(path) => (path, false),
            None => {
                let prefix = options.prefix.as_deref().unwrap_or(DEFAULT_PREFIX);
                let created = tempfile::Builder::new().prefix(prefix).tempdir()?;
                // Lifetime is managed here and by the registry, not by `tempfile`.
                #[allow(deprecated)]
                let root = created.into_path();
                tracing::debug!(path = %root.display(), "temp directory created");
                (root, true)
            }
        };
        if registry.is_global() {
            install_exit_hook();
        }
        let id = registry.register(root.clone(), owned);
        Ok(TempDirectory {
            root,
            owned,
            ignore,
            registry,
            id,
        })
    }

    /// Absolute path of the root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Whether this instance created the root (and will remove it).
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Whether this instance is still registered, i.e. not cleaned up yet.
    pub fn is_live(&self) -> bool {
        self.registry.contains(self.id)
    }

    /// Resolve `path` against the root. Nothing is checked on disk.
    pub fn getpath(&self, path: impl Into<RelPath>) -> Result<PathBuf, TempDirError> {
        path.into().resolve(&self.root)
    }

    /// Write `data` to `path`, creating parent directories. Returns the
    /// absolute path written.
    pub fn write(
        &self,
        path: impl Into<RelPath>,
        data: impl AsRef<[u8]>,
    ) -> Result<PathBuf, TempDirError> {
        let target = self.getpath(path)?;
        atomic_write(&target, data.as_ref())?;
        Ok(target)
    }

    /// Create a directory and its parents. Returns its absolute path.
    pub fn makedir(&self, path: impl Into<RelPath>) -> Result<PathBuf, TempDirError> {
        let target = self.getpath(path)?;
        fs::create_dir_all(&target)?;
        Ok(target)
    }

    /// Read a file as bytes.
    pub fn read(&self, path: impl Into<RelPath>) -> Result<Vec<u8>, TempDirError> {
        let target = self.getpath(path)?;
        fs::read(&target).map_err(|e| not_found_or_io(e, target))
    }

    /// Read a file as UTF-8 text.
    pub fn read_to_string(&self, path: impl Into<RelPath>) -> Result<String, TempDirError> {
        let target = self.getpath(path)?;
        fs::read_to_string(&target).map_err(|e| not_found_or_io(e, target))
    }

    /// List `path` (use `""` for the root), optionally recursively.
    pub fn listdir(
        &self,
        path: impl Into<RelPath>,
        recursive: bool,
    ) -> Result<Listing, TempDirError> {
        let dir = self.getpath(path)?;
        list(&dir, recursive, &self.ignore)
    }

    /// Compare the top level of the root with `expected`.
    pub fn check<I, S>(&self, expected: I) -> Result<(), TempDirError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compare(RelPath::root(), false, expected)
    }

    /// Compare the top level of `path` with `expected`.
    pub fn check_dir<I, S>(&self, path: impl Into<RelPath>, expected: I) -> Result<(), TempDirError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compare(path.into(), false, expected)
    }

    /// Compare everything beneath `path` with `expected`.
    pub fn check_all<I, S>(&self, path: impl Into<RelPath>, expected: I) -> Result<(), TempDirError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compare(path.into(), true, expected)
    }

    fn compare<I, S>(&self, path: RelPath, recursive: bool, expected: I) -> Result<(), TempDirError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Resolve before consuming `expected` so escapes win over mismatches.
        let actual = self.listdir(path, recursive)?.into_entries();
        let expected: Vec<String> = expected.into_iter().map(Into::into).collect();
        if expected == actual {
            Ok(())
        } else {
            Err(TempDirError::Mismatch { expected, actual })
        }
    }

    /// Unregister, and remove the root if this instance created it. Calling
    /// it again, or after a registry sweep, does nothing.
    pub fn cleanup(&self) -> Result<(), TempDirError> {
        let Some(record) = self.registry.unregister(self.id) else {
            return Ok(());
        };
        if record.owned {
            remove_path(&record.path)?;
            tracing::debug!(path = %record.path.display(), "temp directory removed");
        }
        Ok(())
    }

    /// Sweep the global registry. See [`Registry::cleanup_all`].
    pub fn cleanup_all() -> usize {
        Registry::global().cleanup_all()
    }
}

impl Drop for TempDirectory {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(path = %self.root.display(), error = %e, "temp directory cleanup failed");
        }
    }
}

fn not_found_or_io(e: io::Error, target: PathBuf) -> TempDirError {
    if e.kind() == io::ErrorKind::NotFound {
        TempDirError::NotFound(target)
    } else {
        TempDirError::Io(e)
    }
}
