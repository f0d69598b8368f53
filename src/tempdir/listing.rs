use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

use super::error::TempDirError;

/// Regex patterns matched against every path segment. A match on any
/// segment hides that entry and, for directories, everything beneath it.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Regex>,
}

impl IgnoreSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, TempDirError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| TempDirError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IgnoreSet { patterns })
    }

    /// Search semantics: the pattern may match anywhere in the segment.
    pub fn matches(&self, segment: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(segment))
    }

    /// True when any segment of `rel` matches.
    pub fn hides(&self, rel: &Path) -> bool {
        rel.iter().any(|seg| self.matches(&seg.to_string_lossy()))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Sorted directory listing. Directory entries end in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    entries: Vec<String>,
}

impl Listing {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No files or directories found.");
        }
        write!(f, "{}", self.entries.join("\n"))
    }
}

/// Walk `dir` and return its entries relative to `dir`, filtered by
/// `ignore` and sorted byte-wise.
pub fn list(dir: &Path, recursive: bool, ignore: &IgnoreSet) -> Result<Listing, TempDirError> {
    match fs::metadata(dir) {
        Ok(md) if !md.is_dir() => return Err(TempDirError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TempDirError::NotFound(dir.to_path_buf()))
        }
        Err(e) => return Err(TempDirError::Io(e)),
        Ok(_) => {}
    }
    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        // Depth 0 is `dir` itself; its name is not part of the listing.
        .filter_entry(|e| e.depth() == 0 || !ignore.matches(&e.file_name().to_string_lossy()));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| TempDirError::Io(io::Error::other(e)))?;
        let mut name = rel
            .iter()
            .map(|seg| seg.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();
    Ok(Listing { entries })
}

fn walk_error(dir: &Path, e: walkdir::Error) -> TempDirError {
    let missing = e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound);
    if missing && e.depth() == 0 {
        return TempDirError::NotFound(dir.to_path_buf());
    }
    TempDirError::Io(io::Error::from(e))
}
