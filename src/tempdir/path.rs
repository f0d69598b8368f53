use std::path::{Component, Path, PathBuf};

use super::error::TempDirError;

/// A path relative to a `TempDirectory` root.
///
/// It can be built from a string with `/` or `\` separators, from a
/// `Path`, or from a sequence of segments:
///
/// ```
/// use fixturekit::tempdir::RelPath;
///
/// assert_eq!(RelPath::from("a/b/c"), RelPath::from(["a", "b", "c"]));
/// assert_eq!(RelPath::from(""), RelPath::root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelPath {
    raw: String,
    absolute: bool,
    segments: Vec<String>,
}

impl RelPath {
    /// The root itself.
    pub fn root() -> Self {
        RelPath::default()
    }

    fn parse(raw: &str) -> Self {
        let absolute = raw.starts_with(['/', '\\']) || Path::new(raw).has_root() || has_prefix(raw);
        let segments = raw
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        RelPath {
            raw: raw.to_string(),
            absolute,
            segments,
        }
    }

    /// Normalised segments. `.` is dropped and `..` climbs one level.
    /// Fails when the path is absolute or climbs above the root.
    pub fn normalized(&self) -> Result<Vec<String>, TempDirError> {
        if self.absolute {
            return Err(self.escape());
        }
        let mut stack: Vec<String> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            match seg.as_str() {
                "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        return Err(self.escape());
                    }
                }
                _ => stack.push(seg.clone()),
            }
        }
        Ok(stack)
    }

    /// Resolve against `root`. No filesystem access.
    pub fn resolve(&self, root: &Path) -> Result<PathBuf, TempDirError> {
        let mut out = root.to_path_buf();
        out.extend(self.normalized()?);
        Ok(out)
    }

    fn escape(&self) -> TempDirError {
        TempDirError::PathEscape {
            path: self.raw.clone(),
        }
    }
}

// Drive-letter prefixes (`C:foo`) are absolute enough to escape the root.
fn has_prefix(raw: &str) -> bool {
    matches!(Path::new(raw).components().next(), Some(Component::Prefix(_)))
}

impl From<&str> for RelPath {
    fn from(s: &str) -> Self {
        RelPath::parse(s)
    }
}

impl From<String> for RelPath {
    fn from(s: String) -> Self {
        RelPath::parse(&s)
    }
}

impl From<&String> for RelPath {
    fn from(s: &String) -> Self {
        RelPath::parse(s)
    }
}

impl From<&Path> for RelPath {
    fn from(p: &Path) -> Self {
        RelPath::parse(&p.to_string_lossy())
    }
}

impl From<&PathBuf> for RelPath {
    fn from(p: &PathBuf) -> Self {
        RelPath::from(p.as_path())
    }
}

impl From<&[&str]> for RelPath {
    fn from(segments: &[&str]) -> Self {
        RelPath::parse(&segments.join("/"))
    }
}

impl<const N: usize> From<[&str; N]> for RelPath {
    fn from(segments: [&str; N]) -> Self {
        RelPath::parse(&segments.join("/"))
    }
}

impl From<Vec<&str>> for RelPath {
    fn from(segments: Vec<&str>) -> Self {
        RelPath::parse(&segments.join("/"))
    }
}

impl From<Vec<String>> for RelPath {
    fn from(segments: Vec<String>) -> Self {
        RelPath::parse(&segments.join("/"))
    }
}
