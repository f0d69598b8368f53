use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by `TempDirectory` and its registry.
#[derive(Error, Debug)]
pub enum TempDirError {
    /// A path argument resolved outside the managed root.
    #[error("Attempt to read or write outside the temporary Directory")]
    PathEscape { path: String },

    /// The target of a read or listing does not exist.
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    /// A listing was requested for something that is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A `check*` call found a listing different from the expected one.
    #[error(
        "listing not as expected:\n\nexpected:\n{}\n\nactual:\n{}",
        format_sequence(.expected),
        format_sequence(.actual)
    )]
    Mismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// An ignore pattern is not a valid regular expression.
    #[error("invalid ignore pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Wrapper for underlying IO errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_sequence(items: &[String]) -> String {
    if items.is_empty() {
        return "  (nothing)".to_string();
    }
    items
        .iter()
        .map(|item| format!("  {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
