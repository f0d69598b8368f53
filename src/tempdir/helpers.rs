use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Write `data` to `target` atomically by writing to a temporary file in the
/// same directory and then renaming into place. Parent directories are
/// created as needed.
pub fn atomic_write(target: &Path, data: &[u8]) -> io::Result<()> {
    let Some(dir) = target.parent() else {
        // no parent: write directly
        return fs::write(target, data);
    };
    fs::create_dir_all(dir)?;

    // pid + process-wide sequence keeps concurrent writers apart.
    static NEXT_WRITE_ID: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT_WRITE_ID.fetch_add(1, Ordering::Relaxed);
    let tmp = dir.join(format!(
        ".tmp_atomic_write.{:x}.{:x}",
        std::process::id(),
        seq
    ));

    // If any step fails, remove the temp file so it does not show up in listings.
    if let Err(e) = fs::write(&tmp, data) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, target).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// Remove a file or directory at `path`.
///
/// Directories are removed recursively. A path that does not exist is
/// treated as already removed.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
        Ok(md) if md.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp_files() {
        let td = tempdir().unwrap();
        let dir = td.path().join("a/b");
        let file = dir.join("f.txt");
        atomic_write(&file, b"hello").unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"hello");

        let leftovers = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp_atomic_write."))
            .count();
        assert_eq!(leftovers, 0, "found leftover atomic temp files");
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let td = tempdir().unwrap();
        let file = td.path().join("f.txt");
        atomic_write(&file, b"one").unwrap();
        atomic_write(&file, b"two").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "two");
    }

    #[test]
    fn remove_path_takes_whole_tree_and_tolerates_repeats() {
        let td = tempdir().unwrap();
        let root = td.path().join("scratch");
        atomic_write(&root.join("a/b/c"), b"deep").unwrap();
        atomic_write(&root.join("top"), b"shallow").unwrap();

        remove_path(&root.join("top")).unwrap();
        assert!(root.join("a").is_dir());
        remove_path(&root).unwrap();
        assert!(!root.exists());
        // A second sweep of the same path is a no-op.
        remove_path(&root).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn remove_path_does_not_follow_directory_symlinks() {
        let td = tempdir().unwrap();
        let target = td.path().join("target");
        atomic_write(&target.join("kept"), b"x").unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_path(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.join("kept").is_file());
    }
}
