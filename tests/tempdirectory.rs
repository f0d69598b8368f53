use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use assert_fs::prelude::*;
use predicates::prelude::*;

use fixturekit::tempdir::{Registry, TempDirError, TempDirOptions, TempDirectory};

fn isolated(options: TempDirOptions) -> (Arc<Registry>, TempDirectory) {
    let registry = Arc::new(Registry::new());
    let d = TempDirectory::with_options(options.registry(Arc::clone(&registry))).unwrap();
    (registry, d)
}

fn assert_escape<T: std::fmt::Debug>(result: Result<T, TempDirError>) {
    let err = result.unwrap_err();
    assert!(matches!(err, TempDirError::PathEscape { .. }), "{err:?}");
    assert_eq!(
        err.to_string(),
        "Attempt to read or write outside the temporary Directory"
    );
}

#[test]
fn write_then_read() -> fixturekit::Result<()> {
    fixturekit::logging::init_test_logging();
    let d = TempDirectory::new()?;
    let written = d.write("something", "stuff")?;
    assert_eq!(written, d.path().join("something"));
    assert_eq!(d.read("something")?, b"stuff");
    assert_eq!(d.read_to_string(["something"])?, "stuff");
    Ok(())
}

#[test]
fn write_creates_parents() {
    let d = TempDirectory::new().unwrap();
    d.write("a/b/c", "data").unwrap();
    d.write(["a", "d"], b"more").unwrap();
    d.check_all("", ["a/", "a/b/", "a/b/c", "a/d"]).unwrap();
    d.check_dir(["a", "b"], ["c"]).unwrap();
}

#[test]
fn listing_is_sorted() {
    let d = TempDirectory::new().unwrap();
    for name in ["ga", "foo1", "Foo2", "g.o"] {
        d.write(name, "").unwrap();
    }
    d.check(["Foo2", "foo1", "g.o", "ga"]).unwrap();
}

#[test]
fn check_reports_both_sides() {
    let d = TempDirectory::new().unwrap();
    d.write("there", "").unwrap();
    let err = d.check(["missing"]).unwrap_err();
    match &err {
        TempDirError::Mismatch { expected, actual } => {
            assert_eq!(expected, &["missing"]);
            assert_eq!(actual, &["there"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("  missing"));
    assert!(message.contains("  there"));
}

#[test]
fn check_dir_is_not_recursive() {
    let d = TempDirectory::new().unwrap();
    d.write("sub/deep/file", "").unwrap();
    d.write("sub/top", "").unwrap();
    d.check_dir("sub", ["deep/", "top"]).unwrap();
    d.check(["sub/"]).unwrap();
}

#[test]
fn makedir_shows_as_directory() {
    let d = TempDirectory::new().unwrap();
    let made = d.makedir("a/b").unwrap();
    assert!(made.is_dir());
    d.check_all("", ["a/", "a/b/"]).unwrap();
    d.check_dir("a/b", Vec::<&str>::new()).unwrap();
}

#[test]
fn ignore_hides_matching_segments() {
    let (_registry, d) = isolated(TempDirOptions::default().ignore(["^\\.svn$", "\\.pyc$"]));
    d.write(".svn/rubbish", "").unwrap();
    d.write("a/.svn/rubbish", "").unwrap();
    d.write("a/module.pyc", "").unwrap();
    d.write("a/module.py", "").unwrap();
    d.check_all("", ["a/", "a/module.py"]).unwrap();
    d.check(["a/"]).unwrap();
}

#[test]
fn invalid_ignore_pattern_is_an_error() {
    let err = TempDirectory::with_options(TempDirOptions::default().ignore(["("])).unwrap_err();
    assert!(matches!(err, TempDirError::InvalidPattern { .. }));
}

#[test]
fn listdir_output() {
    let d = TempDirectory::new().unwrap();
    assert_eq!(d.listdir("", false).unwrap().to_string(), "No files or directories found.");
    d.write("one/two", "").unwrap();
    d.write("three", "").unwrap();
    assert_eq!(d.listdir("", false).unwrap().to_string(), "one/\nthree");
    assert_eq!(
        d.listdir("", true).unwrap().entries(),
        ["one/", "one/two", "three"]
    );
}

#[test]
fn missing_paths_are_not_found() {
    let d = TempDirectory::new().unwrap();
    assert!(matches!(d.read("nothing"), Err(TempDirError::NotFound(_))));
    assert!(matches!(d.listdir("nothing", false), Err(TempDirError::NotFound(_))));
}

#[test]
fn files_cannot_be_listed_or_checked_as_directories() {
    let d = TempDirectory::new().unwrap();
    let file = d.write("f", "x").unwrap();
    assert!(matches!(
        d.listdir("f", false),
        Err(TempDirError::NotADirectory(p)) if p == file
    ));
    assert!(matches!(
        d.check_dir("f", Vec::<&str>::new()),
        Err(TempDirError::NotADirectory(_))
    ));
    assert!(matches!(
        d.check_all("f", Vec::<&str>::new()),
        Err(TempDirError::NotADirectory(_))
    ));
}

#[test]
fn absolute_paths_escape() {
    let d = TempDirectory::new().unwrap();
    assert_escape(d.write("/some/folder", "stuff"));
    assert_escape(d.read("/some/folder"));
    assert_escape(d.makedir("/some/folder"));
    assert_escape(d.listdir("/some/folder", false));
    assert_escape(d.check_dir("/some/folder", ["stuff"]));
    assert_escape(d.check_all("/some/folder", ["stuff"]));
    assert_escape(d.getpath("/some/folder"));
}

#[test]
fn climbing_out_escapes() {
    let d = TempDirectory::new().unwrap();
    assert_escape(d.write("../outside", "stuff"));
    assert_escape(d.getpath(["a", "..", ".."]));
    // Climbing back inside is fine.
    assert_eq!(d.getpath("a/../b").unwrap(), d.path().join("b"));
}

#[test]
fn getpath_forms_agree() {
    let d = TempDirectory::new().unwrap();
    let expected = d.path().join("foo").join("bar");
    assert_eq!(d.getpath("foo/bar").unwrap(), expected);
    assert_eq!(d.getpath(["foo", "bar"]).unwrap(), expected);
    assert_eq!(d.getpath(vec!["foo".to_string(), "bar".to_string()]).unwrap(), expected);
    assert!(!expected.exists());
}

#[test]
fn caller_supplied_path_is_left_alone() {
    let existing = assert_fs::TempDir::new().unwrap();
    existing.child("already").write_str("here").unwrap();

    let (registry, d) = isolated(TempDirOptions::default().path(existing.path()));
    assert!(!d.is_owned());
    assert_eq!(d.path(), existing.path());
    d.check(["already"]).unwrap();
    d.write("added", "too").unwrap();

    d.cleanup().unwrap();
    assert!(registry.is_empty());
    existing.assert(predicate::path::is_dir());
    existing.child("already").assert("here");
    existing.child("added").assert("too");
}

#[test]
fn cleanup_removes_and_is_idempotent() {
    let (registry, d) = isolated(TempDirOptions::default().prefix("cleanup-test"));
    let root = d.path().to_path_buf();
    assert!(root
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("cleanup-test"));
    d.write("file", "x").unwrap();
    assert!(d.is_live());

    d.cleanup().unwrap();
    assert!(predicate::path::missing().eval(&root));
    assert!(!d.is_live());
    d.cleanup().unwrap();
    assert!(registry.is_empty());
}

#[test]
fn drop_removes_directory() {
    let (registry, d) = isolated(TempDirOptions::default());
    let root = d.path().to_path_buf();
    drop(d);
    assert!(!root.exists());
    assert!(registry.is_empty());
}

#[test]
fn cleanup_all_sweeps_every_instance() {
    let registry = Arc::new(Registry::new());
    let options = || TempDirOptions::default().registry(Arc::clone(&registry));
    let a = TempDirectory::with_options(options()).unwrap();
    let b = TempDirectory::with_options(options()).unwrap();
    let roots = [a.path().to_path_buf(), b.path().to_path_buf()];

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.cleanup_all(), 2);
    for root in &roots {
        assert!(!root.exists());
    }
    // Per-instance cleanup after a sweep has nothing left to do.
    a.cleanup().unwrap();
    b.cleanup().unwrap();
    assert_eq!(registry.cleanup_all(), 0);
}

#[test]
fn leaked_instance_is_reported_once() {
    let (registry, d) = isolated(TempDirOptions::default());
    let root = d.path().to_path_buf();
    std::mem::forget(d);

    let warnings = registry.atexit();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0],
        format!(
            "TempDirectory instances not cleaned up by shutdown:\n{}",
            root.display()
        )
    );

    registry.cleanup_all();
    assert!(!root.exists());
    assert!(registry.atexit().is_empty());
}

#[test]
fn cleaned_up_instance_is_not_reported() {
    let (registry, d) = isolated(TempDirOptions::default());
    d.cleanup().unwrap();
    std::mem::forget(d);
    assert!(registry.atexit().is_empty());
}

#[test]
fn global_directories_install_the_exit_hook() {
    let d = TempDirectory::new().unwrap();
    assert!(fixturekit::tempdir::exit_hook_installed());
    assert!(Registry::global().live().iter().any(|r| r.path == d.path()));
    fs::write(d.path().join("plain"), "std write").unwrap();
    d.check(["plain"]).unwrap();
}

const LEAK_CHILD_ENV: &str = "FIXTUREKIT_LEAK_CHILD";

// Does nothing unless started by `leak_is_reported_on_stderr_at_exit`.
#[test]
fn leaking_child() {
    if env::var_os(LEAK_CHILD_ENV).is_none() {
        return;
    }
    let d = TempDirectory::new().unwrap();
    println!("LEAKED {}", d.path().display());
    std::mem::forget(d);
    std::process::exit(0);
}

#[test]
fn leak_is_reported_on_stderr_at_exit() {
    let output = Command::new(env::current_exe().unwrap())
        .args(["leaking_child", "--exact", "--nocapture", "--test-threads=1", "-q"])
        .env(LEAK_CHILD_ENV, "1")
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let leaked = stdout
        .lines()
        .find_map(|line| line.strip_prefix("LEAKED "))
        .map(PathBuf::from)
        .expect("child printed the leaked path");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected = format!(
        "warning: TempDirectory instances not cleaned up by shutdown:\n{}",
        leaked.display()
    );
    assert!(stderr.contains(&expected), "stderr was: {stderr}");
    assert_eq!(stderr.matches("not cleaned up by shutdown").count(), 1);

    fs::remove_dir_all(&leaked).unwrap();
}
