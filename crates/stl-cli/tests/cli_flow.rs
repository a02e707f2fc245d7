//! End-to-end tests driving the `stl` binary against a temporary log
//! directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn stl_binary() -> String {
    env!("CARGO_BIN_EXE_stl").to_string()
}

/// Runs `stl --dir <dir> --now <now> <args>` with a clean environment.
fn stl(dir: &Path, now: &str, args: &[&str]) -> Output {
    Command::new(stl_binary())
        .env("HOME", dir)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .env_remove("EDITOR")
        .arg("--dir")
        .arg(dir)
        .arg("--now")
        .arg(now)
        .args(args)
        .output()
        .expect("failed to run stl")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "stl failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    assert!(!output.status.success(), "stl unexpectedly succeeded");
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_start_status_stop() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    assert_eq!(
        stdout(&stl(dir, "2016-10-15T09:00", &["start", "writing"])),
        "started on writing\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("current")).unwrap(),
        "2016-10-15 09:00\twriting\n"
    );

    assert_eq!(
        stdout(&stl(dir, "2016-10-15T10:30", &["status"])),
        "task: writing\nstarted: 15 oct 2016 09:00\nelapsed: 1 hour, 30 minutes\n"
    );

    assert_eq!(
        stdout(&stl(dir, "2016-10-15T10:30", &["stop"])),
        "stopped with writing\n"
    );
    assert!(!dir.join("current").exists());
    assert_eq!(
        std::fs::read_to_string(dir.join("2016").join("10")).unwrap(),
        "2016-10-15 09:00\t2016-10-15 10:30\twriting\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("tasks")).unwrap(),
        "writing\t2016-10\n"
    );

    assert_eq!(
        stdout(&stl(dir, "2016-10-15T11:00", &["show"])),
        "nothing in progress\n"
    );
    assert_eq!(
        stdout(&stl(dir, "2016-10-15T11:00", &["status", "-d"])),
        "15 oct 2016\ntasks:\n  writing: 1 hour, 30 minutes\ntotal: 1 hour, 30 minutes\n"
    );
}

#[test]
fn test_state_conflicts() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let err = stderr(&stl(dir, "2016-10-15T09:00", &["stop"]));
    assert!(err.contains("you are not working on anything"), "{err}");

    stdout(&stl(dir, "2016-10-15T09:00", &["start"]));
    let err = stderr(&stl(dir, "2016-10-15T09:10", &["start", "other"]));
    assert!(err.contains("you are already working on something"), "{err}");

    assert_eq!(
        stdout(&stl(dir, "2016-10-15T09:30", &["switch", "other"])),
        "stopped\nstarted on other\n"
    );
}

#[test]
fn test_add_and_summaries() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let now = "2016-10-15T12:00";

    assert_eq!(
        stdout(&stl(
            dir,
            now,
            &["add", "2016-10-10T09:00", "2016-10-10T10:30", "a"]
        )),
        "added task a\nstart: 10 oct 2016 09:00\nstop: 10 oct 2016 10:30\n"
    );
    stdout(&stl(dir, now, &["add", "2016-10-10T11:00", "2016-10-10T11:30", "b"]));
    stdout(&stl(dir, now, &["add", "2016-09-12T11:00", "2016-09-12T12:00", "a"]));

    assert_eq!(
        stdout(&stl(dir, now, &["status", "--month"])),
        "oct 2016\ntasks:\n  b: 30 minutes\n  a: 1 hour, 30 minutes\ntotal: 2 hours\n"
    );
    assert_eq!(
        stdout(&stl(dir, now, &["status", "--span", "10", "sep", "12", "oct"])),
        "10 sep 2016 - 12 oct 2016\ntasks:\n  b: 30 minutes\n  a: 2 hours, 30 minutes\ntotal: 3 hours\n"
    );
    assert_eq!(
        stdout(&stl(dir, now, &["status", "--task", "a"])),
        "task: a\nfirst start: 12 sep 2016 11:00\nlast stop: 10 oct 2016 10:30\ntotal: 2 hours, 30 minutes\n"
    );

    let json: serde_json::Value =
        serde_json::from_str(&stdout(&stl(dir, now, &["status", "-y", "--json"]))).unwrap();
    assert_eq!(json["period"], "2016");
    assert_eq!(json["total_seconds"], 3 * 3600);
}

#[test]
fn test_add_rejects_bad_input() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let now = "2016-10-15T12:00";

    let err = stderr(&stl(dir, now, &["add", "2016-10-10T10:00", "2016-10-10T09:00"]));
    assert!(err.contains("negative"), "{err}");

    let err = stderr(&stl(dir, now, &["add", "soon", "2016-10-10T09:00"]));
    assert!(err.contains("could not infer datetime: soon"), "{err}");

    let err = stderr(&stl(dir, now, &["status", "-m", "10", "20"]));
    assert!(err.contains("could not infer month: 10 20"), "{err}");
}

#[test]
fn test_import() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let journal = dir.join("journal.txt");
    std::fs::write(&journal, "2016-10-03 9:00-10:15 docs\nlunch\n").unwrap();

    let journal = journal.to_string_lossy().to_string();
    assert_eq!(
        stdout(&stl(
            dir,
            "2016-10-15T12:00",
            &["import", r"%Y-%m-%d %H:%M-%H:%M (?P<task>.*)", &journal]
        )),
        "imported 1 entries\n"
    );
    assert_eq!(
        stdout(&stl(dir, "2016-10-15T12:00", &["status", "-t", "docs"])),
        "task: docs\nfirst start: 03 oct 2016 09:00\nlast stop: 03 oct 2016 10:15\ntotal: 1 hour, 15 minutes\n"
    );
}

#[test]
fn test_edit_without_logs() {
    let temp = TempDir::new().unwrap();
    let err = stderr(&stl(temp.path(), "2016-10-15T12:00", &["edit", "last"]));
    assert!(err.contains("there are no logs for sep 2016"), "{err}");
}

#[test]
fn test_missing_dir() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let err = stderr(&stl(&missing, "2016-10-15T12:00", &["status"]));
    assert!(err.contains("could not find"), "{err}");
}

#[test]
fn test_corrupt_month_is_reported() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    std::fs::create_dir(dir.join("2016")).unwrap();
    std::fs::write(dir.join("2016").join("10"), "not a record\n").unwrap();

    let err = stderr(&stl(dir, "2016-10-15T12:00", &["status", "-m"]));
    assert!(err.contains("corrupt record in"), "{err}");
    assert!(err.contains("line 1"), "{err}");
}
