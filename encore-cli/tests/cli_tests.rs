//! Smoke tests for the CLI surface.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("encore")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inbox"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("reply"));
}

#[test]
fn test_watch_requires_conversation() {
    Command::cargo_bin("encore")
        .unwrap()
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--conversation"));
}

#[test]
fn test_completion_generates_script() {
    Command::cargo_bin("encore")
        .unwrap()
        .args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("encore"));
}

#[test]
fn test_completion_rejects_unknown_shell() {
    Command::cargo_bin("encore")
        .unwrap()
        .args(["completion", "--shell", "tcsh"])
        .assert()
        .failure();
}
