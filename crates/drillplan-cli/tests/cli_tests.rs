//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn drillplan() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("drillplan").unwrap()
}

/// A temp directory with `drillplan init` already run in it.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    drillplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

/// A command running in `dir` with today pinned to `today`.
fn at(dir: &TempDir, today: &str) -> Command {
    let mut cmd = drillplan();
    cmd.current_dir(dir.path())
        .env_remove("DRILLPLAN_DATA_DIR")
        .env_remove("DRILLPLAN_CURRICULUM")
        .arg("--today")
        .arg(today);
    cmd
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    drillplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created drillplan.toml"))
        .stdout(predicate::str::contains("Created curricula/thirty-day.toml"));

    assert!(dir.path().join("drillplan.toml").exists());
    assert!(dir.path().join("curricula/thirty-day.toml").exists());
}

#[test]
fn init_skips_existing_files() {
    let dir = initialized();
    drillplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("drillplan.toml already exists"));
}

#[test]
fn validate_bundled_plan() {
    drillplan()
        .arg("validate")
        .arg("--curriculum")
        .arg("../../curricula/thirty-day.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("30 days, 139 items"))
        .stdout(predicate::str::contains("[day 29] WARNING: no items of its own"))
        .stdout(predicate::str::contains("item 146 is already scheduled on day 9"))
        .stdout(predicate::str::contains("14 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    drillplan()
        .arg("validate")
        .arg("--curriculum")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn first_day_lists_plan() {
    let dir = initialized();
    at(&dir, "2025-01-01")
        .arg("day")
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 1 (2025-01-01): Arrays & Hash Tables"))
        .stdout(predicate::str::contains("Two Sum"))
        .stdout(predicate::str::contains("Top K Frequent Elements"))
        .stdout(predicate::str::contains("5 item(s): 0 done"));
}

#[test]
fn status_reports_current_day() {
    let dir = initialized();
    at(&dir, "2025-01-01").arg("status").assert().success();
    at(&dir, "2025-01-05")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("day 5 of 30"));
}

#[test]
fn wrong_answer_comes_back_for_review() {
    let dir = initialized();
    at(&dir, "2025-01-01").arg("status").assert().success();
    at(&dir, "2025-01-01")
        .args(["done", "1", "--wrong"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked #1 Two Sum as wrong"));

    at(&dir, "2025-01-04")
        .args(["--json", "day", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"forReview\": true"))
        .stdout(predicate::str::contains("\"reviewInterval\": 3"));

    at(&dir, "2025-01-02")
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("Two Sum"))
        .stdout(predicate::str::contains("1d"));
}

#[test]
fn review_on_a_later_day_counts() {
    let dir = initialized();
    at(&dir, "2025-01-01").args(["done", "1"]).assert().success();
    at(&dir, "2025-01-03")
        .args(["done", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(review 1)"));
}

#[test]
fn unknown_item_is_rejected() {
    let dir = initialized();
    at(&dir, "2025-01-01")
        .args(["done", "99999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("item not found: 99999"));
}

#[test]
fn day_out_of_range_is_rejected() {
    let dir = initialized();
    at(&dir, "2025-01-01")
        .args(["day", "31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input"));
}

#[test]
fn deferred_item_moves_to_deferred_list() {
    let dir = initialized();
    at(&dir, "2025-01-01")
        .args(["defer", "217"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deferred #217 Contains Duplicate"));

    at(&dir, "2025-01-01")
        .args(["day", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Contains Duplicate").not())
        .stdout(predicate::str::contains("1 deferred"));

    at(&dir, "2025-01-01")
        .arg("deferred")
        .assert()
        .success()
        .stdout(predicate::str::contains("Contains Duplicate"))
        .stdout(predicate::str::contains("2025-01-01"));

    at(&dir, "2025-01-02").args(["undefer", "217"]).assert().success();
    at(&dir, "2025-01-02")
        .arg("deferred")
        .assert()
        .success()
        .stdout(predicate::str::contains("No deferred items."));
}

#[test]
fn notes_are_kept() {
    let dir = initialized();
    at(&dir, "2025-01-01")
        .args(["note", "49", "sort each word as the key"])
        .assert()
        .success();
    at(&dir, "2025-01-01")
        .args(["note", "49"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sort each word as the key"));
}

#[test]
fn undo_clears_progress() {
    let dir = initialized();
    at(&dir, "2025-01-01").args(["done", "1"]).assert().success();
    at(&dir, "2025-01-01").args(["undo", "1"]).assert().success();
    at(&dir, "2025-01-01")
        .args(["--json", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_completed\": 0"));
}

#[test]
fn stats_json_counts_completions() {
    let dir = initialized();
    at(&dir, "2025-01-01").args(["done", "1"]).assert().success();
    at(&dir, "2025-01-01")
        .args(["done", "217", "--wrong", "--elapsed", "600"])
        .assert()
        .success();
    at(&dir, "2025-01-01")
        .args(["--json", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_completed\": 2"))
        .stdout(predicate::str::contains("\"total_wrong\": 1"))
        .stdout(predicate::str::contains("\"streak_days\": 1"));
}

#[test]
fn start_date_can_be_moved() {
    let dir = initialized();
    at(&dir, "2025-01-10")
        .args(["start-date", "2025-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("today is day 10"));
}

#[test]
fn missing_curriculum_suggests_init() {
    let dir = TempDir::new().unwrap();
    at(&dir, "2025-01-01")
        .arg("day")
        .assert()
        .failure()
        .stderr(predicate::str::contains("drillplan init"));
}

#[test]
fn help_lists_commands() {
    drillplan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("deferred"))
        .stdout(predicate::str::contains("--today").not());
}
