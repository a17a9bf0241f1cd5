//! Scenario: Incremental file sync
//!
//! Journey: A team deploys a website tree several times a day.
//!
//! Steps:
//! 1. First run copies everything and writes the change cache
//! 2. A run with no edits transfers nothing
//! 3. Editing one file updates only that file
//! 4. Removing a source file deletes it from the destination

use serde_json::json;

use crate::common::*;
use crate::{assert_deployed, assert_not_deployed};

fn summary_line(result: &TestResult) -> String {
    result
        .stdout
        .lines()
        .find(|l| l.contains("files:"))
        .unwrap_or_default()
        .to_string()
}

/// SCENARIO: two files, two runs, second run is a no-op
#[test]
fn scenario_second_run_transfers_nothing() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_source("b.txt", "world!", 100);
    env.write_config(json!({}));

    let result = env.run(&[]);
    assert!(
        result.is_success(),
        "first run should succeed.\nstderr: {}\nstdout: {}",
        result.stderr,
        result.stdout
    );
    assert!(summary_line(&result).contains("2 copied"), "{}", result.stdout);
    assert_deployed!(env, "a.txt");
    assert_deployed!(env, "b.txt");
    assert_eq!(env.read_destination("b.txt").as_deref(), Some("world!"));

    let cache = env.read_cache();
    assert_eq!(cache["files"]["a.txt"]["size"], 5);
    assert_eq!(cache["files"]["b.txt"]["size"], 6);

    let result = env.run(&[]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(
        summary_line(&result).contains("0 copied, 0 updated, 0 deleted"),
        "second run should be empty: {}",
        result.stdout
    );
}

/// SCENARIO: edit, then delete
#[test]
fn scenario_edit_and_delete_propagate() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_source("nested/b.txt", "world", 100);
    env.write_config(json!({}));
    assert!(env.run(&[]).is_success());

    env.write_source("a.txt", "hello again", 200);
    let result = env.run(&[]);
    assert!(summary_line(&result).contains("1 updated"), "{}", result.stdout);
    assert_eq!(env.read_destination("a.txt").as_deref(), Some("hello again"));

    env.remove_source("nested/b.txt");
    let result = env.run(&[]);
    assert!(summary_line(&result).contains("1 deleted"), "{}", result.stdout);
    assert_not_deployed!(env, "nested/b.txt");
    assert!(env.read_cache()["files"].get("nested/b.txt").is_none());
}

/// SCENARIO: files only present at the destination are removed unless kept
#[test]
fn scenario_extra_destination_files() {
    let env = TestEnv::new();
    env.write_source("index.html", "<html>", 100);
    env.write_destination("stale.html", "old", 50);
    env.write_destination("logs/app.log", "line", 50);
    env.write_config(json!({
        "website": {"ignore": {"folders": ["logs"]}}
    }));

    assert!(env.run(&[]).is_success());
    assert_deployed!(env, "index.html");
    assert_not_deployed!(env, "stale.html");
    assert_deployed!(env, "logs/app.log");
}

/// SCENARIO: `delete_extra_files = false` leaves the destination alone
#[test]
fn scenario_deletion_disabled() {
    let env = TestEnv::new();
    env.write_source("index.html", "<html>", 100);
    env.write_destination("keep.html", "mine", 50);
    env.write_config(json!({"options": {"delete_extra_files": false}}));

    assert!(env.run(&[]).is_success());
    assert_deployed!(env, "keep.html");
}

/// SCENARIO: `--cache-only` skips the destination listing once a cache exists
#[test]
fn scenario_cache_only_run() {
    let env = TestEnv::new();
    env.write_source("a.txt", "one", 100);
    env.write_config(json!({}));
    assert!(env.run(&[]).is_success());

    // Invisible to a cache-only diff: nothing lists the destination.
    env.write_destination("unknown.txt", "x", 50);
    env.write_source("b.txt", "two", 100);

    let result = env.run(&["--cache-only"]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(summary_line(&result).contains("1 copied"), "{}", result.stdout);
    assert_deployed!(env, "b.txt");
    assert_deployed!(env, "unknown.txt");
}

/// SCENARIO: `--ignore-cache` re-sends files whose fingerprint is unchanged
#[test]
fn scenario_ignore_cache_resends_changed_looking_files() {
    let env = TestEnv::new();
    env.write_source("a.txt", "one", 100);
    env.write_config(json!({}));
    assert!(env.run(&[]).is_success());

    // Destination copy is older than the source but the cache still matches.
    env.write_destination("a.txt", "one", 10);
    let result = env.run(&[]);
    assert!(summary_line(&result).contains("0 updated"), "{}", result.stdout);

    let result = env.run(&["--ignore-cache"]);
    assert!(summary_line(&result).contains("1 updated"), "{}", result.stdout);
}

/// SCENARIO: a wiped destination is refilled on a normal run
#[test]
fn scenario_emptied_destination_is_refilled() {
    let env = TestEnv::new();
    env.write_source("a.txt", "one", 100);
    env.write_source("b.txt", "two", 100);
    env.write_config(json!({}));
    assert!(env.run(&[]).is_success());

    std::fs::remove_file(env.destination_path("a.txt")).unwrap();
    std::fs::remove_file(env.destination_path("b.txt")).unwrap();

    let result = env.run(&[]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(summary_line(&result).contains("2 copied"), "{}", result.stdout);
    assert_deployed!(env, "a.txt");
    assert_deployed!(env, "b.txt");
}

/// SCENARIO: an unreadable cache file falls back to a full deploy
#[test]
fn scenario_corrupt_cache_redeploys_everything() {
    let env = TestEnv::new();
    env.write_source("a.txt", "one", 100);
    env.write_source("b.txt", "two", 100);
    env.write_config(json!({}));
    std::fs::write(env.cache_path(), "{not json").unwrap();

    let result = env.run(&[]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(summary_line(&result).contains("2 copied"), "{}", result.stdout);
    assert_deployed!(env, "a.txt");

    let cache = env.read_cache();
    assert_eq!(cache["files"]["b.txt"]["size"], 3);
}
