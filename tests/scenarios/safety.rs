//! Scenario: Guard rails
//!
//! Dry runs, confirmation prompts and broken configs must never touch the
//! destination.

use serde_json::json;

use crate::assert_not_deployed;
use crate::common::*;

/// SCENARIO: a dry run reports work but writes neither files nor cache
#[test]
fn scenario_dry_run_changes_nothing() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_config(json!({}));

    let result = env.run(&["--dry-run"]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("[dry run] files: 1 copied"), "{}", result.stdout);
    assert_not_deployed!(env, "a.txt");
    assert!(!env.cache_path().exists());
}

/// SCENARIO: `warn.enabled` without a terminal requires `--yes`
#[test]
fn scenario_confirmation_required() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_config(json!({
        "description": "deploy shop to PRODUCTION",
        "warn": {"enabled": true}
    }));

    let result = env.run(&[]);
    assert!(!result.is_success());
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("--yes"), "{}", result.stderr);
    assert_not_deployed!(env, "a.txt");

    let result = env.run(&["--yes"]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
}

/// SCENARIO: invalid configs fail before anything is transferred
#[test]
fn scenario_invalid_config_is_fatal() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_config(json!({"options": {"max_concurrent_transfers": 0}}));

    let result = env.run(&[]);
    assert!(!result.is_success());
    assert!(
        result.stderr.contains("options.max_concurrent_transfers"),
        "{}",
        result.stderr
    );
    assert_not_deployed!(env, "a.txt");
}

#[test]
fn scenario_missing_config_file() {
    let env = TestEnv::new();
    let result = env.run(&[]);
    assert!(!result.is_success());
    assert!(result.stderr.contains("Error:"), "{}", result.stderr);
}

/// SCENARIO: `--clean-install` wipes the destination and redeploys
#[test]
fn scenario_clean_install() {
    let env = TestEnv::new();
    env.write_source("a.txt", "hello", 100);
    env.write_config(json!({"options": {"delete_extra_files": false}}));
    assert!(env.run(&[]).is_success());

    env.write_destination("leftover/old.txt", "old", 10);
    let result = env.run(&["--clean-install"]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert_not_deployed!(env, "leftover/old.txt");
    assert_eq!(env.read_destination("a.txt").as_deref(), Some("hello"));
}
