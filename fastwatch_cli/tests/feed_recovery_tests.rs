//! Feed recovery tests for fastwatch.
//!
//! These tests verify the CLI can handle:
//! - Corrupted JSON Lines entries
//! - Events with unparseable timestamps
//! - Future-dated events
//! - Missing and unreadable feeds

use assert_cmd::Command;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::fs;
use std::thread;
use tempfile::TempDir;

/// Config and data homes shared by every test, so the user's real
/// `~/.config/fastwatch/config.toml` is never read
static ISOLATED_HOME: Lazy<TempDir> =
    Lazy::new(|| tempfile::tempdir().expect("Failed to create isolated home"));

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fastwatch"));
    cmd.env("XDG_CONFIG_HOME", ISOLATED_HOME.path().join("config"))
        .env("XDG_DATA_HOME", ISOLATED_HOME.path().join("data"))
        .env("HOME", ISOLATED_HOME.path());
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn status_json(feed: &std::path::Path, now: &str) -> Value {
    let output = cli()
        .arg("status")
        .arg("--feed")
        .arg(feed)
        .arg("--now")
        .arg(now)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is not JSON")
}

#[test]
fn test_corrupted_jsonl_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let feed = temp_dir.path().join("events.jsonl");
    fs::write(
        &feed,
        concat!(
            r#"{"id": "1", "created_at": "2024-04-01T06:00:00Z", "is_fasting_breaker": true}"#,
            "\n",
            "{ invalid json }\n",
            r#"{"id": "2", "created_at": "2024-04-01T18:00:00Z", "is_fasting_breaker": true}"#,
            "\n",
            r#"{"id": "3", "created_at": "2024-04"#,
        ),
    )
    .expect("Failed to write feed");

    let status = status_json(&feed, "2024-04-02T02:00:00Z");
    assert_eq!(status["status"], "ACTIVE");
    assert_eq!(status["hours_elapsed"], 8.0);
}

#[test]
fn test_bad_timestamp_skips_single_event() {
    let temp_dir = setup_test_dir();
    let feed = temp_dir.path().join("events.json");
    fs::write(
        &feed,
        r#"[
            {"id": "1", "created_at": "2024-04-01T06:00:00Z", "is_fasting_breaker": true},
            {"id": "2", "created_at": "last tuesday", "is_fasting_breaker": true}
        ]"#,
    )
    .expect("Failed to write feed");

    let status = status_json(&feed, "2024-04-01T10:00:00Z");
    assert_eq!(status["hours_elapsed"], 4.0);
    assert_eq!(status["phase"], "early_catabolic");
}

#[test]
fn test_future_events_are_ignored() {
    let temp_dir = setup_test_dir();
    let feed = temp_dir.path().join("events.json");
    fs::write(
        &feed,
        r#"[
            {"id": "1", "created_at": "2024-04-01T06:00:00Z", "is_fasting_breaker": true},
            {"id": "2", "created_at": "2024-04-09T06:00:00Z", "is_fasting_breaker": true}
        ]"#,
    )
    .expect("Failed to write feed");

    let status = status_json(&feed, "2024-04-02T06:00:00Z");
    assert_eq!(status["hours_elapsed"], 24.0);
    assert_eq!(status["phase"], "max_autophagy");
}

#[test]
fn test_missing_feed_is_unknown_status() {
    let temp_dir = setup_test_dir();
    let status = status_json(&temp_dir.path().join("nope.json"), "2024-04-02T06:00:00Z");
    assert_eq!(status["status"], "NONE");
}

#[test]
fn test_truncated_array_fails() {
    let temp_dir = setup_test_dir();
    let feed = temp_dir.path().join("events.json");
    fs::write(&feed, r#"[{"id": "1", "created_at": "#).expect("Failed to write feed");

    cli()
        .arg("status")
        .arg("--feed")
        .arg(&feed)
        .assert()
        .failure();
}

#[test]
fn test_parallel_readers_agree() {
    let temp_dir = setup_test_dir();
    let feed = temp_dir.path().join("events.json");
    fs::write(
        &feed,
        r#"[
            {"id": "1", "created_at": "2024-04-01T06:00:00Z", "is_fasting_breaker": true},
            {"id": "2", "created_at": "2024-04-03T12:00:00Z", "is_fasting_breaker": true}
        ]"#,
    )
    .expect("Failed to write feed");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let feed = feed.clone();
            thread::spawn(move || status_json(&feed, "2024-04-03T20:00:00Z"))
        })
        .collect();

    let results: Vec<Value> = handles
        .into_iter()
        .map(|h| h.join().expect("reader thread panicked"))
        .collect();

    for result in &results {
        assert_eq!(result, &results[0]);
    }
    assert_eq!(results[0]["refeed_status"]["protocol_id"], 2);
    assert_eq!(results[0]["refeed_status"]["refeed_hours_left"], 40.0);
}
