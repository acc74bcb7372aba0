//! E2E tests for the reporting commands:
//! `sprintlog track`, `sprintlog windows`, `sprintlog members`.
//!
//! Covers: CSV layout and ordering, file output, JSON rows, config overrides,
//! fatal interval validation, skipped items, and structured JSON errors.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn sprintlog(cache: &Path, home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sprintlog"));
    cmd.arg("--dir").arg(cache);
    cmd.env("XDG_CONFIG_HOME", home);
    cmd.env("HOME", home);
    cmd.env("SPRINTLOG_LOG", "error");
    cmd.env_remove("SPRINTLOG_FORMAT");
    cmd.env_remove("DEBUG");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) {
    std::fs::write(dir.join(name), value.to_string()).expect("write fixture");
}

fn sprint_change(created: &str, from: &str, to: &str) -> Value {
    json!({"created": created, "items": [{"field": "Sprint", "fromString": from, "toString": to}]})
}

/// Two items: ABC-1 moves from Sprint 1 to Sprint 2, ABC-2 is a sub-task
/// inheriting ABC-1's history.
fn seed(dir: &Path) {
    write_json(
        dir,
        "ABC-1.json",
        &json!({"key": "ABC-1", "fields": {"project": {"key": "ABC"}, "created": "2024-01-01T00:00:00.000+0000"}}),
    );
    write_json(
        dir,
        "ABC-1.changelog.json",
        &json!({"histories": [
            {"created": "2024-01-01T08:00:00.000+0000", "items": [
                {"field": "Story Points", "fromString": null, "toString": "3"},
                {"field": "status", "fromString": "New", "toString": "In Progress"}
            ]},
            sprint_change("2024-01-01T10:00:00.000+0000", "", "Sprint 1"),
            sprint_change("2024-01-02T10:00:00.000+0000", "Sprint 1", "Sprint 2"),
            sprint_change("2024-01-03T10:00:00.000+0000", "Sprint 2", ""),
        ]}),
    );
    write_json(
        dir,
        "ABC-2.json",
        &json!({"key": "ABC-2", "fields": {"project": {"key": "ABC"}, "parent": {"key": "ABC-1"}}}),
    );
}

struct Fixture {
    cache: TempDir,
    home: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            cache: TempDir::new().expect("cache dir"),
            home: TempDir::new().expect("home dir"),
        };
        seed(fixture.cache.path());
        fixture
    }

    fn cmd(&self) -> Command {
        sprintlog(self.cache.path(), self.home.path())
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().expect("run sprintlog");
        assert!(
            output.status.success(),
            "sprintlog {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }
}

const HEADER: &str =
    "timestamp,iteration,issue_count,story_points,Backlog,In Progress,Review,Testing,Resolved,Closed";

// ---------------------------------------------------------------------------
// sprintlog track
// ---------------------------------------------------------------------------

#[test]
fn track_writes_ordered_csv_to_stdout() {
    let fixture = Fixture::new();
    let csv = fixture.stdout(&["track"]);

    assert_eq!(
        csv,
        format!(
            "{HEADER}\n\
             2024-01-01,Sprint 1,2,6.0,0,2,0,0,0,0\n\
             2024-01-02,Sprint 1,2,6.0,0,2,0,0,0,0\n\
             2024-01-02,Sprint 2,2,6.0,0,2,0,0,0,0\n\
             2024-01-03,Sprint 2,2,6.0,0,2,0,0,0,0\n"
        )
    );
}

#[test]
fn track_writes_to_out_file() {
    let fixture = Fixture::new();
    let out = fixture.home.path().join("report.csv");

    fixture
        .cmd()
        .args(["track", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let csv = std::fs::read_to_string(&out).expect("report written");
    assert!(csv.starts_with(HEADER));
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn track_sprint_filter_and_project_filter() {
    let fixture = Fixture::new();

    let csv = fixture.stdout(&["track", "--sprint-filter", "Sprint 2"]);
    let rows: Vec<_> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.contains(",Sprint 2,")));

    let csv = fixture.stdout(&["track", "--project", "XYZ"]);
    assert_eq!(csv, format!("{HEADER}\n"));
}

#[test]
fn track_hourly_labels() {
    let fixture = Fixture::new();
    let csv = fixture.stdout(&["track", "--interval", "hourly", "--sprint-filter", "Sprint 1"]);
    let mut rows = csv.lines().skip(1);
    assert_eq!(rows.next(), Some("2024-01-01 10:00,Sprint 1,2,6.0,0,2,0,0,0,0"));
    // 10:00 on day one through 10:00 on day two, inclusive.
    assert_eq!(csv.lines().count(), 1 + 25);
}

#[test]
fn track_json_rows() {
    let fixture = Fixture::new();
    let out = fixture.stdout(&["track", "--format", "json"]);
    let rows: Value = serde_json::from_str(&out).expect("json rows");
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["timestamp"], "2024-01-01");
    assert_eq!(rows[0]["iteration"], "Sprint 1");
    assert_eq!(rows[0]["issue_count"], 2);
    assert_eq!(rows[0]["statuses"]["In Progress"], 2);
}

#[test]
fn project_config_overrides_statuses_and_interval() {
    let fixture = Fixture::new();
    std::fs::write(
        fixture.cache.path().join("sprintlog.toml"),
        "[report]\nstatuses = [\"In Progress\", \"Done\"]\ninterval = \"hourly\"\n",
    )
    .expect("write config");

    let csv = fixture.stdout(&["track", "--sprint-filter", "Sprint 2"]);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,iteration,issue_count,story_points,In Progress,Done")
    );
    assert_eq!(lines.next(), Some("2024-01-02 10:00,Sprint 2,2,6.0,2,0"));
}

#[test]
fn invalid_interval_fails_before_processing() {
    let fixture = Fixture::new();
    let out = fixture.home.path().join("never.csv");

    fixture
        .cmd()
        .args(["track", "--interval", "weekly", "--out"])
        .arg(&out)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("weekly"));
    assert!(!out.exists());
}

#[test]
fn invalid_interval_json_error_has_code() {
    let fixture = Fixture::new();
    let output = fixture
        .cmd()
        .args(["--json", "track", "--interval", "fortnightly"])
        .output()
        .expect("run");
    assert!(!output.status.success());

    let err: Value = serde_json::from_slice(&output.stderr).expect("json error");
    assert_eq!(err["error"]["error_code"], "E1002");
    assert!(err["error"]["message"].as_str().is_some_and(|m| m.contains("fortnightly")));
}

#[test]
fn missing_cache_dir_is_reported() {
    let home = TempDir::new().expect("home");
    sprintlog(&home.path().join("nope"), home.path())
        .arg("track")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open cache directory"));
}

#[test]
fn broken_items_are_skipped() {
    let fixture = Fixture::new();
    std::fs::write(fixture.cache.path().join("ABC-3.json"), "{ nope").expect("write");
    std::fs::write(fixture.cache.path().join("ABC-4.json"), "{}").expect("write");
    std::fs::write(fixture.cache.path().join("ABC-4.denied"), "").expect("write");

    let csv = fixture.stdout(&["track"]);
    assert_eq!(csv.lines().count(), 5);
}

// ---------------------------------------------------------------------------
// sprintlog windows / members
// ---------------------------------------------------------------------------

#[test]
fn windows_json_dump() {
    let fixture = Fixture::new();
    let out = fixture.stdout(&["windows", "--json"]);
    let dump: Value = serde_json::from_str(&out).expect("json");

    let windows = dump["windows"].as_array().expect("windows");
    assert_eq!(windows.len(), 4);
    assert_eq!(windows[0]["item"], "ABC-1");
    assert_eq!(windows[0]["sprint"], "Sprint 1");
    assert_eq!(windows[0]["estimate"], 3.0);
    assert_eq!(windows[0]["status"], "In Progress");
    assert_eq!(dump["stats"]["origins"]["parent"], 1);
    assert_eq!(dump["stats"]["processed"], 2);
}

#[test]
fn windows_text_rows() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .env("SPRINTLOG_FORMAT", "text")
        .args(["windows", "--sprint-filter", "Sprint 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ABC-2\tSprint 1\t2024-01-01T10:00:00+00:00\t2024-01-02T10:00:00+00:00\t3.0\tIn Progress",
        ));
}

#[test]
fn members_lists_current_sprint_members() {
    let fixture = Fixture::new();
    write_json(
        fixture.cache.path(),
        "ABC-10.json",
        &json!({"key": "ABC-10", "fields": {"customfield_12310940": [{"id": 2, "name": "Sprint 2"}]}}),
    );
    write_json(
        fixture.cache.path(),
        "ABC-9.json",
        &json!({"key": "ABC-9", "fields": {"customfield_12310940": [
            "com.atlassian.greenhopper.service.sprint.Sprint@1f[id=2,rapidViewId=1,state=ACTIVE,name=Sprint 2,startDate=<null>,endDate=<null>,completeDate=<null>,activatedDate=<null>,sequence=2,goal=<null>,synced=false,autoStartStop=false,incompleteIssuesDestinationId=<null>]"
        ]}}),
    );

    let out = fixture.stdout(&["members", "Sprint 2", "--json"]);
    let payload: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(payload["sprint"], "Sprint 2");
    assert_eq!(payload["members"], json!(["ABC-9", "ABC-10"]));
}

#[test]
fn completions_emit_script() {
    let home = TempDir::new().expect("home");
    sprintlog(home.path(), home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sprintlog"));
}
