//! End-to-end tests that invoke the `uow-audit` binary.
//!
//! Each test points `UOW_AUDIT_DIR` at a temp directory so the user's real
//! settings and audit log are never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn uow_audit(base: &Path) -> Command {
    let mut cmd = Command::cargo_bin("uow-audit").expect("binary should build");
    cmd.env("UOW_AUDIT_DIR", base).env_remove("RUST_LOG");
    cmd
}

fn write_change_set(dir: &Path) -> PathBuf {
    let path = dir.join("changes.json");
    let doc = r#"{
        "context": "ShopContext",
        "connection": {
            "database": "shop",
            "connection_id": "c-1",
            "transaction": {"transaction_id": "t-1"}
        },
        "schemas": [
            {
                "type_name": "Sales.Order",
                "table": "Orders",
                "columns": [{"property": "Id"}, {"property": "Status"}, {"property": "Customer"}],
                "primary_key": ["Id"],
                "rules": [{"rule": "required", "property": "Customer"}]
            }
        ],
        "entries": [
            {
                "entity_type": "Sales.Order",
                "state": "modified",
                "current": {"Id": 7, "Status": "shipped", "Customer": "Ada"},
                "original": {"Id": 7, "Status": "open", "Customer": "Ada"},
                "modified": ["Status"]
            },
            {
                "entity_type": "Sales.Order",
                "state": "added",
                "current": {"Id": 8, "Status": "new", "Customer": null}
            }
        ]
    }"#;
    fs::write(&path, doc).expect("write change set");
    path
}

#[test]
fn init_writes_settings() {
    let tmp = tempfile::tempdir().expect("temp dir");

    uow_audit(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings written to"));

    assert!(tmp.path().join("config.json").exists());

    uow_audit(tmp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Audit mode:        opt-out"))
        .stdout(predicate::str::contains("Initialized:    true"));
}

#[test]
fn replay_records_one_event() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .assert()
        .success()
        .stdout(predicate::str::contains("ShopContext:shop tx=t-1"))
        .stdout(predicate::str::contains("Update Orders [Id=7]"))
        .stdout(predicate::str::contains("Status: \"open\" -> \"shipped\""))
        .stdout(predicate::str::contains("Invalid: The Customer field is required."))
        .stdout(predicate::str::contains("Rows affected: 2"));

    let log = fs::read_to_string(tmp.path().join("audit.log")).expect("audit log");
    assert_eq!(log.lines().count(), 1);

    uow_audit(tmp.path())
        .args(["log", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Insert Orders [Id=8]"))
        .stdout(predicate::str::contains("Showing 1 of 1 event(s)"));
}

#[test]
fn replay_dry_run_skips_log() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!tmp.path().join("audit.log").exists());
}

#[test]
fn replay_opt_in_without_included_types() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .args(["--mode", "opt-in"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to audit."));
}

#[test]
fn replay_json_with_nothing_to_audit_prints_null() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .args(["--mode", "opt-in", "--json"])
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn replay_missing_file_fails() {
    let tmp = tempfile::tempdir().expect("temp dir");

    uow_audit(tmp.path())
        .args(["replay", "does-not-exist.json"])
        .assert()
        .failure();
}

#[test]
fn export_csv_after_replay() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .assert()
        .success();

    uow_audit(tmp.path())
        .args(["export", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Event Type,Start Date"))
        .stdout(predicate::str::contains("Orders,Update,Id=7"))
        .stdout(predicate::str::contains("Orders,Insert,Id=8"));
}

#[test]
fn log_zero_recent_still_counts_events() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let change_set = write_change_set(tmp.path());

    uow_audit(tmp.path())
        .arg("replay")
        .arg(&change_set)
        .assert()
        .success();

    uow_audit(tmp.path())
        .args(["log", "-n", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 0 of 1 event(s)"))
        .stdout(predicate::str::contains("No audit events recorded.").not());
}

#[test]
fn log_on_empty_directory() {
    let tmp = tempfile::tempdir().expect("temp dir");

    uow_audit(tmp.path())
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit events recorded."));
}
