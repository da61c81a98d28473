#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn garde(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("garde-cli").unwrap();
    for key in [
        "GARDE_BACKEND",
        "GARDE_DATA_DIR",
        "GARDE_TRANSITION_HORIZON_DAYS",
        "GARDE_BATCH_LIMIT",
        "GARDE_PARENT1_NAME",
        "GARDE_PARENT2_NAME",
    ] {
        cmd.env_remove(key);
    }
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn create_family(data_dir: &Path) -> String {
    let out = garde(data_dir)
        .args(["--user", "alice", "--name", "Alice", "family-create", "--family-name", "Martin"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(out).unwrap().trim().to_string()
}

#[test]
fn presets_listing_needs_no_user() {
    let dir = tempdir().unwrap();
    garde(dir.path())
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("2-2-5-5"))
        .stdout(predicate::str::contains("week-on-week-off"));
}

#[test]
fn weekly_schedule_then_who_and_next() {
    let dir = tempdir().unwrap();
    let family = create_family(dir.path());
    assert!(dir.path().join(format!("{family}.json")).exists());

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "schedule-set"])
        .args(["--pattern", "weekly", "--start", "2024-01-07"])
        .args(["--parent1-days", "0,1,2,3", "--parent2-days", "4,5,6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule applied"));

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "who", "--date", "2024-01-11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parent2 (Parent 2)"))
        .stdout(predicate::str::contains("schedule"));

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "who", "--date", "2024-01-08"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parent1 (Alice)"));

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "next", "--date", "2024-01-07"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-11"));
}

#[test]
fn second_parent_joins_and_schedule_change_waits_for_approval() {
    let dir = tempdir().unwrap();
    let family = create_family(dir.path());
    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "schedule-set"])
        .args(["--preset", "weekdays-weekends", "--start", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule applied"));

    garde(dir.path())
        .args(["--user", "bob", "--name", "Bob", "--family", &family, "family-join"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parent2"));

    garde(dir.path())
        .args(["--user", "bob", "--family", &family, "schedule-set"])
        .args(["--preset", "week-on-week-off", "--start", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule awaiting approval"));

    garde(dir.path())
        .args(["--user", "bob", "--family", &family, "schedule-approve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requester-cannot-approve"));

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "schedule-approve"])
        .assert()
        .success();

    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "schedule-show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("week_on_week_off"));
}

#[test]
fn export_writes_resolved_days() {
    let dir = tempdir().unwrap();
    let family = create_family(dir.path());
    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "schedule-set"])
        .args(["--pattern", "weekly", "--start", "2024-01-07"])
        .args(["--parent1-days", "0,1,2,3", "--parent2-days", "4,5,6"])
        .assert()
        .success();

    let out = dir.path().join("custody.csv");
    garde(dir.path())
        .args(["--user", "alice", "--family", &family, "export"])
        .args(["--from", "2024-01-07", "--to", "2024-01-13", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 7 day(s)"));

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("date,weekday,parent,parent_name,source"));
    assert!(content.contains("2024-01-11,4,parent2,Parent 2,schedule"));
}

#[test]
fn missing_user_is_an_error() {
    let dir = tempdir().unwrap();
    garde(dir.path())
        .args(["who", "--date", "2024-01-11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user is required"));
}

#[test]
fn memory_backend_is_refused() {
    let dir = tempdir().unwrap();
    garde(dir.path())
        .env("GARDE_BACKEND", "memory")
        .args(["--user", "alice", "family-create", "--family-name", "Martin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memory backend keeps nothing between runs"));
}

#[test]
fn unknown_family_is_reported() {
    let dir = tempdir().unwrap();
    garde(dir.path())
        .args(["--user", "alice", "--family", "nope", "who"])
        .assert()
        .failure();
}
