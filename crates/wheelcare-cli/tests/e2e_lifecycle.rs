//! E2E CLI tests covering:
//! - `wheelcare init` with both persistent backends
//! - the intake → assign → deliver → follow-up path through `--json`
//! - failure envelopes: exit code, error code, field list, locale
//!
//! Each test runs the `wheelcare` binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the wheelcare binary, rooted in `dir`.
fn wc_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wheelcare"));
    cmd.current_dir(dir);
    cmd.env("WHEELCARE_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("WHEELCARE_LOCALE");
    cmd.env_remove("WHEELCARE_FORMAT");
    cmd
}

fn init_project(dir: &Path, backend: &str) {
    wc_cmd(dir)
        .args(["init", "--backend", backend])
        .assert()
        .success();
}

/// Run a command with `--json` and return (exit ok, parsed envelope).
fn run_json(dir: &Path, args: &[&str]) -> (bool, Value) {
    let output = wc_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    let json: Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "{args:?} should print a JSON envelope ({e}): {}",
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.success(), json)
}

fn data_id(envelope: &Value) -> String {
    envelope["data"]["id"]
        .as_str()
        .expect("envelope data should have an id")
        .to_string()
}

fn create_chair(dir: &Path) -> String {
    let (ok, env) = run_json(
        dir,
        &[
            "wheelchair",
            "create",
            "--type",
            "standard",
            "--condition",
            "excellent",
            "--source",
            "donation",
        ],
    );
    assert!(ok, "create wheelchair failed: {env}");
    data_id(&env)
}

fn create_applicant(dir: &Path, first: &str) -> String {
    let (ok, env) = run_json(
        dir,
        &["beneficiary", "create", "--first-name", first, "--last-name", "K"],
    );
    assert!(ok, "create beneficiary failed: {env}");
    data_id(&env)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_and_refuses_a_second_run() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path(), "json");
    assert!(dir.path().join(".wheelcare/config.toml").is_file());

    wc_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn commands_outside_a_project_point_at_init() {
    let dir = TempDir::new().unwrap();
    wc_cmd(dir.path())
        .args(["wheelchair", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wheelcare init"));
}

#[test]
fn full_lifecycle_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    init_project(root, "sqlite");

    let whc = create_chair(root);
    let ben = create_applicant(root, "Aisha");

    let (ok, env) = run_json(root, &["beneficiary", "assign", &ben, &whc, "--by", "coordinator"]);
    assert!(ok, "assign failed: {env}");
    assert_eq!(env["data"]["beneficiary"]["status"], "APPROVED");
    assert_eq!(env["data"]["wheelchair"]["status"], "ASSIGNED");

    let (ok, env) = run_json(
        root,
        &["beneficiary", "deliver", &ben, "--date", "2024-03-01", "--location", "Community Hall"],
    );
    assert!(ok, "deliver failed: {env}");
    assert_eq!(env["data"]["status"], "DELIVERED");

    let (ok, env) = run_json(
        root,
        &[
            "beneficiary",
            "follow-up",
            &ben,
            "--date",
            "2024-04-01",
            "--notes",
            "Doing well",
            "--rating",
            "5",
        ],
    );
    assert!(ok, "follow-up failed: {env}");
    assert_eq!(env["data"]["status"], "FOLLOW_UP");

    // state survives between processes
    let (_, env) = run_json(root, &["wheelchair", "show", &whc]);
    assert_eq!(env["data"]["status"], "ASSIGNED");
    let (_, env) = run_json(root, &["wheelchair", "stats"]);
    assert_eq!(env["data"]["total"], 1);
    assert_eq!(env["data"]["assigned"], 1);
    let (_, env) = run_json(root, &["beneficiary", "stats"]);
    assert_eq!(env["data"]["follow_up"], 1);
}

#[test]
fn double_booking_fails_with_code_and_exit_status() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    init_project(root, "json");

    let whc = create_chair(root);
    let first = create_applicant(root, "Aisha");
    let second = create_applicant(root, "Omar");

    let (ok, _) = run_json(root, &["beneficiary", "assign", &first, &whc]);
    assert!(ok);
    let (ok, env) = run_json(root, &["beneficiary", "assign", &second, &whc]);
    assert!(!ok);
    assert_eq!(env["success"], false);
    assert_eq!(env["code"], "E2101");

    let (_, env) = run_json(root, &["beneficiary", "show", &second]);
    assert_eq!(env["data"]["status"], "PENDING");
}

#[test]
fn missing_fields_are_listed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    init_project(root, "json");

    let (ok, env) = run_json(root, &["wheelchair", "create", "--type", "hovercraft"]);
    assert!(!ok);
    assert_eq!(env["code"], "E1101");
    let fields: Vec<&str> = env["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"condition"));
    assert!(fields.contains(&"source"));
}

#[test]
fn text_failures_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path(), "json");

    wc_cmd(dir.path())
        .args(["beneficiary", "show", "ben-missing"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error: ").and(predicate::str::contains("E2001")));
}

#[test]
fn arabic_locale_translates_errors() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path(), "json");

    let (ok, env) = run_json(dir.path(), &["wheelchair", "show", "whc-missing", "--locale", "ar"]);
    assert!(!ok);
    assert_eq!(env["code"], "E2002");
    let message = env["error"].as_str().unwrap();
    assert!(message.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)));
}

#[test]
fn listing_pages_through_records() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    init_project(root, "json");
    for i in 0..3 {
        create_applicant(root, &format!("Person{i}"));
    }

    let (ok, env) = run_json(root, &["beneficiary", "list", "--page", "2", "--limit", "2"]);
    assert!(ok);
    assert_eq!(env["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(env["data"]["pagination"]["total"], 3);
    assert_eq!(env["data"]["pagination"]["pages"], 2);

    let (ok, env) = run_json(root, &["beneficiary", "list", "--status", "nonsense"]);
    assert!(!ok);
    assert_eq!(env["fields"][0]["field"], "status");
}
