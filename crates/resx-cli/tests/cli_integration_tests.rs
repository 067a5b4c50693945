//! CLI integration tests
//!
//! Drive the built binary against a store in a temporary directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BUNDLE: &str = r#"
resourceType: Bundle
type: transaction
entry:
  - fullUrl: "urn:uuid:61ebe359-bfdc-4613-8bf2-c5e300945f0a"
    resource:
      resourceType: Patient
      identifier:
        - system: "http://acme.org/mrn"
          value: "12345"
      meta:
        tag:
          - system: "http://acme.org/source"
            code: "intake"
    request:
      method: POST
      url: Patient
      ifNoneExist: "identifier=http://acme.org/mrn|12345"
  - resource:
      resourceType: Observation
      subject:
        reference: "urn:uuid:61ebe359-bfdc-4613-8bf2-c5e300945f0a"
    request:
      method: POST
      url: Observation
"#;

fn resx(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_resx-cli"))
        .current_dir(dir)
        .env("RESX_LOGGING__PROFILE", "test")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn setup(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let db_path = temp_dir.path().join("store.db");
    let bundle_path = temp_dir.path().join("bundle.yaml");
    fs::write(&bundle_path, BUNDLE).unwrap();
    (db_path, bundle_path)
}

#[test]
fn test_cli_transaction_then_rerun_is_noop() {
    // GIVEN a conditional patient create and an observation citing it
    let temp_dir = TempDir::new().unwrap();
    let (db_path, bundle_path) = setup(&temp_dir);
    let db = db_path.to_str().unwrap();
    let bundle = bundle_path.to_str().unwrap();

    // WHEN the bundle is processed twice
    let first = resx(temp_dir.path(), &["transaction", bundle, "--db", db]);
    let second = resx(temp_dir.path(), &["transaction", bundle, "--db", db, "--json"]);

    // THEN the first run creates both resources
    assert!(
        first.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("with 2 creations and 0 updates"), "{}", stdout);
    assert!(stdout.contains("Patient/1/_history/1"));

    // AND the second run matches the patient and only creates the observation
    assert!(second.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(outcome["report"]["creations"], 1);
    assert_eq!(outcome["entries"][0]["operation"], "NOOP");
    assert_eq!(
        outcome["entries"][1]["resource"]["payload"]["subject"]["reference"],
        "Patient/1"
    );

    let conn = Connection::open(&db_path).unwrap();
    let patients: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM resources WHERE res_type = 'Patient'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(patients, 1);
}

#[test]
fn test_cli_failed_transaction_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let (db_path, _) = setup(&temp_dir);
    let bad = temp_dir.path().join("bad.yaml");
    fs::write(
        &bad,
        r#"
entries:
  - operation: update
    resource:
      resourceType: Patient
"#,
    )
    .unwrap();

    let output = resx(
        temp_dir.path(),
        &["transaction", bad.to_str().unwrap(), "--db", db_path.to_str().unwrap()],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{}", stderr);
}

#[test]
fn test_cli_counts_tags_and_history() {
    let temp_dir = TempDir::new().unwrap();
    let (db_path, bundle_path) = setup(&temp_dir);
    let db = db_path.to_str().unwrap();
    let ok = resx(
        temp_dir.path(),
        &["transaction", bundle_path.to_str().unwrap(), "--db", db],
    );
    assert!(ok.status.success());

    let counts = resx(temp_dir.path(), &["counts", "--db", db, "--json"]);
    assert!(counts.status.success());
    let counts: serde_json::Value = serde_json::from_slice(&counts.stdout).unwrap();
    assert_eq!(counts["Patient"], 1);
    assert_eq!(counts["Observation"], 1);

    let tags = resx(temp_dir.path(), &["tags", "--db", db]);
    assert!(tags.status.success());
    assert!(String::from_utf8_lossy(&tags.stdout).contains("http://acme.org/source|intake"));

    let history = resx(
        temp_dir.path(),
        &["history", "--db", db, "--all", "--page-size", "1"],
    );
    assert!(history.status.success());
    assert!(String::from_utf8_lossy(&history.stdout).contains("2 versions"));
}

#[test]
fn test_cli_rejects_bad_since() {
    let temp_dir = TempDir::new().unwrap();
    let (db_path, _) = setup(&temp_dir);

    let output = resx(
        temp_dir.path(),
        &["history", "--db", db_path.to_str().unwrap(), "--since", "yesterday"],
    );

    assert!(!output.status.success());
}
