//! Integration tests for the firmdex query and add commands

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated home with its own store file, so nothing touches the real
/// config or data directories.
struct TestEnv {
    temp_dir: TempDir,
    store_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("contacts.json");
        Self {
            temp_dir,
            store_path,
        }
    }

    fn with_store(contents: &str) -> Self {
        let env = Self::new();
        fs::write(&env.store_path, contents).unwrap();
        env
    }

    /// Run firmdex against this environment's store
    fn firmdex(&self) -> AssertCommand {
        let mut cmd = firmdex_cmd(self.temp_dir.path());
        cmd.args(["--store", self.store_path.to_str().unwrap()]);
        cmd
    }
}

fn firmdex_cmd(home: &Path) -> AssertCommand {
    let mut cmd = AssertCommand::cargo_bin("firmdex").unwrap();
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("XDG_DATA_HOME", home.join(".local/share"));
    cmd
}

const SAMPLE_STORE: &str = r#"[
  {"company":"Caspian Foods","manager":"L. Karimi","phone":"021-555-0184",
   "logo":"logos/caspian.png","location":{"lat":35.7219,"lng":51.3347}},
  {"company":"Alborz Logistics","manager":"M. Rahimi","phone":"021-555-0327",
   "logo":"logos/alborz.png"}
]"#;

// =============================================================================
// query
// =============================================================================

#[test]
fn query_matches_company_case_insensitively() {
    let env = TestEnv::with_store(SAMPLE_STORE);

    env.firmdex()
        .args(["query", "CASPIAN"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Found 1 contact(s) matching \"CASPIAN\"",
        ))
        .stdout(predicate::str::contains(
            "Caspian Foods\tL. Karimi\t021-555-0184",
        ))
        .stdout(predicate::str::contains("Alborz").not());
}

#[test]
fn query_with_blank_input_lists_everything() {
    let env = TestEnv::with_store(SAMPLE_STORE);

    env.firmdex()
        .args(["query", "  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 contact(s)"))
        .stdout(predicate::str::contains("Caspian Foods"))
        .stdout(predicate::str::contains("Alborz Logistics"));
}

#[test]
fn query_reports_when_nothing_matches() {
    let env = TestEnv::with_store(SAMPLE_STORE);

    env.firmdex()
        .args(["query", "zzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches for \"zzz\""));
}

#[test]
fn missing_store_falls_back_to_seed_contacts() {
    let env = TestEnv::new();

    env.firmdex()
        .args(["query", "caspian"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Caspian Foods"));
}

#[test]
fn malformed_store_warns_and_uses_seed_contacts() {
    let env = TestEnv::with_store("{ definitely not json");

    env.firmdex()
        .args(["query", "caspian"])
        .assert()
        .success()
        .stderr(predicate::str::contains("starting from defaults"))
        .stdout(predicate::str::contains("Caspian Foods"));
}

// =============================================================================
// add
// =============================================================================

#[test]
fn add_then_query_round_trips() {
    let env = TestEnv::with_store("[]");

    env.firmdex()
        .args([
            "add",
            "--company",
            "Karun Shipping",
            "--manager",
            "A. Moradi",
            "--phone",
            "061-555-0109",
            "--lat",
            "30.33",
            "--lng",
            "48.30",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added \"Karun Shipping\""));

    env.firmdex()
        .args(["query", "karun"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Karun Shipping\tA. Moradi\t061-555-0109",
        ));

    // Stored record carries a generated id and the coordinates
    let raw = fs::read_to_string(&env.store_path).unwrap();
    assert!(raw.contains("\"id\""));
    assert!(raw.contains("48.3"));
}

#[test]
fn add_rejects_latitude_without_longitude() {
    let env = TestEnv::with_store("[]");

    env.firmdex()
        .args([
            "add", "--company", "Acme", "--manager", "Jo", "--phone", "555", "--lat", "10.0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--lat and --lng"));
}

#[test]
fn add_rejects_blank_required_fields() {
    let env = TestEnv::with_store("[]");

    env.firmdex()
        .args(["add", "--company", "  ", "--manager", "Jo", "--phone", "555"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--company"));

    let raw = fs::read_to_string(&env.store_path).unwrap();
    assert_eq!(raw, "[]");
}

#[test]
fn add_without_logo_stores_the_placeholder() {
    let env = TestEnv::with_store("[]");

    env.firmdex()
        .args(["add", "--company", "Acme", "--manager", "Jo", "--phone", "555"])
        .assert()
        .success();

    let raw = fs::read_to_string(&env.store_path).unwrap();
    assert!(raw.contains("logos/placeholder.png"));
}
