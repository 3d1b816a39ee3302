//! Integration tests for the wh CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// A wh command bound to a fresh database inside `tmp`, isolated from the
/// user's own configuration
fn wh(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wh").unwrap();
    cmd.env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config"))
        .env("XDG_DATA_HOME", tmp.path().join("data"))
        .env_remove("WAREHOUSE_DB")
        .env_remove("WAREHOUSE_LOG")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(tmp.path().join("inventory.db"));
    cmd
}

fn register_resistor(tmp: &TempDir, part: &str, manufacturer: &str, ohms: &str) {
    wh(tmp)
        .args([
            "register",
            "Resistor",
            part,
            manufacturer,
            "--package",
            "0805",
            "--rating",
            &format!("resistance={}", ohms),
        ])
        .assert()
        .success();
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.args(["--format", "json"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help() {
    let tmp = TempDir::new().unwrap();
    wh(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_register_and_show() {
    let tmp = TempDir::new().unwrap();
    wh(&tmp)
        .args(["register", "Resistor", "C1001", "ACME", "-r", "resistance=4.7k", "-r", "tolerance=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered component"));

    wh(&tmp)
        .args(["show", "C1001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4.7kΩ"))
        .stdout(predicate::str::contains("1%"))
        .stdout(predicate::str::contains("ohm"))
        .stdout(predicate::str::contains("Resistor"));
}

#[test]
fn test_register_duplicate_fails() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "C1001", "ACME", "4.7k");

    wh(&tmp)
        .args(["register", "Resistor", "C1001", "ACME"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));
}

#[test]
fn test_register_rejects_wrong_unit() {
    let tmp = TempDir::new().unwrap();
    wh(&tmp)
        .args(["register", "Resistor", "R1", "ACME", "-r", "resistance=10kF"])
        .assert()
        .failure();

    wh(&tmp)
        .args(["find", "R1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No components found"));
}

#[test]
fn test_stock_in_and_out() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "C1001", "ACME", "4.7k");

    wh(&tmp)
        .args(["in", "C1001", "100", "--date", "2023-01-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stock: 100"));
    wh(&tmp)
        .args(["in", "C1001", "50", "--date", "2023-01-12", "--note", "reel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stock: 150"));

    wh(&tmp)
        .args(["out", "C1001", "200", "--date", "2023-01-13"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient stock"));

    wh(&tmp)
        .args(["out", "C1001", "150", "--date", "2023-01-13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stock: 0"));
}

#[test]
fn test_invalid_quantity_and_date() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "C1001", "ACME", "4.7k");

    wh(&tmp)
        .args(["in", "C1001", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid quantity"));
    wh(&tmp)
        .args(["in", "C1001", "-5"])
        .assert()
        .failure();
    wh(&tmp)
        .args(["in", "C1001", "5", "--date", "13/01/2023"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a calendar date"));
}

#[test]
fn test_history_json() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "C1001", "ACME", "4.7k");
    wh(&tmp).args(["in", "C1001", "20", "-d", "2023-01-12"]).assert().success();
    wh(&tmp).args(["in", "C1001", "10", "-d", "2023-01-10"]).assert().success();
    wh(&tmp).args(["out", "C1001", "5", "-d", "2023-01-12"]).assert().success();

    let history = json_output(wh(&tmp).args(["history", "C1001"]));
    let dates: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["movement_date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(dates, vec!["2023-01-10", "2023-01-12", "2023-01-12"]);

    let withdrawals = json_output(wh(&tmp).args(["history", "C1001", "--kind", "out"]));
    assert_eq!(withdrawals.as_array().unwrap().len(), 1);
    assert_eq!(withdrawals[0]["quantity"], -5);
}

#[test]
fn test_find_is_ordered_and_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "RC0805-1K", "Yageo", "1k");
    register_resistor(&tmp, "RC0805-10K", "Yageo", "10k");
    register_resistor(&tmp, "RC0805-10K", "Bourns", "10k");
    register_resistor(&tmp, "RC0603-1K", "Yageo", "1k");

    let found = json_output(wh(&tmp).args(["find", "rc0805"]));
    let identities: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            format!(
                "{}/{}",
                c["part_number"].as_str().unwrap(),
                c["manufacturer"].as_str().unwrap()
            )
        })
        .collect();
    assert_eq!(
        identities,
        vec!["RC0805-10K/Bourns", "RC0805-10K/Yageo", "RC0805-1K/Yageo"]
    );
}

#[test]
fn test_ambiguous_part_needs_manufacturer() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "R10K", "Yageo", "10k");
    register_resistor(&tmp, "R10K", "Bourns", "10k");

    wh(&tmp)
        .args(["show", "R10K"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("several manufacturers"));
    wh(&tmp)
        .args(["show", "R10K", "-m", "Bourns"])
        .assert()
        .success();
}

#[test]
fn test_search_by_rating_range() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "R100", "Yageo", "100");
    register_resistor(&tmp, "R220", "Yageo", "220");
    register_resistor(&tmp, "R470", "Yageo", "470");

    let found = json_output(wh(&tmp).args(["search", "Resistor", "-r", "resistance=100..220"]));
    let parts: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["part_number"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(parts, vec!["R100", "R220"]);
}

#[test]
fn test_list_metadata() {
    let tmp = TempDir::new().unwrap();
    register_resistor(&tmp, "R1", "Yageo", "1");
    register_resistor(&tmp, "R2", "Bourns", "2");

    wh(&tmp)
        .args(["list", "manufacturers"])
        .assert()
        .success()
        .stdout("Bourns\nYageo\n");

    let packages = json_output(wh(&tmp).args(["list", "packages"]));
    assert_eq!(packages, serde_json::json!(["0805"]));
}

#[test]
fn test_unusable_database_path() {
    let tmp = TempDir::new().unwrap();
    Command::cargo_bin("wh")
        .unwrap()
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config"))
        .env_remove("WAREHOUSE_DB")
        .arg("--db")
        .arg(tmp.path().join("missing/dir/inventory.db"))
        .args(["list", "types"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("store unavailable"));
}

#[test]
fn test_database_from_environment() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("env.db");
    Command::cargo_bin("wh")
        .unwrap()
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config"))
        .env("WAREHOUSE_DB", &db)
        .args(["register", "Capacitor", "C4N7", "TDK", "-r", "capacitance=4.7nF"])
        .assert()
        .success();
    assert!(db.exists());
}
