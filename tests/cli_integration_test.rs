//! CLI integration tests for the signal-lab binary.
//!
//! Each test runs the built binary in an isolated working directory with
//! the scripted driver, so no network access is needed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn signal_lab(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_signal-lab"))
        .current_dir(dir)
        .env("SIGNAL_LAB_LOGGING__LEVEL", "warn")
        .args(args)
        .output()
        .expect("Failed to run signal-lab")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "Failed to parse JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn test_config_show_json_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let output = signal_lab(dir.path(), &["config", "show", "--json"]);

    assert!(output.status.success());
    let config = stdout_json(&output);
    assert_eq!(config["verification"]["max_iterations"], 5);
    assert_eq!(config["verification"]["target_signal_health"], 100);
    assert_eq!(config["deployment"]["mode"], "simulated");
}

#[test]
fn test_config_file_is_merged() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".signal-lab")).unwrap();
    std::fs::write(
        dir.path().join(".signal-lab/config.yaml"),
        "verification:\n  max_iterations: 2\n",
    )
    .unwrap();

    let output = signal_lab(dir.path(), &["config", "show", "--json"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["verification"]["max_iterations"], 2);
}

#[test]
fn test_known_config_list_and_check() {
    let dir = TempDir::new().unwrap();

    let list = signal_lab(dir.path(), &["known-config", "list", "--json"]);
    assert!(list.status.success());
    let list = stdout_json(&list);
    assert_eq!(list["total"], 2);
    assert_eq!(list["entries"][0]["domain"], "lwscientific.com");

    let check = signal_lab(
        dir.path(),
        &["known-config", "check", "https://www.lwscientific.com", "--json"],
    );
    assert!(check.status.success());
    assert_eq!(stdout_json(&check)["entry"]["signalHealth"], 100);
}

#[test]
fn test_audit_then_repair_with_scripted_driver() {
    let dir = TempDir::new().unwrap();

    let audit = signal_lab(
        dir.path(),
        &[
            "audit",
            "https://demo.example.com",
            "--driver",
            "scripted",
            "--revenue",
            "50000",
            "--json",
        ],
    );
    // Health 60 is below the default minimum of 80.
    assert_eq!(audit.status.code(), Some(1));
    let audit = stdout_json(&audit);
    assert_eq!(audit["audit"]["signalHealth"], 60);

    let saved = audit["reportLocation"].as_str().expect("audit saved");
    let saved = dir.path().join(saved);
    assert!(saved.exists());

    let repair = signal_lab(
        dir.path(),
        &["repair", saved.to_str().unwrap(), "--format", "js", "--json"],
    );
    assert!(repair.status.success());
    let repair = stdout_json(&repair);
    assert_eq!(repair["report"]["summary"]["totalFixes"], 2);

    let stem = saved.file_stem().unwrap().to_string_lossy().into_owned();
    let repairs_file: PathBuf = saved.with_file_name(format!("{stem}-repairs.json"));
    assert!(repairs_file.exists());
}

#[test]
fn test_invalid_url_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let output = signal_lab(dir.path(), &["verify", "ftp://nope", "--json"]);

    assert_eq!(output.status.code(), Some(1));
    let error = stdout_json(&output);
    assert!(error["error"].as_str().is_some());
    assert!(error["causes"]
        .as_array()
        .is_some_and(|causes| causes.iter().any(|c| c
            .as_str()
            .is_some_and(|c| c.contains("unsupported scheme")))));
}

#[test]
fn test_verify_rejects_out_of_range_max_iterations() {
    let dir = TempDir::new().unwrap();
    let output = signal_lab(
        dir.path(),
        &[
            "verify",
            "https://demo.example.com",
            "--driver",
            "scripted",
            "--max-iterations",
            "500",
            "--json",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let error = stdout_json(&output);
    assert!(error["causes"]
        .as_array()
        .is_some_and(|causes| causes.iter().any(|c| c
            .as_str()
            .is_some_and(|c| c.contains("Invalid max_iterations")))));
}
