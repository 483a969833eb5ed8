mod common;

use std::fs;
use std::process::{Command, Output};

use common::data_path;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_growout"))
        .args(args)
        .output()
        .expect("growout process should run")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "growout failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8")
}

#[test]
fn demo_farm_report_lists_outlook_history_and_summary() {
    let dataset = data_path("demo_farm.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--cage",
        "1",
        "--today",
        "2025-03-01",
    ]);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("--- Harvest Outlook ---"));
    assert!(stdout.contains("157 days -> 2025-07-29"), "stdout: {stdout}");
    assert!(stdout.contains("ready"));
    assert!(stdout.contains("--- Cage 1 History ---"));
    assert!(stdout.contains("--- Suggested Schedule ---"));
    assert!(stdout.contains("Auto-Generated Four Times Daily Schedule (weight-based, 24.15 kg/day)"));
    assert!(stdout.contains("--- Sampling Summary ---"));
    assert!(stdout.contains("--- Feeding Adherence 2025-02-24 to 2025-03-02 ---"));
}

#[test]
fn investor_scope_limits_the_outlook() {
    let dataset = data_path("demo_farm.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--investor",
        "2",
        "--today",
        "2025-03-01",
    ]);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("cage   3 (Santos)"), "stdout: {stdout}");
    assert!(!stdout.contains("Garcia"));
}

#[test]
fn csv_exports_are_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let history = dir.path().join("history.csv");
    let harvest = dir.path().join("harvest.csv");
    let dataset = data_path("demo_farm.toml");

    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--cage",
        "1",
        "--today",
        "2025-03-01",
        "--history-out",
        history.to_str().expect("utf-8 path"),
        "--harvest-out",
        harvest.to_str().expect("utf-8 path"),
    ]);
    stdout_of(&output);

    let history_csv = fs::read_to_string(&history).expect("history written");
    let lines: Vec<&str> = history_csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("date,doc,stocks"));
    assert!(lines[2].starts_with("2025-02-22,DOC-20250222-20002,5000,50,4950,3,161.00"));

    let harvest_csv = fs::read_to_string(&harvest).expect("harvest written");
    let lines: Vec<&str> = harvest_csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("3,Santos,2025-02-10"));
    assert!(lines[2].starts_with("1,Garcia,2025-02-22"));
}

#[test]
fn config_file_overrides_defaults() {
    let dataset = data_path("demo_farm.toml");
    let config = data_path("fry_settings.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--config",
        config.to_str().expect("utf-8 path"),
        "--today",
        "2025-03-01",
    ]);
    let stdout = stdout_of(&output);

    // 161 g is past the 150 g fry target.
    assert!(stdout.contains("target=150 g"), "stdout: {stdout}");
}

#[test]
fn unknown_preset_fails() {
    let dataset = data_path("demo_farm.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--preset",
        "hatchery",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"));
}

#[test]
fn missing_dataset_fails() {
    let output = run(&["--today", "2025-03-01"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--dataset is required"));
}

#[test]
fn dashboard_compares_against_previous_period() {
    let dataset = data_path("demo_farm.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--today",
        "2025-03-01",
        "--dashboard",
        "30days",
    ]);
    let stdout = stdout_of(&output);

    assert!(
        stdout.contains("--- Dashboard: Custom Period (2025-01-30 to 2025-03-01) ---"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("Samplings:      2 in period / 3 total"));
    assert!(stdout.contains("samplings +100.00%"));
}

#[test]
fn custom_dashboard_uses_from_and_to() {
    let dataset = data_path("demo_farm.toml");
    let output = run(&[
        "--dataset",
        dataset.to_str().expect("utf-8 path"),
        "--today",
        "2025-03-01",
        "--dashboard",
        "custom",
        "--from",
        "2025-02-01",
        "--to",
        "2025-02-28",
    ]);
    let stdout = stdout_of(&output);

    assert!(
        stdout.contains("--- Dashboard: This Month (2025-02-01 to 2025-02-28) ---"),
        "stdout: {stdout}"
    );
}
