//! The `drift` binary.

use assert_cmd::Command;
use predicates::prelude::*;

use drift_cli::test_utils::{ConfigFixture, TestProject};

fn drift() -> Command {
    Command::cargo_bin("drift").unwrap()
}

#[test]
fn test_check_reports_cycle_and_fails() {
    let project = TestProject::new().unwrap();
    project.add_skill("skill-a", &["skill-b"]).unwrap();
    project.add_skill("skill-b", &["skill-a"]).unwrap();
    ConfigFixture::cycles_only().write_to(&project).unwrap();

    drift()
        .current_dir(project.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("skill-a → skill-b → skill-a"))
        .stderr(predicate::str::contains("Check failed"));
}

#[test]
fn test_check_passes_on_clean_project() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &["b"]).unwrap();
    project.add_skill("b", &[]).unwrap();
    ConfigFixture::graph_rules(true).write_to(&project).unwrap();

    drift()
        .arg("check")
        .arg("--project")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 bundles against 3 rules"));
}

#[test]
fn test_check_json_output() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &["b", "c"]).unwrap();
    project.add_skill("b", &["c"]).unwrap();
    project.add_skill("c", &[]).unwrap();
    ConfigFixture::graph_rules(false).write_to(&project).unwrap();

    let output = drift()
        .current_dir(project.path())
        .args(["check", "--format", "json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["rules"], 3);
    let a = &report["bundles"][0];
    assert_eq!(a["bundle_id"], "a");
    assert_eq!(a["failures"][0]["failure_details"]["duplicate_resource"], "c");
    assert_eq!(a["execution_details"][1]["status"], "failed");
}

#[test]
fn test_check_without_config_has_no_rules() {
    let project = TestProject::new().unwrap();

    drift()
        .current_dir(project.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules configured"));
}

#[test]
fn test_missing_provider_is_reported_with_suggestion() {
    let project = TestProject::new().unwrap();
    ConfigFixture::missing_provider().write_to(&project).unwrap();

    drift()
        .current_dir(project.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("specify a provider"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_invalid_config_syntax() {
    let project = TestProject::new().unwrap();
    ConfigFixture::invalid_syntax().write_to(&project).unwrap();

    drift()
        .current_dir(project.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".drift.toml"));
}

#[test]
fn test_cache_clear() {
    let project = TestProject::new().unwrap();
    project.write_file(".drift/cache/one.json", "{}").unwrap();
    project.write_file(".drift/cache/two.json", "{}").unwrap();

    drift()
        .current_dir(project.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 cached responses"));
    assert!(!project.path().join(".drift/cache/one.json").exists());
}
