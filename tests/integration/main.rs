//! Integration tests for the qualities CLI
//!
//! Each test drives the built binary inside a throwaway git work tree.

#[path = "../common/mod.rs"]
#[allow(dead_code)]
mod common;


use assert_cmd::cargo;
use predicates::prelude::*;

use common::git_repo::TempProject;

/// Helper function to create a qualities command
fn qualities() -> assert_cmd::Command {
    assert_cmd::Command::new(cargo::cargo_bin!("qualities"))
}

#[test]
fn test_version() {
    qualities()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qualities v"));
}

#[test]
fn test_version_json() {
    let output = qualities().args(["--json", "version"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["version"].is_string());
}

#[test]
fn test_init_creates_config_once() {
    let project = TempProject::with_git();

    qualities()
        .arg("init")
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .qualities.toml"));

    assert!(project.exists(".qualities.toml"));
    assert!(project.exists(".qualities/manifests"));
    assert_eq!(project.read_file(".qualities/.gitignore"), "*\n");

    qualities()
        .arg("init")
        .current_dir(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Already initialized"));

    qualities().args(["init", "--force"]).current_dir(project.path()).assert().success();
}

#[test]
fn test_commands_require_config() {
    let project = TempProject::with_git();

    qualities()
        .arg("scan")
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("qualities init"));
}

#[test]
fn test_invalid_config_is_reported() {
    let project = TempProject::with_git();
    project.write_file(
        ".qualities.toml",
        "[[stage]]\nid = \"a\"\ncommand = \"true\"\n\n[[stage]]\nid = \"a\"\ncommand = \"true\"\n",
    );

    qualities()
        .args(["run", "--ci"])
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate stage id: a"));
}

#[test]
fn test_run_scopes_are_exclusive() {
    let project = TempProject::with_git();
    project.write_file(".qualities.toml", "");

    qualities()
        .args(["run", "--ci", "--diagnostics"])
        .current_dir(project.path())
        .assert()
        .failure();
}
