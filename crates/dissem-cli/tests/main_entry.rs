//! Integration tests for the `dissem` binary entry point.
//!
//! Runs the compiled binary against a repository snapshot and checks its
//! output streams and exit codes.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/image_repository.json")
}

#[test]
fn disseminate_prints_invocation_url() {
    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .args(["--repository-base-url", "http://repo.example.org/fedora"])
        .arg("disseminate")
        .arg("--snapshot")
        .arg(fixture())
        .args(["demo:1", "demo:ImageService", "resize", "width=64"]);
    command
        .assert()
        .success()
        .stdout(contains("src=http://repo.example.org/fedora/get/demo:1/IMAGE&width=64"));
}

#[test]
fn methods_prints_json_listing() {
    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .arg("methods")
        .arg("--snapshot")
        .arg(fixture())
        .arg("demo:1");
    command
        .assert()
        .success()
        .stdout(contains("\"viewItemIndex\""))
        .stdout(contains("\"service_definition\": \"demo:ImageService\""));
}

#[test]
fn missing_required_parameter_exits_with_bad_request() {
    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .arg("disseminate")
        .arg("--snapshot")
        .arg(fixture())
        .args(["demo:1", "demo:ImageService", "resize"]);
    command
        .assert()
        .code(2)
        .stderr(contains("width"));
}

#[test]
fn unknown_object_exits_with_not_found() {
    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .arg("methods")
        .arg("--snapshot")
        .arg(fixture())
        .arg("demo:missing");
    command
        .assert()
        .code(3)
        .stderr(contains("demo:missing"));
}

#[test]
fn malformed_snapshot_is_reported() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let snapshot = temp_dir.path().join("broken.json");
    fs::write(&snapshot, "{\"objects\": [").expect("write snapshot");

    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .arg("methods")
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("demo:1");
    command
        .assert()
        .code(1)
        .stderr(contains("failed to parse snapshot"));
}

#[test]
fn configuration_file_sets_base_url() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config = temp_dir.path().join("dissem.toml");
    fs::write(
        &config,
        "repository_base_url = \"http://archive.example.org/fedora\"\nlog_format = \"compact\"\n",
    )
    .expect("write config");

    let mut command = cargo_bin_cmd!("dissem");
    command
        .env_remove("DISSEM_CONFIG_PATH")
        .arg("--config-path")
        .arg(&config)
        .arg("disseminate")
        .arg("--snapshot")
        .arg(fixture())
        .args(["demo:1", "demo:ImageService", "resize", "width=64"]);
    command
        .assert()
        .success()
        .stdout(contains("http://archive.example.org/fedora/get/demo:1/IMAGE"));
}
