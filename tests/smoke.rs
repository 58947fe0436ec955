//! Smoke tests -- verify the binary runs and key subcommands are wired up.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn testbridge() -> Command {
    let mut cmd = Command::cargo_bin("testbridge").unwrap();
    cmd.env_remove("TESTBRIDGE_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    testbridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run a single named test"));
}

#[test]
fn test_cli_version() {
    testbridge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("testbridge"));
}

#[test]
fn test_serve_subcommand_exists() {
    testbridge().args(["serve", "--help"]).assert().success();
}

#[test]
fn test_check_config_prints_defaults() {
    testbridge()
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("default_timeout_seconds = 600"));
}

#[test]
fn test_run_requires_test_flag() {
    testbridge().args(["run", "--mode", "edit"]).assert().failure();
}

#[test]
fn test_run_rejects_unknown_mode() {
    testbridge()
        .args(["run", "--test", "Foo", "--mode", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown test mode 'sideways'"));
}

#[cfg(unix)]
fn shell_config(script: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[runner.play]\nprogram = \"sh\"\nargs = [\"-c\", \"{}\"]",
        script
    )
    .unwrap();
    file
}

#[cfg(unix)]
#[test]
fn test_run_through_configured_command() {
    let config = shell_config("echo 'test {test} ... ok'");
    testbridge()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--test", "Foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Play test 'Foo' completed: 1/1 passed, 0 failed, 0 skipped",
        ));
}

#[cfg(unix)]
#[test]
fn test_run_json_output() {
    let config = shell_config("echo 'test {test} ... FAILED'; exit 101");
    testbridge()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--test", "Bar", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"failed\": 1"))
        .stdout(predicate::str::contains("\"mode\": \"play\""));
}

#[cfg(unix)]
#[test]
fn test_run_timeout_exits_non_zero() {
    let config = shell_config("sleep 5");
    testbridge()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--test", "Slow", "--timeout", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Test run timed out after 1 seconds"));
}

#[test]
fn test_run_json_failure_exits_non_zero() {
    testbridge()
        .args(["run", "--test", "Foo", "--mode", "sideways", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\": \"unknown test mode 'sideways'"));
}

#[cfg(unix)]
#[test]
fn test_run_json_timeout_kills_test_command() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("finished");
    let config = shell_config(&format!("sleep 2; touch '{}'", marker.display()));

    testbridge()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--test", "Slow", "--timeout", "1", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Test run timed out after 1 seconds"));

    std::thread::sleep(std::time::Duration::from_secs(3));
    assert!(!marker.exists(), "test command outlived the bridge");
}
