// tests/cli_test.rs
use std::process::Command;

fn release_keeper() -> Command {
    Command::new(env!("CARGO_BIN_EXE_release-keeper"))
}

#[test]
fn test_help_lists_workflows() {
    let output = release_keeper().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in [
        "create-rc",
        "create-release-branch",
        "backport",
        "forwardport",
        "sync-release-branch",
        "sync-release-pr",
    ] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_version() {
    let output = release_keeper().arg("--version").output().expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_token_fails_before_any_call() {
    let output = release_keeper()
        .args(["forwardport", "--pr", "12"])
        .env_remove("GITHUB_TOKEN")
        .env("GITHUB_REPOSITORY", "grafana/alloy")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("GITHUB_TOKEN"));
}

#[test]
fn test_malformed_backport_label_is_rejected() {
    let output = release_keeper()
        .args(["backport", "--pr", "42", "--label", "backport-1.15"])
        .env("GITHUB_TOKEN", "unused")
        .env("GITHUB_REPOSITORY", "grafana/alloy")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid backport label format"));
}

#[test]
fn test_run_components() {
    let output = release_keeper()
        .args(["run-components", "--concurrent"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1 component(s) completed"));
}
