// tests/config_test.rs
use release_keeper::config::{load_config, parse_config, Config, RepoConfig};
use release_keeper::ReleaseError;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.branches.trunk, "main");
    assert_eq!(config.branches.release_prefix, "release/");
    assert_eq!(config.branches.remote, "origin");
    assert_eq!(config.search.page_size, 100);
    assert_eq!(config.search.max_pages, 5);
    assert_eq!(config.github.manifest_path, ".release-please-manifest.json");
    assert_eq!(config.release_candidate.pending_label, "autorelease: pending");
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[branches]
trunk = "trunk"

[search]
max_pages = 10

[identity]
name = "release-bot"
email = "release-bot@example.com"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.branches.trunk, "trunk");
    assert_eq!(config.branches.release_prefix, "release/");
    assert_eq!(config.search.max_pages, 10);
    assert_eq!(config.search.page_size, 100);
    assert_eq!(config.identity.name, "release-bot");
    assert_eq!(config.github.api_url, "https://api.github.com");
}

#[test]
fn test_empty_file_gives_defaults() {
    assert_eq!(parse_config("").unwrap(), Config::default());
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let err = parse_config("[branches\ntrunk = ").unwrap_err();
    assert!(matches!(err, ReleaseError::Config(_)));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    assert!(load_config(Some("/nonexistent/release-keeper.toml")).is_err());
}

#[test]
#[serial]
fn test_repo_config_from_environment() {
    env::set_var("GITHUB_TOKEN", "test-token");
    env::set_var("GITHUB_REPOSITORY", "grafana/alloy");

    let cfg = RepoConfig::from_env(None, None).unwrap();
    assert_eq!(cfg.owner, "grafana");
    assert_eq!(cfg.repo, "alloy");
    assert_eq!(cfg.token, "test-token");

    let flagged = RepoConfig::from_env(Some("me"), Some("fork")).unwrap();
    assert_eq!(flagged.owner, "me");
    assert_eq!(flagged.repo, "fork");

    env::remove_var("GITHUB_TOKEN");
    env::remove_var("GITHUB_REPOSITORY");
}

#[test]
#[serial]
fn test_repo_config_requires_token() {
    env::remove_var("GITHUB_TOKEN");
    env::set_var("GITHUB_REPOSITORY", "grafana/alloy");

    let err = RepoConfig::from_env(None, None).unwrap_err();
    assert!(matches!(err, ReleaseError::Config(_)));
    assert!(err.to_string().contains("GITHUB_TOKEN"));

    env::remove_var("GITHUB_REPOSITORY");
}

#[test]
#[serial]
fn test_repo_config_requires_owner_and_repo() {
    env::set_var("GITHUB_TOKEN", "test-token");
    env::remove_var("GITHUB_REPOSITORY");

    let err = RepoConfig::from_env(Some("only-owner"), None).unwrap_err();
    assert!(err.to_string().contains("owner and name are required"));

    env::remove_var("GITHUB_TOKEN");
}
