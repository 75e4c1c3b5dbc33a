use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

const CONFIG_FILE_NAME: &str = "release-keeper.toml";

/// Represents the complete configuration for release-keeper.
///
/// Contains branch naming conventions, history search bounds, the git identity used for
/// working-copy commits and the hosting endpoints.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub release_candidate: ReleaseCandidateConfig,
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_release_prefix() -> String {
    "release/".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Branch naming conventions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_trunk")]
    pub trunk: String,

    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            trunk: default_trunk(),
            release_prefix: default_release_prefix(),
            remote: default_remote(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

/// Bounds for marker searches through branch history.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_identity_name() -> String {
    "github-actions[bot]".to_string()
}

fn default_identity_email() -> String {
    "github-actions[bot]@users.noreply.github.com".to_string()
}

/// Author identity for commits made in the working copy or through libgit2.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_name")]
    pub name: String,

    #[serde(default = "default_identity_email")]
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            name: default_identity_name(),
            email: default_identity_email(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_manifest_path() -> String {
    ".release-please-manifest.json".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_web_url")]
    pub web_url: String,

    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: default_api_url(),
            web_url: default_web_url(),
            manifest_path: default_manifest_path(),
        }
    }
}

fn default_pending_label() -> String {
    "autorelease: pending".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseCandidateConfig {
    /// Label release-please puts on its open release PR
    #[serde(default = "default_pending_label")]
    pub pending_label: String,
}

impl Default for ReleaseCandidateConfig {
    fn default() -> Self {
        ReleaseCandidateConfig {
            pending_label: default_pending_label(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-keeper.toml` in current directory
/// 3. `release-keeper.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    parse_config(&config_str)
}

/// Parses a TOML document into a [Config], filling unspecified keys with defaults.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| ReleaseError::config(format!("Invalid configuration file: {}", e)))?;

    if config.search.page_size == 0 || config.search.max_pages == 0 {
        return Err(ReleaseError::config(
            "search.page_size and search.max_pages must be greater than zero",
        ));
    }

    Ok(config)
}

/// Repository coordinates and credentials for the hosting platform.
#[derive(Clone, PartialEq)]
pub struct RepoConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
}

impl std::fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RepoConfig {
    /// Builds the repository configuration from flags and the environment.
    ///
    /// `GITHUB_TOKEN` is required. Owner and repo come from the flags when both are
    /// given, otherwise from `GITHUB_REPOSITORY` (`owner/repo`).
    pub fn from_env(owner: Option<&str>, repo: Option<&str>) -> Result<Self> {
        let token = env::var("GITHUB_TOKEN").unwrap_or_default();
        let combined = env::var("GITHUB_REPOSITORY").ok();
        Self::resolve(owner, repo, &token, combined.as_deref())
    }

    /// Pure form of [RepoConfig::from_env].
    pub fn resolve(
        owner: Option<&str>,
        repo: Option<&str>,
        token: &str,
        combined: Option<&str>,
    ) -> Result<Self> {
        if token.is_empty() {
            return Err(ReleaseError::config(
                "GITHUB_TOKEN environment variable is required",
            ));
        }

        let (mut owner, mut repo) = (
            owner.unwrap_or_default().to_string(),
            repo.unwrap_or_default().to_string(),
        );

        if owner.is_empty() || repo.is_empty() {
            if let Some((o, r)) = combined.and_then(|value| value.split_once('/')) {
                owner = o.to_string();
                repo = r.to_string();
            }
        }

        if owner.is_empty() || repo.is_empty() {
            return Err(ReleaseError::config(
                "Repository owner and name are required (use --owner and --repo, or set GITHUB_REPOSITORY=owner/repo)",
            ));
        }

        Ok(RepoConfig {
            owner,
            repo,
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_flags() {
        let cfg = RepoConfig::resolve(Some("me"), Some("tool"), "t", Some("other/repo")).unwrap();
        assert_eq!(cfg.owner, "me");
        assert_eq!(cfg.repo, "tool");
    }

    #[test]
    fn test_resolve_falls_back_to_combined_variable() {
        let cfg = RepoConfig::resolve(None, None, "t", Some("grafana/alloy")).unwrap();
        assert_eq!(cfg.owner, "grafana");
        assert_eq!(cfg.repo, "alloy");
    }

    #[test]
    fn test_resolve_requires_token() {
        let err = RepoConfig::resolve(Some("a"), Some("b"), "", None).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_resolve_rejects_malformed_combined_variable() {
        let err = RepoConfig::resolve(None, None, "t", Some("no-slash")).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cfg = RepoConfig::resolve(Some("a"), Some("b"), "secret-token", None).unwrap();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn test_parse_rejects_zero_page_size() {
        let err = parse_config("[search]\npage_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }
}
