//! Application configuration loaded from CLI, environment, and files.
//!
//! A single struct merges values from command-line arguments, environment
//! variables, and configuration files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.mothball.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `MOTHBALL_REPO`, `MOTHBALL_TOKEN`, or
//!    legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--repo`/`-r`, `--token`/`-t`, and so on
//!
//! # Configuration File
//!
//! Place `.mothball.toml` in the current directory, home directory, or XDG
//! config directory with:
//!
//! ```toml
//! owner = "octocat"
//! repo = "hello-world"
//! token = "ghp_example"
//! close_days = 7
//! warn_days = 2
//! labels_to_exclude = ["keep", "blocked"]
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::TriageError;
use crate::triage::StaleCloserPolicy;

/// Days from creation until an unattended issue is closed.
pub const DEFAULT_CLOSE_DAYS: u32 = 7;

/// Days of grace between the warning comment and the close.
pub const DEFAULT_WARN_DAYS: u32 = 2;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `MOTHBALL_OWNER` or `--owner`: Repository owner
/// - `MOTHBALL_REPO` or `--repo`: Repository name
/// - `MOTHBALL_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `MOTHBALL_ACTOR` or `--actor`: Login whose write access is verified
/// - `MOTHBALL_BASE_URL` or `--base-url`: GitHub host for Enterprise setups
///
/// # Example
///
/// ```no_run
/// use mothball::MothballConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = MothballConfig::load().expect("failed to load configuration");
/// let (owner, repo) = config.require_repository_info().expect("repository required");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "MOTHBALL",
    discovery(
        dotfile_name = ".mothball.toml",
        config_file_name = "mothball.toml",
        app_name = "mothball"
    )
)]
pub struct MothballConfig {
    /// Repository owner (e.g., "octocat").
    ///
    /// Can be provided via:
    /// - CLI: `--owner <OWNER>` or `-o <OWNER>`
    /// - Environment: `MOTHBALL_OWNER`
    /// - Config file: `owner = "..."`
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "hello-world").
    ///
    /// Can be provided via:
    /// - CLI: `--repo <REPO>` or `-r <REPO>`
    /// - Environment: `MOTHBALL_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `MOTHBALL_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// GitHub host URL, for Enterprise installations.
    ///
    /// Defaults to `https://github.com`. Other hosts are addressed through
    /// their `/api/v3` prefix.
    #[ortho_config()]
    pub base_url: Option<String>,

    /// Login whose write access is verified before any mutation.
    ///
    /// When unset, permission verification is skipped and the token is
    /// trusted as-is.
    #[ortho_config()]
    pub actor: Option<String>,

    /// Days from creation until an unattended issue is closed.
    #[ortho_config()]
    pub close_days: u32,

    /// Days of grace between the warning comment and the close.
    ///
    /// Must be positive and strictly less than `close_days`.
    #[ortho_config()]
    pub warn_days: u32,

    /// Body of the warning comment; a marker is appended automatically.
    #[ortho_config()]
    pub warn_comment: Option<String>,

    /// Body of the closing comment; a marker is appended automatically.
    #[ortho_config()]
    pub close_comment: Option<String>,

    /// Issues with at least this many thumbs-up reactions are never acted
    /// on.
    #[ortho_config()]
    pub upvotes_required: Option<u32>,

    /// Issues with at least this many comments are never acted on.
    #[ortho_config(cli_short = 'N')]
    pub num_comments_override: Option<u32>,

    /// Only issues in this milestone are considered.
    #[ortho_config()]
    pub candidate_milestone: Option<String>,

    /// Issues carrying any of these labels are skipped.
    #[ortho_config()]
    pub labels_to_exclude: Vec<String>,

    /// Label added to issues as they are closed.
    #[ortho_config()]
    pub stale_label: Option<String>,

    /// Logs intended mutations instead of performing them.
    ///
    /// Can be provided via:
    /// - CLI: `--readonly` / `-n`
    /// - Config file: `readonly = true`
    ///
    /// Note: Environment variable `MOTHBALL_READONLY` is not supported
    /// because `ortho_config` does not load boolean values from the
    /// environment.
    #[ortho_config(cli_short = 'n')]
    pub readonly: bool,
}

impl Default for MothballConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            base_url: None,
            actor: None,
            close_days: DEFAULT_CLOSE_DAYS,
            warn_days: DEFAULT_WARN_DAYS,
            warn_comment: None,
            close_comment: None,
            upvotes_required: None,
            num_comments_override: None,
            candidate_milestone: None,
            labels_to_exclude: Vec::new(),
            stale_label: None,
            readonly: false,
        }
    }
}

impl MothballConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// For backward compatibility, if no token is provided via
    /// `MOTHBALL_TOKEN`, the CLI, or a configuration file, this method falls
    /// back to reading `GITHUB_TOKEN` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, TriageError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(TriageError::MissingToken)
    }

    /// Returns owner and repo if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] when owner or repo is missing.
    pub fn require_repository_info(&self) -> Result<(&str, &str), TriageError> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Ok((owner.as_str(), repo.as_str())),
            (None, _) => Err(TriageError::Configuration {
                message: "repository owner is required (use --owner or -o)".to_owned(),
            }),
            (_, None) => Err(TriageError::Configuration {
                message: "repository name is required (use --repo or -r)".to_owned(),
            }),
        }
    }

    /// GitHub host URL, defaulting to `https://github.com`.
    #[must_use]
    pub fn host_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("https://github.com")
    }

    /// Builds the validated triage policy from the configured thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] when the thresholds are
    /// inconsistent.
    pub fn policy(&self) -> Result<StaleCloserPolicy, TriageError> {
        let policy = StaleCloserPolicy {
            close_days: self.close_days,
            warn_days: self.warn_days,
            upvotes_required: self.upvotes_required,
            num_comments_override: self.num_comments_override,
            candidate_milestone: self.candidate_milestone.clone(),
            labels_to_exclude: self.labels_to_exclude.clone(),
        };
        policy.validate()?;
        Ok(policy)
    }
}
