//! Error types exposed by the GitHub triage layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while parsing input or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriageError {
    /// The repository path segments were missing or empty.
    #[error("repository must be given as owner and name")]
    MissingRepository,

    /// The provided URL could not be parsed.
    #[error("repository URL is invalid: {0}")]
    InvalidUrl(String),

    /// The issue number is not a positive integer.
    #[error("issue number must be a positive integer")]
    InvalidIssueNumber,

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from the rate limit endpoint.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// The configured actor lacks the permission needed to triage.
    #[error("actor `{actor}` has `{permission}` permission; write access is required")]
    InsufficientPermission {
        /// Login the bot was configured to act as.
        actor: String,
        /// Permission level GitHub reported for that login.
        permission: String,
    },

    /// A search walked more pages than the configured safety cap.
    #[error("search exceeded {max_pages} pages; narrow the query")]
    SearchPageCap {
        /// Maximum number of pages the runner is willing to walk.
        max_pages: u32,
    },
}
