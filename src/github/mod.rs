//! GitHub issue access for the triage bot.
//!
//! This module wraps Octocrab to search, read, comment on, label, and close
//! issues. Errors are mapped into user-friendly variants so that callers can
//! surface precise failures without exposing Octocrab internals, and a
//! readonly wrapper makes dry runs safe against live repositories.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;
pub mod search;

pub use error::TriageError;
pub use gateway::{IssueGateway, OctocrabIssueGateway, ReadonlyGateway};
pub use locator::{
    IssueNumber, PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner,
};
pub use models::{Comment, Issue, IssueState, Permission};
pub use rate_limit::RateLimitInfo;
pub use search::{SearchPage, SearchQuery, SearchRunner};

#[cfg(test)]
pub use gateway::MockIssueGateway;

#[cfg(test)]
pub(crate) mod test_fixtures;
