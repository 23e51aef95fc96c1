//! Mothball library crate for GitHub stale-issue triage.
//!
//! The library wraps Octocrab to search a repository for unattended open
//! issues, warn and close them according to a configurable policy, and
//! surface friendly errors that can be displayed in the CLI. It also
//! provides the reusable UI scaffolding the triage tooling is built on: an
//! incrementally loaded item tree, a wizard stepper with back-navigation,
//! and a telemetry-backed error reporting wrapper.

pub mod config;
pub mod github;
pub mod reporting;
pub mod telemetry;
pub mod tree;
pub mod triage;
pub mod wizard;

pub use config::MothballConfig;
pub use github::{
    IssueGateway, OctocrabIssueGateway, PersonalAccessToken, ReadonlyGateway, RepositoryLocator,
    TriageError,
};
pub use triage::{StaleCloser, StaleCloserPolicy, TriageSummary};
