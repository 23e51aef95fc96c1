//! Stale-issue triage policy.
//!
//! Issues past the close threshold receive a warning comment; once the
//! warning has aged past the grace period the issue is closed, commented,
//! and optionally labelled. Hidden HTML markers in the bot's own comments
//! make re-runs idempotent.

pub mod markers;
pub mod stale_closer;

pub use markers::{STALE_MARKER, WARN_MARKER};
pub use stale_closer::{
    SkipReason, StaleCloser, StaleCloserPolicy, TriageDecision, TriageSummary, classify,
};
