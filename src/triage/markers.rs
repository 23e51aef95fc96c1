//! Idempotency sentinels embedded in bot comments.
//!
//! Every comment the bot posts carries a hidden HTML comment. Re-runs look
//! for these markers in the existing discussion instead of keeping state of
//! their own, so a crashed or repeated run never posts duplicates.

use crate::github::models::Comment;

/// Marker appended to warning comments.
pub const WARN_MARKER: &str = "<!-- mothball:warned -->";

/// Marker appended to closing comments.
pub const STALE_MARKER: &str = "<!-- mothball:closed-stale -->";

/// Appends a marker to a comment body on its own line.
#[must_use]
pub fn with_marker(body: &str, marker: &str) -> String {
    format!("{body}\n\n{marker}")
}

/// Returns the most recent comment carrying the warn marker.
#[must_use]
pub fn latest_warn(comments: &[Comment]) -> Option<&Comment> {
    comments
        .iter()
        .filter(|comment| comment.contains_marker(WARN_MARKER))
        .max_by_key(|comment| comment.created_at)
}

/// Returns true when any comment carries the stale (close) marker.
#[must_use]
pub fn has_stale_marker(comments: &[Comment]) -> bool {
    comments
        .iter()
        .any(|comment| comment.contains_marker(STALE_MARKER))
}
