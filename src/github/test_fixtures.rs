//! Shared issue and comment builders for unit tests.

use chrono::{DateTime, Duration, Utc};

use super::models::{Comment, Issue, IssueState};

/// Fixed "now" used across tests so elapsed-day arithmetic is deterministic.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
        .expect("fixture timestamp should parse")
        .with_timezone(&Utc)
}

/// Builds an open, unlabelled issue created `age_days` before [`fixed_now`].
#[must_use]
pub fn open_issue(number: u64, age_days: i64) -> Issue {
    Issue {
        number,
        title: Some(format!("Issue {number}")),
        state: IssueState::Open,
        locked: false,
        labels: Vec::new(),
        milestone: None,
        author: Some("reporter".to_owned()),
        created_at: fixed_now() - Duration::days(age_days),
        updated_at: None,
        upvotes: 0,
        comment_count: 0,
    }
}

/// Builds a comment posted `age_days` before [`fixed_now`].
#[must_use]
pub fn comment(id: u64, body: &str, age_days: i64) -> Comment {
    Comment {
        id,
        body: Some(body.to_owned()),
        author: Some("commenter".to_owned()),
        created_at: fixed_now() - Duration::days(age_days),
    }
}
