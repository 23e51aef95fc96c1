//! Data models for issues, comments, and collaborator permissions.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Whether an issue is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    /// The issue is open.
    Open,
    /// The issue is closed.
    Closed,
}

impl IssueState {
    fn from_api(value: &str) -> Self {
        if value.eq_ignore_ascii_case("open") {
            Self::Open
        } else {
            Self::Closed
        }
    }
}

/// Issue fields the triage policy inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number.
    pub number: u64,
    /// Title of the issue.
    pub title: Option<String>,
    /// Open or closed.
    pub state: IssueState,
    /// Whether the conversation is locked.
    pub locked: bool,
    /// Label names attached to the issue.
    pub labels: Vec<String>,
    /// Milestone title when assigned.
    pub milestone: Option<String>,
    /// Author login if present.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp when reported.
    pub updated_at: Option<DateTime<Utc>>,
    /// Count of thumbs-up reactions.
    pub upvotes: u32,
    /// Count of comments as reported by the API.
    pub comment_count: u32,
}

impl Issue {
    /// Returns true when the issue carries the given label.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|name| name == label)
    }
}

/// Issue comment details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: Option<String>,
    /// Author login.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Returns true when the body contains the given marker string.
    #[must_use]
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.body.as_deref().is_some_and(|body| body.contains(marker))
    }
}

/// Collaborator permission level, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    /// No access.
    None,
    /// Read-only access.
    Read,
    /// Write (push) access.
    Write,
    /// Administrative access.
    Admin,
}

impl Permission {
    /// Parses the permission string GitHub returns.
    ///
    /// Unknown values map to [`Permission::None`].
    #[must_use]
    pub fn from_api(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            "write" | "maintain" => Self::Write,
            "read" | "triage" => Self::Read,
            _ => Self::None,
        }
    }

    /// Returns true when the level allows mutating the repository.
    #[must_use]
    pub fn can_write(self) -> bool {
        self >= Self::Write
    }

    /// Returns the API-style string for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Write => "write",
            Self::Read => "read",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssue {
    pub(super) number: u64,
    pub(super) title: Option<String>,
    pub(super) state: Option<String>,
    #[serde(default)]
    pub(super) locked: bool,
    #[serde(default)]
    pub(super) labels: Vec<ApiLabel>,
    pub(super) milestone: Option<ApiMilestone>,
    pub(super) user: Option<ApiUser>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: Option<DateTime<Utc>>,
    pub(super) reactions: Option<ApiReactions>,
    #[serde(default)]
    pub(super) comments: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiLabel {
    pub(super) name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiMilestone {
    pub(super) title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReactions {
    #[serde(rename = "+1", default)]
    pub(super) plus_one: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiComment {
    pub(super) id: u64,
    pub(super) body: Option<String>,
    pub(super) user: Option<ApiUser>,
    pub(super) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPermission {
    pub(super) permission: Option<String>,
}

impl From<ApiIssue> for Issue {
    fn from(value: ApiIssue) -> Self {
        Self {
            number: value.number,
            title: value.title,
            state: value
                .state
                .as_deref()
                .map_or(IssueState::Open, IssueState::from_api),
            locked: value.locked,
            labels: value
                .labels
                .into_iter()
                .filter_map(|label| label.name)
                .collect(),
            milestone: value.milestone.and_then(|milestone| milestone.title),
            author: value.user.and_then(|user| user.login),
            created_at: value.created_at,
            updated_at: value.updated_at,
            upvotes: value.reactions.map_or(0, |reactions| reactions.plus_one),
            comment_count: value.comments,
        }
    }
}

impl From<ApiComment> for Comment {
    fn from(value: ApiComment) -> Self {
        Self {
            id: value.id,
            body: value.body,
            author: value.user.and_then(|user| user.login),
            created_at: value.created_at,
        }
    }
}

impl From<ApiPermission> for Permission {
    fn from(value: ApiPermission) -> Self {
        value
            .permission
            .as_deref()
            .map_or(Self::None, Self::from_api)
    }
}
