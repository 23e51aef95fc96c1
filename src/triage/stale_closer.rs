//! Stale-issue classification and action application.
//!
//! Classification is a pure function over an issue, its comments, and the
//! clock; the [`StaleCloser`] runner applies the resulting decisions through
//! a gateway. Keeping the two apart means the whole policy is testable
//! without HTTP.

use chrono::{DateTime, Duration, Utc};

use super::markers::{STALE_MARKER, WARN_MARKER, has_stale_marker, latest_warn, with_marker};
use crate::github::error::TriageError;
use crate::github::gateway::IssueGateway;
use crate::github::locator::{IssueNumber, RepositoryLocator};
use crate::github::models::{Comment, Issue, IssueState};
use crate::github::search::{SearchQuery, SearchRunner};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Thresholds and overrides controlling the stale closer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCloserPolicy {
    /// Days from creation until an unattended issue is closed.
    pub close_days: u32,
    /// Days of grace between the warning comment and the close.
    pub warn_days: u32,
    /// Issues with at least this many thumbs-up reactions are never acted on.
    pub upvotes_required: Option<u32>,
    /// Issues with at least this many comments are never acted on.
    pub num_comments_override: Option<u32>,
    /// Only issues in this milestone are considered.
    pub candidate_milestone: Option<String>,
    /// Issues carrying any of these labels are skipped.
    pub labels_to_exclude: Vec<String>,
}

impl StaleCloserPolicy {
    /// Validates the threshold relationship.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] when either threshold is zero
    /// or the warn window is not shorter than the close window.
    pub fn validate(&self) -> Result<(), TriageError> {
        if self.close_days == 0 || self.warn_days == 0 {
            return Err(TriageError::Configuration {
                message: "close_days and warn_days must both be positive".to_owned(),
            });
        }
        if self.warn_days >= self.close_days {
            return Err(TriageError::Configuration {
                message: format!(
                    "warn_days ({}) must be smaller than close_days ({})",
                    self.warn_days, self.close_days
                ),
            });
        }
        Ok(())
    }

    /// Age at which an unwarned issue receives its warning.
    fn warn_threshold(&self) -> Duration {
        Duration::days(i64::from(self.close_days.saturating_sub(self.warn_days)))
    }

    /// Time after the warning at which the issue is closed.
    fn close_threshold(&self) -> Duration {
        Duration::days(i64::from(self.warn_days))
    }
}

/// Why an issue was excluded from triage this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The issue is already closed.
    AlreadyClosed,
    /// The conversation is locked.
    Locked,
    /// The issue carries an excluded label.
    ExcludedLabel(String),
    /// The issue is not in the candidate milestone.
    OutsideMilestone,
    /// The issue has enough upvotes to stay open.
    UpvoteOverride,
    /// The issue has enough discussion to stay open.
    CommentOverride,
    /// A stale-close marker is already present.
    StaleMarkerPresent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyClosed => write!(f, "already closed"),
            Self::Locked => write!(f, "locked"),
            Self::ExcludedLabel(label) => write!(f, "excluded label `{label}`"),
            Self::OutsideMilestone => write!(f, "outside candidate milestone"),
            Self::UpvoteOverride => write!(f, "upvote override"),
            Self::CommentOverride => write!(f, "comment override"),
            Self::StaleMarkerPresent => write!(f, "stale marker present"),
        }
    }
}

/// Outcome of classifying a single issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageDecision {
    /// The issue is excluded by policy.
    Skip(SkipReason),
    /// Post the warning comment.
    Warn,
    /// Post the close comment, close, and label.
    Close,
    /// Not old enough yet; check again on a later run.
    Wait,
}

/// Classifies one issue against the policy.
///
/// Overrides are re-evaluated on every run, so an issue that stays above an
/// upvote or comment threshold stays immune for as long as it does.
#[must_use]
pub fn classify(
    issue: &Issue,
    comments: &[Comment],
    now: DateTime<Utc>,
    policy: &StaleCloserPolicy,
) -> TriageDecision {
    if issue.state == IssueState::Closed {
        return TriageDecision::Skip(SkipReason::AlreadyClosed);
    }
    if issue.locked {
        return TriageDecision::Skip(SkipReason::Locked);
    }
    if let Some(label) = policy
        .labels_to_exclude
        .iter()
        .find(|label| issue.has_label(label))
    {
        return TriageDecision::Skip(SkipReason::ExcludedLabel(label.clone()));
    }
    if let Some(milestone) = policy.candidate_milestone.as_deref()
        && issue.milestone.as_deref() != Some(milestone)
    {
        return TriageDecision::Skip(SkipReason::OutsideMilestone);
    }
    if let Some(required) = policy.upvotes_required
        && issue.upvotes >= required
    {
        return TriageDecision::Skip(SkipReason::UpvoteOverride);
    }
    if let Some(threshold) = policy.num_comments_override
        && issue.comment_count >= threshold
    {
        return TriageDecision::Skip(SkipReason::CommentOverride);
    }
    if has_stale_marker(comments) {
        return TriageDecision::Skip(SkipReason::StaleMarkerPresent);
    }

    match latest_warn(comments) {
        None => {
            if now - issue.created_at >= policy.warn_threshold() {
                TriageDecision::Warn
            } else {
                TriageDecision::Wait
            }
        }
        Some(warn) => {
            if now - warn.created_at >= policy.close_threshold() {
                TriageDecision::Close
            } else {
                TriageDecision::Wait
            }
        }
    }
}

/// Counts from a completed triage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageSummary {
    /// Issues that received a warning comment.
    pub warned: u64,
    /// Issues closed as stale.
    pub closed: u64,
    /// Issues skipped by policy.
    pub skipped: u64,
    /// Issues left untouched until more time passes.
    pub waiting: u64,
}

const DEFAULT_WARN_COMMENT: &str =
    "This issue has been inactive and will be closed soon unless there is further activity.";
const DEFAULT_CLOSE_COMMENT: &str = "Closing this issue as stale after an extended warning period.";

/// Drives a triage run: search, classify, and apply decisions.
pub struct StaleCloser<'client, Gateway>
where
    Gateway: IssueGateway,
{
    gateway: &'client Gateway,
    sink: &'client dyn TelemetrySink,
    locator: RepositoryLocator,
    policy: StaleCloserPolicy,
    warn_comment: String,
    close_comment: String,
    stale_label: Option<String>,
    actor: Option<String>,
}

impl<'client, Gateway> StaleCloser<'client, Gateway>
where
    Gateway: IssueGateway,
{
    /// Creates a closer over the given gateway and telemetry sink.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] when the policy fails
    /// validation.
    pub fn new(
        gateway: &'client Gateway,
        sink: &'client dyn TelemetrySink,
        locator: RepositoryLocator,
        policy: StaleCloserPolicy,
    ) -> Result<Self, TriageError> {
        policy.validate()?;
        Ok(Self {
            gateway,
            sink,
            locator,
            policy,
            warn_comment: DEFAULT_WARN_COMMENT.to_owned(),
            close_comment: DEFAULT_CLOSE_COMMENT.to_owned(),
            stale_label: None,
            actor: None,
        })
    }

    /// Overrides the warning comment body.
    #[must_use]
    pub fn with_warn_comment(mut self, body: Option<&str>) -> Self {
        if let Some(body) = body {
            self.warn_comment = body.to_owned();
        }
        self
    }

    /// Overrides the close comment body.
    #[must_use]
    pub fn with_close_comment(mut self, body: Option<&str>) -> Self {
        if let Some(body) = body {
            self.close_comment = body.to_owned();
        }
        self
    }

    /// Sets the label applied when closing.
    #[must_use]
    pub fn with_stale_label(mut self, label: Option<&str>) -> Self {
        self.stale_label = label.map(ToOwned::to_owned);
        self
    }

    /// Sets the actor whose write permission is verified before the run.
    #[must_use]
    pub fn with_actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(ToOwned::to_owned);
        self
    }

    /// Runs the closer over every candidate issue.
    ///
    /// # Errors
    ///
    /// Fails fast on any GitHub error; a partial run is safe to repeat
    /// because every action is marker-guarded.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<TriageSummary, TriageError> {
        self.verify_actor_permission().await?;

        let query = SearchQuery::open_issues_in(&self.locator)
            .in_milestone(self.policy.candidate_milestone.as_deref())
            .without_labels(&self.policy.labels_to_exclude);
        let issues = SearchRunner::new(self.gateway).collect_all(&query).await?;
        tracing::info!(candidates = issues.len(), "collected candidate issues");

        let mut summary = TriageSummary::default();
        for issue in &issues {
            self.triage_issue(issue, now, &mut summary).await?;
        }

        self.sink.record(TelemetryEvent::RunCompleted {
            warned: summary.warned,
            closed: summary.closed,
            skipped: summary.skipped,
            waiting: summary.waiting,
        });
        Ok(summary)
    }

    async fn verify_actor_permission(&self) -> Result<(), TriageError> {
        let Some(actor) = self.actor.as_deref() else {
            return Ok(());
        };
        let permission = self
            .gateway
            .collaborator_permission(&self.locator, actor)
            .await?;
        if permission.can_write() {
            Ok(())
        } else {
            Err(TriageError::InsufficientPermission {
                actor: actor.to_owned(),
                permission: permission.as_str().to_owned(),
            })
        }
    }

    async fn triage_issue(
        &self,
        issue: &Issue,
        now: DateTime<Utc>,
        summary: &mut TriageSummary,
    ) -> Result<(), TriageError> {
        let number = IssueNumber::new(issue.number)?;
        let comments = self.gateway.comments(&self.locator, number).await?;

        match classify(issue, &comments, now, &self.policy) {
            TriageDecision::Warn => {
                let body = with_marker(&self.warn_comment, WARN_MARKER);
                self.gateway
                    .create_comment(&self.locator, number, &body)
                    .await?;
                tracing::info!(issue = issue.number, "posted stale warning");
                self.sink.record(TelemetryEvent::IssueWarned {
                    number: issue.number,
                });
                summary.warned += 1;
            }
            TriageDecision::Close => {
                let body = with_marker(&self.close_comment, STALE_MARKER);
                self.gateway
                    .create_comment(&self.locator, number, &body)
                    .await?;
                self.gateway.close_issue(&self.locator, number).await?;
                if let Some(label) = self.stale_label.as_deref() {
                    self.gateway.add_label(&self.locator, number, label).await?;
                }
                tracing::info!(issue = issue.number, "closed stale issue");
                self.sink.record(TelemetryEvent::IssueClosed {
                    number: issue.number,
                });
                summary.closed += 1;
            }
            TriageDecision::Skip(reason) => {
                tracing::debug!(issue = issue.number, %reason, "skipping issue");
                self.sink.record(TelemetryEvent::IssueSkipped {
                    number: issue.number,
                    reason: reason.to_string(),
                });
                summary.skipped += 1;
            }
            TriageDecision::Wait => {
                tracing::debug!(issue = issue.number, "issue not due yet");
                summary.waiting += 1;
            }
        }
        Ok(())
    }
}
