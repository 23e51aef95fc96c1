//! Gateways for issue triage operations through Octocrab.
//!
//! The trait-based design enables mocking in tests while the Octocrab
//! implementation handles real HTTP requests. A readonly wrapper
//! short-circuits every mutating call so the bot can be dry-run safely
//! against a live repository.

use async_trait::async_trait;
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};

use super::error::TriageError;
use super::locator::{IssueNumber, PersonalAccessToken, RepositoryLocator};
use super::models::{ApiComment, ApiIssue, ApiLabel, ApiPermission, Comment, Issue, Permission};
use super::rate_limit::RateLimitInfo;
use super::search::{SEARCH_PAGE_SIZE, SearchPage, SearchQuery};

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `TriageError::InvalidUrl` when the base URI cannot be parsed or
/// `TriageError::Api` when Octocrab fails to construct a client.
fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, TriageError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| TriageError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| TriageError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}

/// Gateway covering the issue CRUD surface the triage bot needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// Fetch one page of issue search results.
    async fn search_page(&self, query: &SearchQuery, page: u32)
    -> Result<SearchPage, TriageError>;

    /// Fetch a single issue.
    async fn issue(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Issue, TriageError>;

    /// Fetch all comments on an issue.
    async fn comments(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Vec<Comment>, TriageError>;

    /// Close an issue.
    async fn close_issue(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<(), TriageError>;

    /// Post a comment on an issue.
    async fn create_comment(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        body: &str,
    ) -> Result<(), TriageError>;

    /// Delete a comment by id.
    async fn delete_comment(
        &self,
        locator: &RepositoryLocator,
        comment_id: u64,
    ) -> Result<(), TriageError>;

    /// Add a label to an issue.
    async fn add_label(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError>;

    /// Remove a label from an issue. Removing an absent label succeeds.
    async fn remove_label(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError>;

    /// Look up a collaborator's permission level.
    async fn collaborator_permission(
        &self,
        locator: &RepositoryLocator,
        login: &str,
    ) -> Result<Permission, TriageError>;
}

/// Octocrab-backed gateway.
pub struct OctocrabIssueGateway {
    client: Octocrab,
}

impl OctocrabIssueGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidUrl` when the base URI cannot be parsed or
    /// `TriageError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, TriageError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }

    async fn map_error_with_rate_limit(
        &self,
        operation: &str,
        error: &octocrab::Error,
    ) -> TriageError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.fetch_rate_limit_info().await;
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = match &rate_limit {
                    Some(info) => format!(
                        "{base_message} (resets at {reset})",
                        reset = info.reset_at()
                    ),
                    None => base_message,
                };

                TriageError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }

    async fn fetch_rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(limit) = u32::try_from(rate.limit) else {
            return None;
        };
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        Some(RateLimitInfo::new(limit, remaining, rate.reset))
    }
}

#[async_trait]
impl IssueGateway for OctocrabIssueGateway {
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<SearchPage, TriageError> {
        let q = query.to_query_string();
        let page_str = page.to_string();
        let per_page_str = SEARCH_PAGE_SIZE.to_string();
        let params = [
            ("q", q.as_str()),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
            ("sort", "created"),
            ("order", "asc"),
        ];

        let result: Page<ApiIssue> = match self.client.get("/search/issues", Some(&params)).await {
            Ok(result) => result,
            Err(error) => {
                return Err(self.map_error_with_rate_limit("search issues", &error).await);
            }
        };

        let has_next = result.next.is_some();
        let issues = result.items.into_iter().map(ApiIssue::into).collect();

        Ok(SearchPage { issues, has_next })
    }

    async fn issue(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Issue, TriageError> {
        self.client
            .get::<ApiIssue, _, _>(locator.issue_path(number), None::<&()>)
            .await
            .map(ApiIssue::into)
            .map_err(|error| map_octocrab_error("get issue", &error))
    }

    async fn comments(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Vec<Comment>, TriageError> {
        let page = self
            .client
            .get::<Page<ApiComment>, _, _>(locator.comments_path(number), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("list comments", &error))?;

        self.client
            .all_pages(page)
            .await
            .map(|comments| comments.into_iter().map(ApiComment::into).collect())
            .map_err(|error| map_octocrab_error("list comments", &error))
    }

    async fn close_issue(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<(), TriageError> {
        let body = serde_json::json!({ "state": "closed" });
        self.client
            .patch::<ApiIssue, _, _>(locator.issue_path(number), Some(&body))
            .await
            .map(|_| ())
            .map_err(|error| map_octocrab_error("close issue", &error))
    }

    async fn create_comment(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        body: &str,
    ) -> Result<(), TriageError> {
        let payload = serde_json::json!({ "body": body });
        self.client
            .post::<_, ApiComment>(locator.comments_path(number), Some(&payload))
            .await
            .map(|_| ())
            .map_err(|error| map_octocrab_error("create comment", &error))
    }

    async fn delete_comment(
        &self,
        locator: &RepositoryLocator,
        comment_id: u64,
    ) -> Result<(), TriageError> {
        let uri: Uri = locator
            .comment_path(comment_id)
            .parse::<Uri>()
            .map_err(|error| TriageError::InvalidUrl(error.to_string()))?;

        let response = self
            .client
            ._delete(uri, None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("delete comment", &error))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = self
                .client
                .body_to_string(response)
                .await
                .unwrap_or_else(|_| String::new());
            Err(map_http_error(
                "delete comment",
                status,
                extract_github_message(&body),
            ))
        }
    }

    async fn add_label(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError> {
        let payload = serde_json::json!({ "labels": [label] });
        self.client
            .post::<_, Vec<ApiLabel>>(locator.issue_labels_path(number), Some(&payload))
            .await
            .map(|_| ())
            .map_err(|error| map_octocrab_error("add label", &error))
    }

    async fn remove_label(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError> {
        let result = self
            .client
            .delete::<Vec<ApiLabel>, _, _>(locator.issue_label_path(number, label), None::<&()>)
            .await;

        match result {
            Ok(_) => Ok(()),
            // The label was already absent; removal is idempotent.
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                tracing::warn!(
                    issue = number.get(),
                    label,
                    "label not present; nothing to remove"
                );
                Ok(())
            }
            Err(error) => Err(map_octocrab_error("remove label", &error)),
        }
    }

    async fn collaborator_permission(
        &self,
        locator: &RepositoryLocator,
        login: &str,
    ) -> Result<Permission, TriageError> {
        self.client
            .get::<ApiPermission, _, _>(locator.permission_path(login), None::<&()>)
            .await
            .map(ApiPermission::into)
            .map_err(|error| map_octocrab_error("get permission", &error))
    }
}

/// Wrapper that delegates reads and short-circuits every mutating call.
///
/// Used when the bot runs with `readonly = true`: the triage policy still
/// classifies every issue, but nothing is posted, closed, or labelled.
pub struct ReadonlyGateway<Gateway>
where
    Gateway: IssueGateway,
{
    inner: Gateway,
}

impl<Gateway> ReadonlyGateway<Gateway>
where
    Gateway: IssueGateway,
{
    /// Wraps a gateway in readonly mode.
    #[must_use]
    pub const fn new(inner: Gateway) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<Gateway> IssueGateway for ReadonlyGateway<Gateway>
where
    Gateway: IssueGateway,
{
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<SearchPage, TriageError> {
        self.inner.search_page(query, page).await
    }

    async fn issue(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Issue, TriageError> {
        self.inner.issue(locator, number).await
    }

    async fn comments(
        &self,
        locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<Vec<Comment>, TriageError> {
        self.inner.comments(locator, number).await
    }

    async fn close_issue(
        &self,
        _locator: &RepositoryLocator,
        number: IssueNumber,
    ) -> Result<(), TriageError> {
        tracing::info!(issue = number.get(), "readonly: skipping close");
        Ok(())
    }

    async fn create_comment(
        &self,
        _locator: &RepositoryLocator,
        number: IssueNumber,
        _body: &str,
    ) -> Result<(), TriageError> {
        tracing::info!(issue = number.get(), "readonly: skipping comment");
        Ok(())
    }

    async fn delete_comment(
        &self,
        _locator: &RepositoryLocator,
        comment_id: u64,
    ) -> Result<(), TriageError> {
        tracing::info!(comment_id, "readonly: skipping comment deletion");
        Ok(())
    }

    async fn add_label(
        &self,
        _locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError> {
        tracing::info!(issue = number.get(), label, "readonly: skipping label add");
        Ok(())
    }

    async fn remove_label(
        &self,
        _locator: &RepositoryLocator,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), TriageError> {
        tracing::info!(
            issue = number.get(),
            label,
            "readonly: skipping label removal"
        );
        Ok(())
    }

    async fn collaborator_permission(
        &self,
        locator: &RepositoryLocator,
        login: &str,
    ) -> Result<Permission, TriageError> {
        self.inner.collaborator_permission(locator, login).await
    }
}

// --- Error mapping helpers ---

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit rejection based on
/// the HTTP status and message / documentation URL content.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> TriageError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return if is_auth_failure(source.status_code) && !is_rate_limit_error(source) {
            TriageError::Authentication {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        } else {
            TriageError::Api {
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return TriageError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    TriageError::Api {
        message: format!("{operation} failed: {error}"),
    }
}

fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

fn map_http_error(
    operation: &str,
    status: StatusCode,
    maybe_message: Option<String>,
) -> TriageError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());
    if is_auth_failure(status) {
        TriageError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        }
    } else {
        TriageError::Api {
            message: format!("{operation} failed with status {status}: {message}"),
        }
    }
}
