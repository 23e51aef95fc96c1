//! Issue search queries and sequential page collection.
//!
//! The GitHub search API throttles far more aggressively than the REST
//! endpoints, so the runner walks pages one at a time and inserts deliberate
//! delays as the walk gets deeper: 10 seconds once two pages have been
//! fetched, 30 seconds once four have.

use std::time::Duration;

use super::error::TriageError;
use super::gateway::IssueGateway;
use super::locator::RepositoryLocator;
use super::models::Issue;

/// Hard cap on the number of search pages a single run will walk.
pub const MAX_SEARCH_PAGES: u32 = 40;

/// Results per search page requested from the API.
pub const SEARCH_PAGE_SIZE: u8 = 100;

/// Builder for the `q` parameter of an issue search.
///
/// Always scopes to a single repository and to open issues; milestone and
/// label exclusions are optional refinements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    repo_slug: String,
    milestone: Option<String>,
    excluded_labels: Vec<String>,
}

impl SearchQuery {
    /// Starts a query scoped to open issues in the given repository.
    #[must_use]
    pub fn open_issues_in(locator: &RepositoryLocator) -> Self {
        Self {
            repo_slug: locator.slug(),
            milestone: None,
            excluded_labels: Vec::new(),
        }
    }

    /// Restricts the query to a milestone.
    #[must_use]
    pub fn in_milestone(mut self, milestone: Option<&str>) -> Self {
        self.milestone = milestone.map(ToOwned::to_owned);
        self
    }

    /// Excludes issues carrying any of the given labels.
    #[must_use]
    pub fn without_labels(mut self, labels: &[String]) -> Self {
        self.excluded_labels = labels.to_vec();
        self
    }

    /// Renders the query string passed as the `q` search parameter.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![
            format!("repo:{}", self.repo_slug),
            "is:issue".to_owned(),
            "is:open".to_owned(),
        ];
        if let Some(milestone) = self.milestone.as_deref() {
            parts.push(format!("milestone:{}", quote_term(milestone)));
        }
        for label in &self.excluded_labels {
            parts.push(format!("-label:{}", quote_term(label)));
        }
        parts.join(" ")
    }
}

/// Quotes a search term when it contains whitespace.
fn quote_term(term: &str) -> String {
    if term.chars().any(char::is_whitespace) {
        format!("\"{term}\"")
    } else {
        term.to_owned()
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Issues on this page.
    pub issues: Vec<Issue>,
    /// Whether another page follows.
    pub has_next: bool,
}

/// Returns the delay to respect before fetching the next page, given how
/// many pages have been fetched so far.
const fn backoff_after(pages_fetched: u32) -> Duration {
    if pages_fetched >= 4 {
        Duration::from_secs(30)
    } else if pages_fetched >= 2 {
        Duration::from_secs(10)
    } else {
        Duration::ZERO
    }
}

/// Walks all pages of a search sequentially through a gateway.
pub struct SearchRunner<'client, Gateway>
where
    Gateway: IssueGateway,
{
    gateway: &'client Gateway,
}

impl<'client, Gateway> SearchRunner<'client, Gateway>
where
    Gateway: IssueGateway,
{
    /// Creates a runner over the given gateway.
    #[must_use]
    pub const fn new(gateway: &'client Gateway) -> Self {
        Self { gateway }
    }

    /// Collects every issue the query matches, awaiting pages sequentially.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures and returns [`TriageError::SearchPageCap`]
    /// when the walk exceeds [`MAX_SEARCH_PAGES`].
    pub async fn collect_all(&self, query: &SearchQuery) -> Result<Vec<Issue>, TriageError> {
        let mut issues = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            let page = self.gateway.search_page(query, page_number).await?;
            issues.extend(page.issues);

            if !page.has_next {
                break;
            }
            if page_number >= MAX_SEARCH_PAGES {
                return Err(TriageError::SearchPageCap {
                    max_pages: MAX_SEARCH_PAGES,
                });
            }

            let delay = backoff_after(page_number);
            if !delay.is_zero() {
                tracing::debug!(
                    pages_fetched = page_number,
                    delay_secs = delay.as_secs(),
                    "backing off before next search page"
                );
                tokio::time::sleep(delay).await;
            }
            page_number += 1;
        }

        Ok(issues)
    }
}
