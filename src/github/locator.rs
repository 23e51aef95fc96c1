//! Repository identity wrappers and API path builders.

use url::Url;

use super::error::TriageError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, TriageError> {
        if value.is_empty() {
            return Err(TriageError::MissingRepository);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, TriageError> {
        if value.is_empty() {
            return Err(TriageError::MissingRepository);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Issue number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Validates that the issue number is positive.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidIssueNumber` when the value is zero.
    pub const fn new(value: u64) -> Result<Self, TriageError> {
        if value == 0 {
            return Err(TriageError::InvalidIssueNumber);
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, TriageError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TriageError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Derives the GitHub API base URL from a host string.
///
/// `github.com` maps to the public API; any other host is treated as GitHub
/// Enterprise and gets an `/api/v3` base on the same authority.
fn derive_api_base_from_host(
    scheme: &str,
    host: &str,
    port: Option<u16>,
) -> Result<Url, TriageError> {
    if host.eq_ignore_ascii_case("github.com") {
        Url::parse("https://api.github.com")
            .map_err(|error| TriageError::InvalidUrl(error.to_string()))
    } else {
        let authority = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let mut api_url = Url::parse(&format!("{scheme}://{authority}"))
            .map_err(|error| TriageError::InvalidUrl(error.to_string()))?;

        api_url
            .set_port(port)
            .map_err(|()| TriageError::InvalidUrl("invalid port".to_owned()))?;
        api_url.set_path("api/v3");
        Ok(api_url)
    }
}

/// Repository coordinates plus the derived API base.
///
/// All issue-level paths the triage bot needs hang off this type so the
/// gateway never assembles URLs ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator from owner and repository name strings.
    ///
    /// Uses `github.com` as the default host.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::MissingRepository` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, TriageError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let api_base = Url::parse("https://api.github.com")
            .map_err(|error| TriageError::InvalidUrl(error.to_string()))?;

        Ok(Self {
            api_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Parses a GitHub repository URL in the form
    /// `https://github.com/<owner>/<repo>`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidUrl` when parsing fails or
    /// `MissingRepository` when the URL path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, TriageError> {
        let parsed =
            Url::parse(input).map_err(|error| TriageError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(TriageError::MissingRepository)?;

        let owner_segment = segments.next().ok_or(TriageError::MissingRepository)?;
        let repository_segment = segments.next().ok_or(TriageError::MissingRepository)?;

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;

        let host = parsed
            .host_str()
            .ok_or_else(|| TriageError::InvalidUrl("URL must include a host".to_owned()))?;
        let api_base = derive_api_base_from_host(parsed.scheme(), host, parsed.port())?;

        Ok(Self {
            api_base,
            owner,
            repository,
        })
    }

    /// API base URL derived from the repository host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the `owner/repo` slug used in search queries.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    pub(crate) fn issue_path(&self, number: IssueNumber) -> String {
        format!(
            "/repos/{}/{}/issues/{}",
            self.owner.as_str(),
            self.repository.as_str(),
            number.get()
        )
    }

    pub(crate) fn comments_path(&self, number: IssueNumber) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.owner.as_str(),
            self.repository.as_str(),
            number.get()
        )
    }

    pub(crate) fn comment_path(&self, comment_id: u64) -> String {
        format!(
            "/repos/{}/{}/issues/comments/{comment_id}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn issue_labels_path(&self, number: IssueNumber) -> String {
        format!(
            "/repos/{}/{}/issues/{}/labels",
            self.owner.as_str(),
            self.repository.as_str(),
            number.get()
        )
    }

    pub(crate) fn issue_label_path(&self, number: IssueNumber, label: &str) -> String {
        format!(
            "/repos/{}/{}/issues/{}/labels/{label}",
            self.owner.as_str(),
            self.repository.as_str(),
            number.get()
        )
    }

    pub(crate) fn permission_path(&self, login: &str) -> String {
        format!(
            "/repos/{}/{}/collaborators/{login}/permission",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}
