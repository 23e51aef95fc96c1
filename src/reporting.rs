//! Error reporting wrapper for command entry points.
//!
//! [`with_error_reporting`] runs a fallible future, records failures to the
//! telemetry sink and the log, and decides whether the caller sees the
//! error. User cancellations are benign and never reported.

use std::future::Future;

use crate::github::TriageError;
use crate::telemetry::{TelemetryEvent, TelemetrySink};
use crate::tree::TreeError;
use crate::wizard::WizardError;

/// Longest error message recorded to telemetry, in characters.
pub const MESSAGE_MAX_CHARS: usize = 256;

/// Classifies errors for reporting purposes.
pub trait ErrorClass: std::error::Error {
    /// Whether the error is a deliberate user cancellation.
    fn is_user_cancelled(&self) -> bool {
        false
    }

    /// Stable kind identifier, safe for aggregation.
    fn kind(&self) -> &'static str;
}

impl ErrorClass for WizardError {
    fn is_user_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled | Self::GoBack)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::GoBack => "go_back",
            Self::UserCancelled => "user_cancelled",
            Self::Validation { .. } => "validation",
            Self::Value { .. } => "value",
            Self::Step { .. } => "step",
        }
    }
}

impl ErrorClass for TreeError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "tree_load",
            Self::NotDeletable { .. } => "tree_not_deletable",
            Self::Delete { .. } => "tree_delete",
        }
    }
}

impl ErrorClass for TriageError {
    fn kind(&self) -> &'static str {
        match self {
            Self::MissingRepository => "missing_repository",
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidIssueNumber => "invalid_issue_number",
            Self::MissingToken => "missing_token",
            Self::Authentication { .. } => "authentication",
            Self::Api { .. } => "api",
            Self::Network { .. } => "network",
            Self::Io { .. } => "io",
            Self::Configuration { .. } => "configuration",
            Self::RateLimitExceeded { .. } => "rate_limit",
            Self::InsufficientPermission { .. } => "insufficient_permission",
            Self::SearchPageCap { .. } => "search_page_cap",
        }
    }
}

/// How [`with_error_reporting`] disposes of a reported error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorHandling {
    /// Return the error to the caller after reporting it.
    pub rethrow: bool,
}

impl ErrorHandling {
    /// Report and swallow (the default).
    #[must_use]
    pub const fn swallow() -> Self {
        Self { rethrow: false }
    }

    /// Report and propagate.
    #[must_use]
    pub const fn rethrow() -> Self {
        Self { rethrow: true }
    }
}

/// Truncates `message` to [`MESSAGE_MAX_CHARS`] characters.
#[must_use]
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MESSAGE_MAX_CHARS {
        return message.to_owned();
    }
    message.chars().take(MESSAGE_MAX_CHARS).collect()
}

/// Runs `future`, reporting any failure under `context`.
///
/// User cancellations resolve to `Ok(None)` without touching telemetry.
/// Other failures are logged, recorded to `sink` with a truncated message,
/// and then either swallowed (`Ok(None)`) or rethrown per `handling`.
///
/// # Errors
///
/// Returns the original error only when `handling.rethrow` is set.
pub async fn with_error_reporting<T, E, F>(
    context: &str,
    sink: &dyn TelemetrySink,
    handling: ErrorHandling,
    future: F,
) -> Result<Option<T>, E>
where
    E: ErrorClass,
    F: Future<Output = Result<T, E>>,
{
    match future.await {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_user_cancelled() => {
            tracing::debug!(context, "cancelled by user");
            Ok(None)
        }
        Err(error) => {
            let message = truncate_message(&error.to_string());
            tracing::error!(context, kind = error.kind(), %message, "command failed");
            sink.record(TelemetryEvent::ErrorCaptured {
                context: context.to_owned(),
                error_kind: error.kind().to_owned(),
                message,
            });
            if handling.rethrow {
                Err(error)
            } else {
                Ok(None)
            }
        }
    }
}
