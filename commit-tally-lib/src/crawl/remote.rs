//! The remote API consumed by the crawl.

use super::page::{CommitNode, Page};
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use core::time::Duration;

/// How a failed remote call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The whole crawl must stop.
    Fatal,

    /// The same call can be issued again.
    Retryable,

    /// The reply was well-formed but lacked expected data; only the affected unit of work is dropped.
    Malformed,
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The query budget is spent.
    QuotaExhausted {
        message: String,
        reset_at: Option<DateTime<Utc>>,
    },

    /// The credential was rejected.
    Unauthorized { message: String },

    /// Network fault, server-side fault, timeout, or an explicit request to slow down.
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The reply did not contain what the query asked for.
    Malformed { message: String },
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::QuotaExhausted { .. } | Self::Unauthorized { .. } => FailureClass::Fatal,
            Self::Transient { .. } => FailureClass::Retryable,
            Self::Malformed { .. } => FailureClass::Malformed,
        }
    }

    /// Delay requested by the remote before trying again.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::QuotaExhausted { message, reset_at: Some(reset_at) } => {
                write!(f, "rate limit exhausted ({message}), resets at {}", reset_at.format("%Y-%m-%d %H:%M:%S UTC"))
            }
            Self::QuotaExhausted { message, reset_at: None } => write!(f, "rate limit exhausted ({message})"),
            Self::Unauthorized { message } => write!(f, "credential rejected ({message})"),
            Self::Transient { message, .. } => write!(f, "transient failure: {message}"),
            Self::Malformed { message } => write!(f, "unexpected response: {message}"),
        }
    }
}

impl core::error::Error for RemoteError {}

/// A paginated, read-only view of an organization's repositories, branches and commit histories.
///
/// Implementors encapsulate transport and authentication. Every method issues exactly one remote
/// call; the crawl takes care of concurrency limits, retries and pagination.
///
/// Commit histories must be returned newest first, following parent links, as the crawl stops
/// walking a branch once it reaches a commit it has already seen.
pub trait Remote: Send + Sync + 'static {
    /// List the names of the organization's repositories.
    fn list_repositories(
        &self,
        org: &str,
        cursor: Option<&str>,
        first: u32,
    ) -> impl Future<Output = Result<Page<String>, RemoteError>> + Send;

    /// List the names of a repository's branches.
    fn list_branches(
        &self,
        owner: &str,
        repo: &str,
        cursor: Option<&str>,
        first: u32,
    ) -> impl Future<Output = Result<Page<String>, RemoteError>> + Send;

    /// List the commit history reachable from `branch_ref` (a qualified ref such as `refs/heads/main`).
    fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch_ref: &str,
        cursor: Option<&str>,
        first: u32,
    ) -> impl Future<Output = Result<Page<CommitNode>, RemoteError>> + Send;

    /// Name of the repository's default branch, or `None` for an empty repository.
    fn default_branch(&self, owner: &str, repo: &str) -> impl Future<Output = Result<Option<String>, RemoteError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let quota = RemoteError::QuotaExhausted {
            message: "API rate limit exceeded".to_string(),
            reset_at: None,
        };
        assert_eq!(quota.class(), FailureClass::Fatal);
        assert_eq!(
            RemoteError::Unauthorized { message: "Bad credentials".to_string() }.class(),
            FailureClass::Fatal
        );
        assert_eq!(RemoteError::transient("connection reset").class(), FailureClass::Retryable);
        assert_eq!(RemoteError::malformed("missing ref").class(), FailureClass::Malformed);
    }

    #[test]
    fn test_retry_after_only_for_transient() {
        let err = RemoteError::Transient {
            message: "secondary rate limit".to_string(),
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(RemoteError::malformed("x").retry_after(), None);
    }

    #[test]
    fn test_display_includes_reset_time() {
        let err = RemoteError::QuotaExhausted {
            message: "API rate limit exceeded".to_string(),
            reset_at: DateTime::from_timestamp(1_704_067_200, 0),
        };
        let text = err.to_string();
        assert!(text.contains("API rate limit exceeded"));
        assert!(text.contains("2024-01-01 00:00:00 UTC"));
    }
}
