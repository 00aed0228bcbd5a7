use super::page::QueryKind;
use super::remote::RemoteError;
use super::stats::StatsSnapshot;
use super::tally::{AuthorStats, Tally};
use core::fmt::{Display, Formatter};
use serde::Serialize;

/// A unit of work that was abandoned without stopping the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWork {
    pub repository: String,

    /// The branch that was abandoned, or `None` when the whole repository was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    pub reason: String,
}

impl Display for SkippedWork {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}@{branch}: {}", self.repository, self.reason),
            None => write!(f, "{}: {}", self.repository, self.reason),
        }
    }
}

/// The outcome of a completed crawl.
#[derive(Debug)]
pub struct CrawlReport {
    pub org: String,
    pub tally: Tally,
    pub stats: StatsSnapshot,
    pub skipped: Vec<SkippedWork>,
}

impl CrawlReport {
    /// The `n` most prolific authors.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<AuthorStats> {
        self.tally.top(n)
    }

    /// Every author seen, in first-seen order.
    #[must_use]
    pub fn authors(&self) -> Vec<AuthorStats> {
        self.tally.authors()
    }
}

/// Why a crawl produced no report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    /// The remote refused to continue serving the crawl.
    Fatal {
        query: QueryKind,
        target: String,
        source: RemoteError,
    },

    /// The organization's repositories could not be listed.
    ListingFailed { org: String, reason: String },

    /// A crawl task panicked.
    TaskPanicked(String),
}

impl Display for CrawlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fatal { query, target, source } => {
                write!(f, "crawl aborted while fetching {query} for '{target}': {source}")
            }
            Self::ListingFailed { org, reason } => write!(f, "could not list the repositories of '{org}': {reason}"),
            Self::TaskPanicked(what) => write!(f, "crawl task panicked: {what}"),
        }
    }
}

impl core::error::Error for CrawlError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Fatal { source, .. } => Some(source),
            _ => None,
        }
    }
}
