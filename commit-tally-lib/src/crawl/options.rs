use super::page::QueryKind;
use super::retry::RetryPolicy;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Page sizes per query kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub repositories: u32,
    pub branches: u32,
    pub commits: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            repositories: 50,
            branches: 100,
            commits: 100,
        }
    }
}

impl PageSizes {
    #[must_use]
    pub const fn for_kind(&self, kind: QueryKind) -> u32 {
        match kind {
            QueryKind::Repositories => self.repositories,
            QueryKind::Branches => self.branches,
            QueryKind::Commits => self.commits,
            QueryKind::DefaultBranch => 1,
        }
    }
}

/// Which branches of each repository are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchScope {
    /// Every branch.
    #[default]
    All,

    /// Only the default branch.
    Default,
}

/// Settings for one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of remote calls in flight at once.
    pub max_concurrent_requests: usize,
    pub page_sizes: PageSizes,
    pub retry: RetryPolicy,
    /// Upper bound on a single remote call.
    pub request_timeout: Duration,
    /// Stop walking a branch at the first commit already seen in its repository.
    ///
    /// Relies on histories being listed newest first. When disabled, every page of every branch is
    /// fetched and already seen commits are merely skipped.
    pub stop_at_seen_commit: bool,
    /// Leave commits whose message starts with `Merge pull request #` out of the counts.
    pub skip_merge_pull_requests: bool,
    pub branch_scope: BranchScope,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 8,
            page_sizes: PageSizes::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(60),
            stop_at_seen_commit: true,
            skip_merge_pull_requests: true,
            branch_scope: BranchScope::All,
        }
    }
}
