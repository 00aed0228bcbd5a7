//! Concurrent paginated traversal of an organization's commit history
//!
//! This module walks a four-level, cursor-paginated hierarchy (organization, repositories,
//! branches, commits) and folds every commit into a single per-author tally.
//!
//! # Implementation Model
//!
//! The [`Crawler`] drives the traversal. It spawns one task per repository and, within each, one
//! task per branch:
//! - **Fetching**: every page goes through a [`PageFetcher`], which waits for a [`Throttler`]
//!   slot, retries transient failures per the [`RetryPolicy`], and classifies the rest
//! - **Deduplication**: each repository owns a [`DedupSet`] shared by its branch tasks, so a
//!   commit reachable from several branches is counted once
//! - **Aggregation**: counted commits are recorded into a shared [`Tally`]
//!
//! A fatal error from the [`Remote`] cancels all outstanding work and the crawl resolves to a
//! [`CrawlError`]. Malformed pages and exhausted retries only drop the affected branch or
//! repository, which is listed in the [`CrawlReport`] as [`SkippedWork`].

mod crawler;
mod dedup;
mod fetcher;
mod options;
mod page;
mod remote;
mod report;
mod retry;
mod stats;
mod tally;
mod throttler;

pub use crawler::Crawler;
pub use dedup::DedupSet;
pub use fetcher::{FetchError, PageFetcher};
pub use options::{BranchScope, CrawlOptions, PageSizes};
pub use page::{CommitNode, CommitRecord, MERGE_PULL_REQUEST_PREFIX, Page, QueryKind, branch_ref};
pub use remote::{FailureClass, Remote, RemoteError};
pub use report::{CrawlError, CrawlReport, SkippedWork};
pub use retry::RetryPolicy;
pub use stats::{CrawlStats, StatsSnapshot};
pub use tally::{AuthorStats, Tally};
pub use throttler::Throttler;
