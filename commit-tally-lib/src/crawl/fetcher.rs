use super::options::PageSizes;
use super::page::{CommitRecord, Page, QueryKind};
use super::remote::{FailureClass, Remote, RemoteError};
use super::retry::RetryPolicy;
use super::stats::CrawlStats;
use super::throttler::Throttler;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "     fetch";

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The remote refused to serve the crawl any further.
    Fatal(RemoteError),

    /// The reply lacked the data the query asked for.
    Malformed(RemoteError),

    /// Every allowed attempt failed with a retryable error.
    RetriesExhausted { attempts: u32, last: RemoteError },

    /// The crawl was cancelled before the page was fetched.
    Cancelled,
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fatal(e) | Self::Malformed(e) => write!(f, "{e}"),
            Self::RetriesExhausted { attempts, last } => write!(f, "gave up after {attempts} attempt(s): {last}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl core::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Fatal(e) | Self::Malformed(e) | Self::RetriesExhausted { last: e, .. } => Some(e),
            Self::Cancelled => None,
        }
    }
}

/// Fetches single pages from a [`Remote`], one call at a time per page.
///
/// Every attempt waits for a [`Throttler`] slot, is bounded by a timeout, and checks the crawl's
/// cancellation token first. The slot is held until the page is either fetched or given up on,
/// including the delays between retries, and retries always reuse the same cursor.
#[derive(Debug)]
pub struct PageFetcher<R> {
    remote: Arc<R>,
    throttler: Arc<Throttler>,
    cancel: CancellationToken,
    retry: RetryPolicy,
    page_sizes: PageSizes,
    request_timeout: Duration,
    stats: Arc<CrawlStats>,
}

impl<R: Remote> PageFetcher<R> {
    pub fn new(
        remote: Arc<R>,
        throttler: Arc<Throttler>,
        cancel: CancellationToken,
        retry: RetryPolicy,
        page_sizes: PageSizes,
        request_timeout: Duration,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            remote,
            throttler,
            cancel,
            retry,
            page_sizes,
            request_timeout,
            stats,
        }
    }

    pub async fn repositories(&self, org: &str, cursor: Option<&str>) -> Result<Page<String>, FetchError> {
        let remote = &*self.remote;
        let first = self.page_sizes.for_kind(QueryKind::Repositories);
        self.fetch(QueryKind::Repositories, org, || remote.list_repositories(org, cursor, first))
            .await
    }

    pub async fn branches(&self, owner: &str, repo: &str, cursor: Option<&str>) -> Result<Page<String>, FetchError> {
        let remote = &*self.remote;
        let first = self.page_sizes.for_kind(QueryKind::Branches);
        self.fetch(QueryKind::Branches, repo, || remote.list_branches(owner, repo, cursor, first))
            .await
    }

    /// Fetch one page of the history of `branch`, tagging each commit with where it was observed.
    pub async fn commits(
        &self,
        owner: &str,
        repo: &Arc<str>,
        branch: &Arc<str>,
        branch_ref: &str,
        cursor: Option<&str>,
    ) -> Result<Page<CommitRecord>, FetchError> {
        let remote = &*self.remote;
        let first = self.page_sizes.for_kind(QueryKind::Commits);
        let page = self
            .fetch(QueryKind::Commits, branch_ref, || remote.list_commits(owner, repo, branch_ref, cursor, first))
            .await?;
        Ok(page.map(|node| CommitRecord::observed(node, repo, branch)))
    }

    pub async fn default_branch(&self, owner: &str, repo: &str) -> Result<Option<String>, FetchError> {
        let remote = &*self.remote;
        self.fetch(QueryKind::DefaultBranch, repo, || remote.default_branch(owner, repo))
            .await
    }

    async fn fetch<T, F, Fut>(&self, kind: QueryKind, target: &str, mut call: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let _permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(FetchError::Cancelled),
            permit = self.throttler.acquire() => permit,
        };

        let mut attempts = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            attempts += 1;
            self.stats.record_request(kind);

            let outcome = match tokio::time::timeout(self.request_timeout, call()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RemoteError::transient(format!(
                    "request timed out after {}s",
                    self.request_timeout.as_secs()
                ))),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match error.class() {
                FailureClass::Fatal => return Err(FetchError::Fatal(error)),
                FailureClass::Malformed => return Err(FetchError::Malformed(error)),
                FailureClass::Retryable => {}
            }

            if !self.retry.allows_retry(attempts) {
                return Err(FetchError::RetriesExhausted { attempts, last: error });
            }

            if let Some(hint) = error.retry_after()
                && self.throttler.pause_for(hint)
            {
                log::warn!(target: LOG_TARGET, "Remote asked to back off, pausing new requests for {}s", hint.as_secs());
            }

            let delay = self.retry.delay_for(attempts, error.retry_after());
            log::debug!(
                target: LOG_TARGET,
                "Retrying {kind} request for '{target}' (attempt {}, delay {}ms): {error}",
                attempts + 1,
                delay.as_millis(),
            );
            self.stats.record_retry();

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
