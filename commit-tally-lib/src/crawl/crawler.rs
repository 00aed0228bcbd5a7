use super::dedup::DedupSet;
use super::fetcher::{FetchError, PageFetcher};
use super::options::{BranchScope, CrawlOptions};
use super::page::{Page, QueryKind, branch_ref};
use super::remote::Remote;
use super::report::{CrawlError, CrawlReport, SkippedWork};
use super::stats::CrawlStats;
use super::tally::Tally;
use super::throttler::Throttler;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "     crawl";

/// Walks an organization's repositories, branches and commit histories and tallies commits per author.
///
/// Every repository and every branch is processed by its own task. Commits reachable from several
/// branches of the same repository are counted once.
#[derive(Debug)]
pub struct Crawler<R> {
    remote: Arc<R>,
    options: CrawlOptions,
    stats: Arc<CrawlStats>,
}

/// State shared by every task of one crawl.
#[derive(Debug)]
struct Shared<R> {
    org: Arc<str>,
    fetcher: PageFetcher<R>,
    tally: Arc<Tally>,
    options: CrawlOptions,
    stats: Arc<CrawlStats>,
    skipped: Mutex<Vec<SkippedWork>>,
    failure: OnceLock<CrawlError>,
    cancel: CancellationToken,
}

impl<R: Remote> Crawler<R> {
    pub fn new(remote: Arc<R>, options: CrawlOptions) -> Self {
        Self {
            remote,
            options,
            stats: Arc::new(CrawlStats::new()),
        }
    }

    /// Live counters, updated while [`Crawler::run`] is in progress.
    #[must_use]
    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    /// Crawl `org` to completion.
    ///
    /// The counters returned by [`Crawler::stats`] start from zero on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote signals a fatal condition, if the organization's repositories
    /// cannot be listed, or if a task panics. No partial tally is returned in these cases.
    pub async fn run(&self, org: &str) -> Result<CrawlReport, CrawlError> {
        self.stats.reset();
        let cancel = CancellationToken::new();
        let tally = Arc::new(Tally::new());
        let shared = Arc::new(Shared {
            org: Arc::from(org),
            fetcher: PageFetcher::new(
                Arc::clone(&self.remote),
                Throttler::new(self.options.max_concurrent_requests),
                cancel.clone(),
                self.options.retry,
                self.options.page_sizes,
                self.options.request_timeout,
                Arc::clone(&self.stats),
            ),
            tally: Arc::clone(&tally),
            options: self.options,
            stats: Arc::clone(&self.stats),
            skipped: Mutex::default(),
            failure: OnceLock::new(),
            cancel,
        });

        log::info!(target: LOG_TARGET, "Crawling organization '{org}'");

        let mut repositories = JoinSet::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = match shared.fetcher.repositories(org, cursor.as_deref()).await {
                Ok(page) => page,
                Err(FetchError::Fatal(source)) => {
                    shared.abort(CrawlError::Fatal {
                        query: QueryKind::Repositories,
                        target: org.to_string(),
                        source,
                    });
                    break;
                }
                Err(FetchError::Cancelled) => break,
                Err(e) => {
                    shared.abort(CrawlError::ListingFailed {
                        org: org.to_string(),
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            let next = next_cursor(&page, || format!("repositories of '{org}'"));
            for name in page.nodes {
                shared.stats.repository_discovered();
                let _ = repositories.spawn(crawl_repository(Arc::clone(&shared), Arc::from(name)));
            }

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        while let Some(joined) = repositories.join_next().await {
            if let Err(e) = joined {
                shared.task_failed("repository task", &e);
            }
        }

        if let Some(error) = shared.failure.get() {
            return Err(error.clone());
        }

        let skipped = core::mem::take(&mut *shared.skipped.lock().expect("lock not poisoned"));
        drop(shared);

        let report = CrawlReport {
            org: org.to_string(),
            tally: Arc::try_unwrap(tally).unwrap_or_else(|tally| tally.duplicate()),
            stats: self.stats.snapshot(),
            skipped,
        };

        log::info!(
            target: LOG_TARGET,
            "Finished crawling '{org}': {} authors, {} commits",
            report.tally.author_count(),
            report.tally.total_commits()
        );

        Ok(report)
    }
}

impl<R> Shared<R> {
    /// Stop the whole crawl. The first error recorded is the one reported.
    fn abort(&self, error: CrawlError) {
        let message = error.to_string();
        if self.failure.set(error).is_ok() {
            log::error!(target: LOG_TARGET, "{message}");
        }
        self.cancel.cancel();
    }

    fn task_failed(&self, what: &str, e: &JoinError) {
        if e.is_panic() {
            self.abort(CrawlError::TaskPanicked(format!("{what}: {e}")));
        }
    }

    /// Deal with a page that could not be fetched for `repository` (and `branch`, if any).
    fn fetch_failed(&self, query: QueryKind, repository: &str, branch: Option<&str>, error: FetchError) {
        let target = match branch {
            Some(branch) => format!("{repository}@{branch}"),
            None => repository.to_string(),
        };

        match error {
            FetchError::Cancelled => {}
            FetchError::Fatal(source) => self.abort(CrawlError::Fatal { query, target, source }),
            FetchError::Malformed(_) | FetchError::RetriesExhausted { .. } => {
                log::warn!(target: LOG_TARGET, "Skipping '{target}' after failing to fetch {query}: {error}");
                self.stats.work_skipped();
                self.skipped.lock().expect("lock not poisoned").push(SkippedWork {
                    repository: repository.to_string(),
                    branch: branch.map(str::to_owned),
                    reason: error.to_string(),
                });
            }
        }
    }
}

async fn crawl_repository<R: Remote>(shared: Arc<Shared<R>>, repo: Arc<str>) {
    let dedup = Arc::new(DedupSet::new());
    let mut branches = JoinSet::new();

    match shared.options.branch_scope {
        BranchScope::All => {
            let mut cursor: Option<String> = None;
            loop {
                let page = match shared.fetcher.branches(&shared.org, &repo, cursor.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        shared.fetch_failed(QueryKind::Branches, &repo, None, e);
                        break;
                    }
                };

                let next = next_cursor(&page, || format!("branches of '{repo}'"));
                for name in page.nodes {
                    shared.stats.branch_discovered();
                    let _ = branches.spawn(crawl_branch(
                        Arc::clone(&shared),
                        Arc::clone(&repo),
                        Arc::from(name),
                        Arc::clone(&dedup),
                    ));
                }

                match next {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        }

        BranchScope::Default => match shared.fetcher.default_branch(&shared.org, &repo).await {
            Ok(Some(name)) => {
                shared.stats.branch_discovered();
                let _ = branches.spawn(crawl_branch(
                    Arc::clone(&shared),
                    Arc::clone(&repo),
                    Arc::from(name),
                    Arc::clone(&dedup),
                ));
            }
            Ok(None) => log::debug!(target: LOG_TARGET, "Repository '{repo}' has no default branch"),
            Err(e) => shared.fetch_failed(QueryKind::DefaultBranch, &repo, None, e),
        },
    }

    while let Some(joined) = branches.join_next().await {
        if let Err(e) = joined {
            shared.task_failed("branch task", &e);
        }
    }

    if !shared.cancel.is_cancelled() {
        shared.stats.repository_completed();
        log::info!(target: LOG_TARGET, "Processed repository '{repo}' ({} unique commits seen)", dedup.len());
    }
}

async fn crawl_branch<R: Remote>(shared: Arc<Shared<R>>, repo: Arc<str>, branch: Arc<str>, dedup: Arc<DedupSet>) {
    let qualified = branch_ref(&branch);
    let mut cursor: Option<String> = None;

    loop {
        let page = match shared
            .fetcher
            .commits(&shared.org, &repo, &branch, &qualified, cursor.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                shared.fetch_failed(QueryKind::Commits, &repo, Some(&*branch), e);
                return;
            }
        };

        let mut reached_seen_commit = false;
        for commit in &page.nodes {
            if !dedup.check_and_mark(&commit.oid) {
                if shared.options.stop_at_seen_commit {
                    reached_seen_commit = true;
                    break;
                }
                continue;
            }

            if shared.options.skip_merge_pull_requests && commit.is_merge_pull_request() {
                shared.stats.merge_skipped();
                continue;
            }

            shared.tally.record_commit(&commit.author_email, &commit.author_name);
            shared.stats.commit_counted();
        }

        if reached_seen_commit {
            log::trace!(target: LOG_TARGET, "Reached an already counted commit on '{repo}@{branch}'");
            break;
        }

        match next_cursor(&page, || format!("history of '{repo}@{branch}'")) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    shared.stats.branch_completed();
}

/// The cursor of the page following `page`, warning when the remote claims more data but
/// provides no way to reach it.
fn next_cursor<T>(page: &Page<T>, listing: impl FnOnce() -> String) -> Option<String> {
    if page.is_truncated() {
        log::warn!(
            target: LOG_TARGET,
            "Listing of {} ended early: more pages were announced without a cursor",
            listing()
        );
    }
    page.next_cursor().map(str::to_owned)
}
