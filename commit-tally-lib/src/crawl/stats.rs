//! Counters describing the progress of a crawl.

use super::page::QueryKind;
use core::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by every crawl task.
///
/// Counters only ever grow. Read them through [`CrawlStats::snapshot`].
#[derive(Debug, Default)]
pub struct CrawlStats {
    requests: [AtomicU64; 4],
    retries: AtomicU64,
    repositories_discovered: AtomicU64,
    repositories_completed: AtomicU64,
    branches_discovered: AtomicU64,
    branches_completed: AtomicU64,
    commits_counted: AtomicU64,
    merges_skipped: AtomicU64,
    skipped_work: AtomicU64,
}

/// A point-in-time copy of [`CrawlStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub requests: [u64; 4],
    pub retries: u64,
    pub repositories_discovered: u64,
    pub repositories_completed: u64,
    pub branches_discovered: u64,
    pub branches_completed: u64,
    pub commits_counted: u64,
    pub merges_skipped: u64,
    pub skipped_work: u64,
}

impl StatsSnapshot {
    #[must_use]
    pub const fn requests_for(&self, kind: QueryKind) -> u64 {
        self.requests[kind.index()]
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.requests.iter().sum()
    }

    /// One-line summary suitable for a progress indicator.
    #[must_use]
    pub fn progress_message(&self) -> String {
        let mut message = format!(
            "{}/{} repos, {}/{} branches, {} commits, {} requests",
            self.repositories_completed,
            self.repositories_discovered,
            self.branches_completed,
            self.branches_discovered,
            self.commits_counted,
            self.total_requests(),
        );

        if self.retries > 0 {
            message.push_str(&format!(", {} retries", self.retries));
        }

        if self.skipped_work > 0 {
            message.push_str(&format!(", {} skipped", self.skipped_work));
        }

        message
    }
}

impl CrawlStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, kind: QueryKind) {
        let _ = self.requests[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        let _ = self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn repository_discovered(&self) {
        let _ = self.repositories_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn repository_completed(&self) {
        let _ = self.repositories_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn branch_discovered(&self) {
        let _ = self.branches_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn branch_completed(&self) {
        let _ = self.branches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn commit_counted(&self) {
        let _ = self.commits_counted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn merge_skipped(&self) {
        let _ = self.merges_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn work_skipped(&self) {
        let _ = self.skipped_work.fetch_add(1, Ordering::Relaxed);
    }

    /// Set every counter back to zero.
    pub fn reset(&self) {
        let counters = self.requests.iter().chain([
            &self.retries,
            &self.repositories_discovered,
            &self.repositories_completed,
            &self.branches_discovered,
            &self.branches_completed,
            &self.commits_counted,
            &self.merges_skipped,
            &self.skipped_work,
        ]);
        for counter in counters {
            counter.store(0, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: QueryKind::all().map(|kind| self.requests[kind.index()].load(Ordering::Relaxed)),
            retries: self.retries.load(Ordering::Relaxed),
            repositories_discovered: self.repositories_discovered.load(Ordering::Relaxed),
            repositories_completed: self.repositories_completed.load(Ordering::Relaxed),
            branches_discovered: self.branches_discovered.load(Ordering::Relaxed),
            branches_completed: self.branches_completed.load(Ordering::Relaxed),
            commits_counted: self.commits_counted.load(Ordering::Relaxed),
            merges_skipped: self.merges_skipped.load(Ordering::Relaxed),
            skipped_work: self.skipped_work.load(Ordering::Relaxed),
        }
    }
}
