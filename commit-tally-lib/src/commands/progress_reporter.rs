use crate::crawl::CrawlStats;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Refresh rate for progress updates (10 Hz).
const REFRESH_INTERVAL_MS: u64 = 100;

const TEMPLATE: &str = "{prefix:>12.bold.cyan} [{spinner}] {msg}";
const TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{spinner}] {msg}";

/// A crawl spinner on stderr that delays showing itself until a threshold is reached.
///
/// The message is refreshed from the crawl's [`CrawlStats`].
pub struct ProgressReporter {
    bar: ProgressBar,
    visible: Arc<AtomicBool>,
    refresh_task: JoinHandle<()>,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// The spinner only becomes visible if the crawl continues beyond `delay`.
    /// When `use_colors` is false, the spinner is rendered without ANSI styling.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool, stats: Arc<CrawlStats>) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_draw_target(ProgressDrawTarget::hidden());
        bar.set_prefix("Crawling");
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(if use_colors { TEMPLATE } else { TEMPLATE_NO_COLOR })
                .expect("could not create progress bar style")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );

        let visible = Arc::new(AtomicBool::new(false));

        Self {
            refresh_task: tokio::spawn(refresh_task(
                bar.clone(),
                Arc::clone(&visible),
                Instant::now() + delay,
                stats,
            )),
            bar,
            visible,
        }
    }

    /// Stop and clear the spinner.
    pub fn done(&self) {
        self.refresh_task.abort();
        if self.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("visible", &self.visible)
            .field("refresh_task", &"<task>")
            .finish()
    }
}

/// Background refresh task that periodically updates the spinner.
async fn refresh_task(bar: ProgressBar, visible: Arc<AtomicBool>, visible_after: Instant, stats: Arc<CrawlStats>) {
    let start = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_millis(REFRESH_INTERVAL_MS));
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = interval.tick().await;

        if !visible.load(Ordering::Relaxed) && Instant::now() >= visible_after {
            visible.store(true, Ordering::Relaxed);
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        if visible.load(Ordering::Relaxed) {
            bar.tick();
            bar.set_message(format!("{}s: {}", start.elapsed().as_secs(), stats.snapshot().progress_message()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reporter_becomes_visible_after_delay() {
        let reporter = ProgressReporter::new(Duration::ZERO, false, Arc::new(CrawlStats::new()));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(reporter.visible.load(Ordering::Relaxed));
        reporter.done();
    }

    #[tokio::test]
    async fn test_reporter_stays_hidden_before_delay() {
        let reporter = ProgressReporter::new(Duration::from_secs(3600), true, Arc::new(CrawlStats::new()));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!reporter.visible.load(Ordering::Relaxed));
        reporter.done();
    }
}
