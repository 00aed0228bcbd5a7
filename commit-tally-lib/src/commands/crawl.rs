use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::crawl::{BranchScope, CrawlReport, Crawler};
use crate::github::Client;
use crate::reports::{generate_console, generate_json, generate_text};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct CrawlArgs {
    /// GitHub organization whose repositories are crawled
    #[arg(value_name = "ORG")]
    pub org: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `tally.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Number of authors to list, overriding the configuration
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Maximum number of requests in flight, overriding the configuration
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Only walk each repository's default branch
    #[arg(long)]
    pub default_branch_only: bool,

    /// Walk every page of every branch instead of stopping at the first already counted commit
    #[arg(long)]
    pub no_early_stop: bool,

    /// GraphQL endpoint, overriding the configuration
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Write the ranked authors to a text file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub text: Option<Utf8PathBuf>,

    /// Write the ranked authors and crawl statistics to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,
}

impl CrawlArgs {
    /// Apply command-line overrides on top of `config`.
    fn apply_to(&self, config: &mut Config) {
        if let Some(top) = self.top {
            config.top = top;
        }

        if let Some(max_concurrent) = self.max_concurrent {
            config.max_concurrent_requests = max_concurrent;
        }

        if self.default_branch_only {
            config.branch_scope = BranchScope::Default;
        }

        if self.no_early_stop {
            config.stop_at_seen_commit = false;
        }

        if let Some(endpoint) = &self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
    }
}

pub async fn process_crawl<H: Host>(host: &mut H, args: &CrawlArgs) -> Result<()> {
    init_logging(args.log_level);

    let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    args.apply_to(&mut config);
    config.validate()?;

    let token = args
        .github_token
        .as_deref()
        .ok_or_else(|| app_err!("a GitHub token is required, pass --github-token or set GITHUB_TOKEN"))?;

    let options = config.crawl_options();
    let client = Client::new(token, config.endpoint.as_str(), options.request_timeout)?;
    let crawler = Crawler::new(Arc::new(client), options);

    let delay = if args.log_level == LogLevel::None {
        Duration::from_millis(300)
    } else {
        Duration::from_hours(365 * 24)
    };
    let progress = ProgressReporter::new(delay, args.color.use_colors(&std::io::stderr()), crawler.stats());

    let result = crawler.run(&args.org).await;
    progress.done();

    match result {
        Ok(report) => write_reports(host, args, &report, config.top),
        Err(e) => {
            let _ = writeln!(host.error(), "❌ {e}");
            host.exit(1);
            Err(e.into())
        }
    }
}

fn write_reports<H: Host>(host: &mut H, args: &CrawlArgs, report: &CrawlReport, top: usize) -> Result<()> {
    let mut console_output = String::new();
    generate_console(report, top, args.color.use_colors(&std::io::stdout()), &mut console_output)?;
    let _ = write!(host.output(), "{console_output}");

    if let Some(path) = &args.text {
        let mut output = String::new();
        generate_text(report, top, &mut output)?;
        fs::write(path, output).into_app_err_with(|| format!("writing text report to '{path}'"))?;
        let _ = writeln!(host.output(), "Wrote text report to {path}");
    }

    if let Some(path) = &args.json {
        let mut output = String::new();
        generate_json(report, top, &mut output)?;
        fs::write(path, output).into_app_err_with(|| format!("writing JSON report to '{path}'"))?;
        let _ = writeln!(host.output(), "Wrote JSON report to {path}");
    }

    Ok(())
}
