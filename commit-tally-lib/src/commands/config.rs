use crate::Result;
use crate::crawl::{BranchScope, CrawlOptions, PageSizes, RetryPolicy};
use crate::github::DEFAULT_ENDPOINT;
use camino::{Utf8Path, Utf8PathBuf};
use core::ops::RangeInclusive;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up when none is given explicitly.
pub const CONFIG_FILE_NAME: &str = "tally.toml";

const CONCURRENCY_RANGE: RangeInclusive<usize> = 1..=256;
const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum number of remote calls in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_repositories_page_size")]
    pub repositories_page_size: u32,

    #[serde(default = "default_page_size")]
    pub branches_page_size: u32,

    #[serde(default = "default_page_size")]
    pub commits_page_size: u32,

    /// Attempts per page, including the first one; zero means no limit
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub stop_at_seen_commit: bool,

    #[serde(default = "default_true")]
    pub skip_merge_pull_requests: bool,

    #[serde(default)]
    pub branch_scope: BranchScope,

    /// Number of authors listed in reports
    #[serde(default = "default_top")]
    pub top: usize,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

const fn default_max_concurrent_requests() -> usize {
    8
}

const fn default_repositories_page_size() -> u32 {
    50
}

const fn default_page_size() -> u32 {
    100
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_retry_base_delay_ms() -> u64 {
    500
}

const fn default_retry_max_delay_ms() -> u64 {
    30_000
}

const fn default_request_timeout_secs() -> u64 {
    60
}

const fn default_true() -> bool {
    true
}

const fn default_top() -> usize {
    100
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading commit-tally configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading commit-tally configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or inconsistent with another
    pub fn validate(&self) -> Result<()> {
        if !CONCURRENCY_RANGE.contains(&self.max_concurrent_requests) {
            return Err(app_err!(
                "max_concurrent_requests must be between 1 and 256, got {}",
                self.max_concurrent_requests
            ));
        }

        for (name, size) in [
            ("repositories_page_size", self.repositories_page_size),
            ("branches_page_size", self.branches_page_size),
            ("commits_page_size", self.commits_page_size),
        ] {
            if !PAGE_SIZE_RANGE.contains(&size) {
                return Err(app_err!("{name} must be between 1 and 100, got {size}"));
            }
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(app_err!(
                "retry_base_delay_ms ({}) must not exceed retry_max_delay_ms ({})",
                self.retry_base_delay_ms,
                self.retry_max_delay_ms
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(app_err!("request_timeout_secs must be at least 1"));
        }

        if self.top == 0 {
            return Err(app_err!("top must be at least 1"));
        }

        if self.endpoint.trim().is_empty() {
            return Err(app_err!("endpoint must not be empty"));
        }

        Ok(())
    }

    /// The crawl settings described by this configuration.
    #[must_use]
    pub const fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_concurrent_requests: self.max_concurrent_requests,
            page_sizes: PageSizes {
                repositories: self.repositories_page_size,
                branches: self.branches_page_size,
                commits: self.commits_page_size,
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
            },
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            stop_at_seen_commit: self.stop_at_seen_commit,
            skip_merge_pull_requests: self.skip_merge_pull_requests,
            branch_scope: self.branch_scope,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_matches_crawl_defaults() {
        assert_eq!(Config::default().crawl_options(), CrawlOptions::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let config = Config { max_concurrent_requests: 0, ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { max_concurrent_requests: 257, ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { max_concurrent_requests: 256, ..Config::default() };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_page_sizes() {
        let config = Config { commits_page_size: 101, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("commits_page_size"));

        let config = Config { repositories_page_size: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_retry_delays() {
        let config = Config {
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 500,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 500,
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_timeout_and_top() {
        let config = Config { request_timeout_secs: 0, ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { top: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(toml::from_str::<Config>("concurrency = 4").is_err());
    }

    #[test]
    fn test_crawl_options_from_config() {
        let config: Config = toml::from_str(
            r#"
max_concurrent_requests = 3
commits_page_size = 20
max_attempts = 0
stop_at_seen_commit = false
branch_scope = "default"
"#,
        )
        .unwrap();

        let options = config.crawl_options();
        assert_eq!(options.max_concurrent_requests, 3);
        assert_eq!(options.page_sizes.commits, 20);
        assert_eq!(options.page_sizes.branches, 100);
        assert!(options.retry.allows_retry(1_000));
        assert!(!options.stop_at_seen_commit);
        assert!(options.skip_merge_pull_requests);
        assert_eq!(options.branch_scope, BranchScope::Default);
    }

    #[test]
    fn test_load_missing_default_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = Utf8PathBuf::from(temp_dir.path().to_string_lossy().to_string());

        let config = Config::load(&base, None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = Utf8PathBuf::from(temp_dir.path().to_string_lossy().to_string());
        let path = base.join("nope.toml");

        assert!(Config::load(&base, Some(&path)).is_err());
    }

    #[test]
    fn test_load_picks_up_tally_toml() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = Utf8PathBuf::from(temp_dir.path().to_string_lossy().to_string());
        fs::write(base.join(CONFIG_FILE_NAME), "top = 7\n").unwrap();

        let config = Config::load(&base, None).unwrap();
        assert_eq!(config.top, 7);
    }
}
