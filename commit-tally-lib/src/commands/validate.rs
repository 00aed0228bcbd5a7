use super::Host;
use super::config::{CONFIG_FILE_NAME, Config};
use crate::Result;
use crate::crawl::BranchScope;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `tally.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

/// Load and check a configuration file, then print the settings a crawl would use.
pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config = match Config::load(Utf8Path::new("."), args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            return Err(e);
        }
    };

    let mut out = host.output();
    let _ = writeln!(out, "Configuration file is valid");
    match &args.config {
        Some(path) => {
            let _ = writeln!(out, "Config file: {path}");
        }
        None => {
            let _ = writeln!(out, "Config file: {CONFIG_FILE_NAME} if present, built-in defaults otherwise");
        }
    }

    for line in describe(&config) {
        let _ = writeln!(out, "  {line}");
    }

    Ok(())
}

/// Human-readable summary of the effective crawl settings.
fn describe(config: &Config) -> Vec<String> {
    let attempts = match config.max_attempts {
        0 => "unlimited".to_string(),
        n => n.to_string(),
    };
    let branches = match config.branch_scope {
        BranchScope::All => "all branches",
        BranchScope::Default => "default branch only",
    };

    vec![
        format!("endpoint: {}", config.endpoint),
        format!("concurrent requests: {}", config.max_concurrent_requests),
        format!(
            "page sizes: {} repositories, {} branches, {} commits",
            config.repositories_page_size, config.branches_page_size, config.commits_page_size
        ),
        format!(
            "attempts per page: {attempts} (backoff {}ms to {}ms, timeout {}s)",
            config.retry_base_delay_ms, config.retry_max_delay_ms, config.request_timeout_secs
        ),
        format!("walk: {branches}, early stop {}", if config.stop_at_seen_commit { "on" } else { "off" }),
        format!(
            "merge pull request commits: {}",
            if config.skip_merge_pull_requests { "skipped" } else { "counted" }
        ),
        format!("authors listed: {}", config.top),
    ]
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from(dir.path().to_string_lossy().to_string()).join("tally.toml");
        std::fs::write(&path, contents).expect("Failed to write test config");
        path
    }

    fn validate(contents: &str) -> (Result<()>, TestHost) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = write_config(&temp_dir, contents);

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });
        (result, host)
    }

    #[test]
    fn test_valid_config_prints_effective_settings() {
        let (result, host) = validate("max_attempts = 0\nbranch_scope = \"default\"\nstop_at_seen_commit = false\n");

        result.unwrap();
        let output = host.output_str();
        assert!(output.starts_with("Configuration file is valid\nConfig file: "));
        assert!(output.contains("  attempts per page: unlimited"));
        assert!(output.contains("  walk: default branch only, early stop off"));
        assert!(output.contains("  concurrent requests: 8"));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (result, host) = validate("# nothing to see here\n");

        result.unwrap();
        assert!(host.output_str().contains("  walk: all branches, early stop on"));
    }

    #[test]
    fn test_rejected_configs() {
        let cases = [
            ("top = [\n", None),
            ("top = 10\nunknown_field = \"value\"\n", None),
            ("branch_scope = \"some\"\n", None),
            ("max_concurrent_requests = 1000\n", Some("max_concurrent_requests")),
            ("retry_base_delay_ms = 900\nretry_max_delay_ms = 100\n", Some("retry_base_delay_ms")),
        ];

        for (contents, expected) in cases {
            let (result, host) = validate(contents);

            assert!(result.is_err(), "{contents:?} should be rejected");
            assert_eq!(host.exit_code, Some(1));
            let errors = host.error_str();
            assert!(errors.starts_with("❌ Configuration validation failed"), "{errors}");
            if let Some(expected) = expected {
                assert!(errors.contains(expected), "{contents:?}: expected '{expected}' in {errors}");
            }
            assert!(host.output_str().is_empty());
        }
    }

    #[test]
    fn test_describe_counts_merges_when_enabled() {
        let config = Config {
            skip_merge_pull_requests: false,
            ..Config::default()
        };
        assert!(describe(&config).contains(&"merge pull request commits: counted".to_string()));
    }
}
