//! Command-line interface and orchestration for commit-tally
//!
//! This module implements the CLI commands and wires the crawl, the GitHub client
//! and the report generators together.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **crawl**: Crawl an organization through the GitHub GraphQL API, rank its commit
//!   authors, and print or write the ranked report
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file's syntax and values
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. The crawl command:
//!
//! 1. Sets up logging and loads the configuration, applying command-line overrides
//! 2. Builds a GitHub client and a crawler from the configuration
//! 3. Runs the crawl while a progress spinner reports its statistics
//! 4. Generates the console report and any requested file reports
//!
//! Configuration is managed through a TOML file (`tally.toml`) whose defaults are
//! embedded from `default_config.toml`.

mod common;
mod config;
mod crawl;
mod host;
mod init;
mod progress_reporter;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use crawl::{CrawlArgs, process_crawl};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
