#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for commit-tally
//!
//! This library consolidates all functionality for the commit-tally tool, which walks every
//! repository and branch of a GitHub organization and ranks the authors of its commits.
//!
//! # Module Organization
//!
//! - [`crawl`]: Concurrent paginated traversal, deduplication and aggregation
//! - [`github`]: GitHub GraphQL client used as the crawl's remote
//! - [`reports`]: Ranked report generation
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod crawl;

pub mod github;

#[cfg(any(debug_assertions, test))]
pub mod reports;
#[cfg(not(any(debug_assertions, test)))]
mod reports;

pub use crate::commands::{Host, run};
