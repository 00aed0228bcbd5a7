//! Ranked report generation for crawl results
//!
//! Three report generators are provided, each accessed through a `generate` function:
//! - **Console**: Ranked authors with optional ANSI colors, followed by a crawl summary
//! - **Text**: The plain ranked list, one `N. Name (email) - K commits` line per author
//! - **JSON**: Machine-readable ranking, crawl statistics and skipped work
//!
//! All generators operate on a [`CrawlReport`](crate::crawl::CrawlReport) and write to any
//! [`core::fmt::Write`], leaving the choice of destination to the caller.

mod console;
mod json;
mod text;

pub use console::generate as generate_console;
pub use json::generate as generate_json;
pub use text::generate as generate_text;
