//! GitHub as the crawl's remote
//!
//! [`Client`] implements [`crate::crawl::Remote`] on top of GitHub's GraphQL API.

mod client;
mod queries;

pub use client::{Client, DEFAULT_ENDPOINT, RateLimitInfo};
