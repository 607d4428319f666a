//! HTTP plumbing shared by every scraper and lookup service.
//!
//! Wraps a single reqwest client configured with the user agent and timeout
//! the upstream sites expect.

pub mod client;

pub use client::{HttpClient, LinkResolver};
