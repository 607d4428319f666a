//! MyAnimeList, the authoritative metadata source.

pub mod client;
pub mod parser;

pub use client::MalClient;

use crate::error::Result;
use async_trait::async_trait;
use shared::{AnimeInfo, Search, SearchResult};

/// Source of truth for title metadata
#[async_trait]
pub trait AuthoritativeSource: Send + Sync {
    /// Fetch a title record; its episode list is always empty
    async fn fetch_info(&self, id: &str) -> Result<AnimeInfo>;

    /// Search titles, `page` is 1-based
    async fn search(&self, query: &str, page: u32) -> Result<Search<SearchResult>>;
}
