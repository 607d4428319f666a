//! MyAnimeList scraper client.

use super::{parser, AuthoritativeSource};
use crate::api::HttpClient;
use crate::error::Result;
use async_trait::async_trait;
use shared::{AnimeInfo, Search, SearchResult};
use tracing::{debug, info};

/// Results per MAL search page
const SEARCH_PAGE_SIZE: u32 = 50;

/// Client for myanimelist.net pages
#[derive(Debug, Clone)]
pub struct MalClient {
    http: HttpClient,
    base_url: String,
}

impl MalClient {
    /// Create a new MAL client
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/anime.php?q={}&cat=anime&show={}",
            self.base_url,
            urlencoding::encode(query),
            SEARCH_PAGE_SIZE * page.saturating_sub(1)
        )
    }
}

#[async_trait]
impl AuthoritativeSource for MalClient {
    async fn fetch_info(&self, id: &str) -> Result<AnimeInfo> {
        let url = format!("{}/anime/{}", self.base_url, id);
        let html = self.http.get_text(&url).await?;

        let info = parser::parse_anime_page(id, &html);
        info!(mal_id = %id, title = %info.title, status = %info.status, "Fetched MAL info");
        Ok(info)
    }

    async fn search(&self, query: &str, page: u32) -> Result<Search<SearchResult>> {
        let page = page.max(1);
        let html = self.http.get_text(&self.search_url(query, page)).await?;

        let results = parser::parse_search_page(&html, page);
        debug!(
            query = %query,
            page = page,
            count = results.results.len(),
            has_next_page = results.has_next_page,
            "MAL search complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> MalClient {
        let http = HttpClient::new("mal-meta-test/0.1.0", Duration::from_secs(5)).unwrap();
        MalClient::new(http, "https://myanimelist.net/")
    }

    #[test]
    fn test_search_url_offsets() {
        let client = client();
        assert_eq!(
            client.search_url("one piece", 1),
            "https://myanimelist.net/anime.php?q=one%20piece&cat=anime&show=0"
        );
        assert!(client.search_url("naruto", 3).ends_with("&show=100"));
        assert!(client.search_url("naruto", 0).ends_with("&show=0"));
    }
}
