//! Static filler episode lists keyed by MAL id.

use crate::api::HttpClient;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// One row of a filler list
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FillerEntry {
    #[serde(deserialize_with = "number_or_string")]
    pub number: String,
    #[serde(rename = "filler-bool", default)]
    pub filler: bool,
}

#[derive(Debug, Deserialize)]
struct FillerList {
    #[serde(default)]
    episodes: Vec<FillerEntry>,
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Text(String),
    }

    Ok(match Number::deserialize(deserializer)? {
        Number::Int(n) => n.to_string(),
        Number::Text(s) => s,
    })
}

/// Whether a filler list body is the upstream not-found page
pub fn is_not_found(body: &str) -> bool {
    body.trim_start().starts_with("404")
}

/// Source of filler lists
#[async_trait]
pub trait FillerListService: Send + Sync {
    /// `Ok(None)` when no list exists for the id
    async fn fetch(&self, mal_id: &str) -> Result<Option<Vec<FillerEntry>>>;
}

/// Client for the GitHub-hosted mal-id filler list
#[derive(Debug, Clone)]
pub struct FillerClient {
    http: HttpClient,
    base_url: String,
}

impl FillerClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FillerListService for FillerClient {
    async fn fetch(&self, mal_id: &str) -> Result<Option<Vec<FillerEntry>>> {
        let url = format!("{}/{}.json", self.base_url, mal_id);
        let (status, body) = self.http.get_lenient(&url).await?;

        if !status.is_success() || is_not_found(&body) {
            debug!(mal_id = %mal_id, status = %status, "No filler list");
            return Ok(None);
        }

        let list: FillerList = serde_json::from_str(&body)?;
        debug!(mal_id = %mal_id, episodes = list.episodes.len(), "Loaded filler list");
        Ok(Some(list.episodes))
    }
}
