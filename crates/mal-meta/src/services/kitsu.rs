//! Kitsu GraphQL episode metadata.

use crate::api::HttpClient;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

const SEARCH_QUERY: &str = r#"
query ($title: String!) {
  searchAnimeByTitle(first: 5, title: $title) {
    nodes {
      id
      season
      startDate
      titles { canonical }
      episodes(first: 2000) {
        nodes {
          number
          titles { canonical }
          description
          thumbnail { original { url } }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "searchAnimeByTitle")]
    search_anime_by_title: Option<Connection<KitsuNode>>,
}

/// GraphQL connection; Kitsu returns `null` for missing nodes
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default)]
    pub nodes: Vec<Option<T>>,
}

/// An anime returned by a Kitsu title search
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitsuNode {
    pub season: Option<String>,
    /// ISO date, e.g. "2021-04-04"
    pub start_date: Option<String>,
    pub episodes: Option<Connection<KitsuEpisode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitsuEpisode {
    pub number: u32,
    pub titles: Option<KitsuTitles>,
    /// Localized descriptions keyed by language code
    pub description: Option<HashMap<String, Option<String>>>,
    pub thumbnail: Option<KitsuImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitsuTitles {
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitsuImage {
    pub original: Option<KitsuImageVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitsuImageVariant {
    pub url: String,
}

/// Per-episode fields used to backfill provider episodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<KitsuEpisode> for EpisodeMetadata {
    fn from(episode: KitsuEpisode) -> Self {
        Self {
            title: episode.titles.and_then(|t| t.canonical),
            description: episode
                .description
                .and_then(|mut localized| localized.remove("en"))
                .flatten(),
            thumbnail: episode.thumbnail.and_then(|t| t.original).map(|o| o.url),
        }
    }
}

/// Secondary source of episode titles, descriptions and thumbnails
#[async_trait]
pub trait EpisodeMetadataService: Send + Sync {
    async fn search_episodes(&self, slug: &str) -> Result<Vec<KitsuNode>>;
}

/// Client for the Kitsu GraphQL API
#[derive(Debug, Clone)]
pub struct KitsuClient {
    http: HttpClient,
    endpoint: String,
}

impl KitsuClient {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EpisodeMetadataService for KitsuClient {
    async fn search_episodes(&self, slug: &str) -> Result<Vec<KitsuNode>> {
        let payload = json!({
            "query": SEARCH_QUERY,
            "variables": { "title": slug },
        });

        let response: GraphQlResponse = self.http.post_json(&self.endpoint, &payload).await?;
        let nodes: Vec<KitsuNode> = response
            .data
            .and_then(|data| data.search_anime_by_title)
            .map(|connection| connection.nodes.into_iter().flatten().collect())
            .unwrap_or_default();

        debug!(slug = %slug, nodes = nodes.len(), "Kitsu search complete");
        Ok(nodes)
    }
}

/// Build a lookup keyed by Kitsu episode number from the nodes matching the
/// record's season and start year.
///
/// Without a season or year nothing matches. Later nodes override earlier
/// ones for the same episode number.
pub fn episode_lookup(
    nodes: Vec<KitsuNode>,
    season: Option<&str>,
    start_year: Option<i32>,
) -> HashMap<u32, EpisodeMetadata> {
    let mut lookup = HashMap::new();
    let (Some(season), Some(start_year)) = (season, start_year) else {
        return lookup;
    };
    let start_year = start_year.to_string();

    for node in nodes {
        let season_matches = node
            .season
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(season));
        let year_matches = node
            .start_date
            .as_deref()
            .and_then(|date| date.trim().split('-').next())
            .is_some_and(|year| year == start_year);

        if !(season_matches && year_matches) {
            continue;
        }

        let episodes = node.episodes.map(|c| c.nodes).unwrap_or_default();
        for episode in episodes.into_iter().flatten() {
            lookup.insert(episode.number, EpisodeMetadata::from(episode));
        }
    }

    lookup
}
