//! MALSync cross-reference lookups.
//!
//! MALSync maps a MAL id to the listings of the same title on every content
//! site it knows about, grouped by site and then by listing identifier.

use crate::api::HttpClient;
use crate::error::Result;
use crate::provider::DubDetection;
use crate::similarity::rank_by_similarity;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One listing of a title on a content site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossReferenceEntry {
    /// Site name, e.g. "Gogoanime"
    pub page: String,
    pub url: String,
    pub title: String,
}

impl CrossReferenceEntry {
    /// Provider id of the listing: the last segment of its URL
    pub fn provider_id(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// All listings known for one MAL id, in upstream order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMapping {
    pub title: String,
    pub entries: Vec<CrossReferenceEntry>,
}

#[derive(Debug, Deserialize)]
struct MalSyncResponse {
    title: String,
    #[serde(rename = "Sites", default)]
    sites: serde_json::Map<String, serde_json::Value>,
}

impl From<MalSyncResponse> for SyncMapping {
    fn from(response: MalSyncResponse) -> Self {
        let entries = response
            .sites
            .into_iter()
            .filter_map(|(_, listings)| match listings {
                serde_json::Value::Object(listings) => Some(listings),
                _ => None,
            })
            .flat_map(|listings| listings.into_iter().map(|(_, entry)| entry))
            .filter_map(|entry| match serde_json::from_value::<CrossReferenceEntry>(entry) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed cross-reference entry");
                    None
                }
            })
            .collect();

        SyncMapping {
            title: response.title,
            entries,
        }
    }
}

/// Maps MAL ids to content-site listings
#[async_trait]
pub trait SyncMappingService: Send + Sync {
    /// `Ok(None)` when the service has no mapping for the id
    async fn lookup(&self, mal_id: &str) -> Result<Option<SyncMapping>>;
}

/// Client for api.malsync.moe
#[derive(Debug, Clone)]
pub struct MalSyncClient {
    http: HttpClient,
    base_url: String,
}

impl MalSyncClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SyncMappingService for MalSyncClient {
    async fn lookup(&self, mal_id: &str) -> Result<Option<SyncMapping>> {
        let url = format!("{}/mal/anime/{}", self.base_url, mal_id);
        let (status, body) = self.http.get_lenient(&url).await?;

        if status != StatusCode::OK {
            warn!(mal_id = %mal_id, status = %status, "No MALSync mapping");
            return Ok(None);
        }

        let response: MalSyncResponse = serde_json::from_str(&body)?;
        let mapping = SyncMapping::from(response);
        debug!(mal_id = %mal_id, entries = mapping.entries.len(), "Loaded MALSync mapping");
        Ok(Some(mapping))
    }
}

/// Pick the listing for `provider_name` from a mapping.
///
/// Entries are ranked by similarity to the mapping title first, so the closest
/// same-site listing wins. With [`DubDetection::TitleSubstring`] a listing only
/// qualifies when "dub" appears in its title exactly when `dub` is requested.
pub fn select_cross_reference(
    mapping: &SyncMapping,
    provider_name: &str,
    dub_detection: DubDetection,
    dub: bool,
) -> Option<CrossReferenceEntry> {
    let target = mapping.title.to_lowercase();
    let ranked = rank_by_similarity(mapping.entries.clone(), &target, |entry| {
        entry.title.to_lowercase()
    });

    ranked.into_iter().find(|entry| {
        if !entry.page.eq_ignore_ascii_case(provider_name) {
            return false;
        }
        match dub_detection {
            DubDetection::TitleSubstring => entry.title.to_lowercase().contains("dub") == dub,
            DubDetection::Unmarked => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PIECE: &str = r#"{
        "id": 21,
        "type": "anime",
        "title": "One Piece",
        "url": "https://myanimelist.net/anime/21/One_Piece",
        "Sites": {
            "Gogoanime": {
                "one-piece-dub": {
                    "identifier": "one-piece-dub",
                    "malId": 21,
                    "page": "Gogoanime",
                    "title": "One Piece (Dub)",
                    "type": "anime",
                    "url": "https://gogoanime.tel/category/one-piece-dub"
                },
                "one-piece": {
                    "identifier": "one-piece",
                    "malId": 21,
                    "page": "Gogoanime",
                    "title": "One Piece",
                    "type": "anime",
                    "url": "https://gogoanime.tel/category/one-piece"
                }
            },
            "Zoro": {
                "100": {
                    "identifier": 100,
                    "page": "Zoro",
                    "title": "One Piece",
                    "url": "https://zoro.to/one-piece-100/"
                },
                "broken": { "identifier": "broken" }
            }
        }
    }"#;

    fn mapping() -> SyncMapping {
        let response: MalSyncResponse = serde_json::from_str(ONE_PIECE).unwrap();
        SyncMapping::from(response)
    }

    #[test]
    fn test_flatten_keeps_site_order() {
        let mapping = mapping();
        assert_eq!(mapping.title, "One Piece");

        let pages: Vec<_> = mapping.entries.iter().map(|e| e.page.as_str()).collect();
        assert_eq!(pages, vec!["Gogoanime", "Gogoanime", "Zoro"]);
        assert_eq!(mapping.entries[0].title, "One Piece (Dub)");
    }

    #[test]
    fn test_missing_sites_is_empty() {
        let response: MalSyncResponse = serde_json::from_str(r#"{"title":"Obscure"}"#).unwrap();
        assert!(SyncMapping::from(response).entries.is_empty());
    }

    #[test]
    fn test_provider_id_is_last_segment() {
        let mapping = mapping();
        assert_eq!(mapping.entries[1].provider_id(), "one-piece");
        assert_eq!(mapping.entries[2].provider_id(), "one-piece-100");
    }

    #[test]
    fn test_select_dub_by_title() {
        let mapping = mapping();

        let dub = select_cross_reference(&mapping, "gogoanime", DubDetection::TitleSubstring, true)
            .unwrap();
        assert_eq!(dub.title, "One Piece (Dub)");

        let sub = select_cross_reference(&mapping, "Gogoanime", DubDetection::TitleSubstring, false)
            .unwrap();
        assert_eq!(sub.title, "One Piece");
    }

    #[test]
    fn test_select_unmarked_takes_closest() {
        let mapping = mapping();
        let entry = select_cross_reference(&mapping, "gogoanime", DubDetection::Unmarked, true)
            .unwrap();
        // The exact title outranks the dub listing
        assert_eq!(entry.provider_id(), "one-piece");
    }

    #[test]
    fn test_select_unknown_site() {
        let mapping = mapping();
        assert!(select_cross_reference(&mapping, "crunchyroll", DubDetection::Unmarked, false)
            .is_none());
    }
}
