//! Enime API provider.
//!
//! Enime indexes titles by MAL id and mirrors the episode listings of other
//! sites, so it serves both as a content provider and as the native-mapping
//! provider.

use crate::api::HttpClient;
use crate::error::{MetaError, Result};
use crate::provider::{
    ContentProvider, DubDetection, EpisodeIdStyle, EpisodeVariantFilter, InfoOptions,
    LookupStrategy, NativeMappingProvider, ProviderCapabilities,
};
use async_trait::async_trait;
use serde::Deserialize;
use shared::{
    Episode, LocalizedTitle, ProviderAnime, Search, SearchResult, Source, SubOrDub, Subtitle,
    Title, VideoSource,
};
use std::collections::HashMap;
use tracing::debug;

const NAME: &str = "Enime";
const ID_MARKER: &str = "enime";
const ID_SUFFIX: &str = "-enime";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<EnimeAnime>,
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchMeta {
    current_page: u32,
    last_page: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnimeAnime {
    id: String,
    #[serde(default)]
    title: LocalizedTitle,
    cover_image: Option<String>,
    description: Option<String>,
    format: Option<String>,
    current_episode: Option<u32>,
    #[serde(default)]
    episodes: Vec<EnimeEpisode>,
}

#[derive(Debug, Deserialize)]
struct EnimeEpisode {
    number: u32,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    #[serde(default)]
    sources: Vec<EnimeEpisodeSource>,
}

#[derive(Debug, Deserialize)]
struct EnimeEpisodeSource {
    id: String,
    /// Page of the episode on the mirrored site
    url: Option<String>,
    website: Option<String>,
}

impl EnimeEpisodeSource {
    fn hosted_on(&self, site: &str) -> bool {
        let site = site.to_lowercase();
        [self.website.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&site))
    }

    /// Episode slug on the mirrored site
    fn slug(&self) -> Option<String> {
        self.url
            .as_deref()?
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct EnimeStream {
    url: String,
    referer: Option<String>,
    subtitle: Option<String>,
}

impl EnimeAnime {
    /// Convert into a provider title. Without `site`, episode ids point at
    /// Enime's own sources; with it, ids are the mirrored site's slugs.
    fn into_provider_anime(self, site: Option<&str>) -> ProviderAnime {
        let episodes = self
            .episodes
            .into_iter()
            .filter_map(|episode| {
                let id = match site {
                    Some(site) => episode.sources.iter().find(|s| s.hosted_on(site))?.slug()?,
                    None => format!("{}{}", episode.sources.first()?.id, ID_SUFFIX),
                };
                Some(Episode {
                    id,
                    number: episode.number,
                    title: episode.title,
                    description: episode.description,
                    image: episode.image,
                    ..Default::default()
                })
            })
            .collect();

        ProviderAnime {
            id: self.id,
            title: Title::Localized(self.title),
            media_type: self.format,
            sub_or_dub: SubOrDub::Sub,
            image: self.cover_image,
            description: self.description,
            episodes,
        }
    }

    fn into_search_result(self) -> SearchResult {
        let mut result = SearchResult::new(self.id, Title::Localized(self.title));
        result.image = self.cover_image;
        result.description = self.description;
        result.total_episodes = self.current_episode;
        result.media_type = self.format;
        result.sub_or_dub = Some(SubOrDub::Sub);
        result
    }
}

/// Client for api.enime.moe
#[derive(Debug, Clone)]
pub struct Enime {
    http: HttpClient,
    base_url: String,
}

impl Enime {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_sources(&self, episode_id: &str) -> Result<Source> {
        let source_id = episode_id.trim_end_matches(ID_SUFFIX);
        if source_id.is_empty() {
            return Err(MetaError::provider(NAME, "empty episode id"));
        }

        let url = format!("{}/source/{}", self.base_url, source_id);
        let stream: EnimeStream = self.http.get_json(&url).await?;

        let mut headers = HashMap::new();
        if let Some(referer) = stream.referer {
            headers.insert("Referer".to_string(), referer);
        }

        Ok(Source {
            headers,
            sources: vec![VideoSource {
                is_m3u8: stream.url.contains(".m3u8"),
                url: stream.url,
                quality: Some("default".to_string()),
            }],
            subtitles: stream
                .subtitle
                .map(|url| Subtitle {
                    url,
                    lang: "English".to_string(),
                })
                .into_iter()
                .collect(),
        })
    }
}

#[async_trait]
impl ContentProvider for Enime {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            lookup: LookupStrategy::NativeMapping,
            dub_detection: DubDetection::Unmarked,
            episode_ids: EpisodeIdStyle::Plain,
            episode_variants: EpisodeVariantFilter::Uniform,
            native_mirror: false,
        }
    }

    async fn search(&self, query: &str) -> Result<Search<SearchResult>> {
        let url = format!("{}/search/{}", self.base_url, urlencoding::encode(query));
        let response: SearchResponse = self.http.get_json(&url).await?;

        let (current_page, has_next_page) = response
            .meta
            .map(|meta| (meta.current_page, meta.current_page < meta.last_page))
            .unwrap_or((1, false));

        let results: Vec<SearchResult> = response
            .data
            .into_iter()
            .map(EnimeAnime::into_search_result)
            .collect();
        debug!(provider = NAME, query = %query, count = results.len(), "Search complete");

        Ok(Search {
            current_page,
            has_next_page,
            results,
        })
    }

    async fn fetch_info(&self, id: &str, _options: &InfoOptions) -> Result<ProviderAnime> {
        let url = format!("{}/anime/{}", self.base_url, id);
        let anime: EnimeAnime = self.http.get_json(&url).await?;
        Ok(anime.into_provider_anime(None))
    }

    async fn fetch_episode_sources(&self, episode_id: &str) -> Result<Source> {
        self.fetch_sources(episode_id).await
    }
}

#[async_trait]
impl NativeMappingProvider for Enime {
    fn id_marker(&self) -> &str {
        ID_MARKER
    }

    fn newest_first(&self) -> bool {
        true
    }

    async fn fetch_by_mal_id(&self, mal_id: &str, site: Option<&str>) -> Result<ProviderAnime> {
        let url = format!("{}/mapping/mal/{}", self.base_url, mal_id);
        let anime: EnimeAnime = self.http.get_json(&url).await?;

        let anime = anime.into_provider_anime(site);
        debug!(
            mal_id = %mal_id,
            site = site.unwrap_or(NAME),
            episodes = anime.episodes.len(),
            "Loaded Enime mapping"
        );
        Ok(anime)
    }

    async fn fetch_episode_sources(&self, episode_id: &str) -> Result<Source> {
        self.fetch_sources(episode_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r#"{
        "id": "cl6k4jd2u00010imqf2k6b3t1",
        "slug": "spy-x-family",
        "title": { "english": "SPY x FAMILY", "romaji": "Spy x Family", "native": "SPY×FAMILY" },
        "coverImage": "https://s4.anilist.co/file/anilistcdn/media/anime/cover/large/bx140960.jpg",
        "description": "Master spy Twilight...",
        "format": "TV",
        "currentEpisode": 2,
        "episodes": [
            {
                "number": 2,
                "title": "Secure a Wife",
                "sources": [
                    { "id": "src-2z", "url": "https://zoro.to/watch/spy-x-family-17977?ep=89507", "website": "Zoro" },
                    { "id": "src-2g", "url": "https://gogoanime.tel/spy-x-family-episode-2", "website": "Gogoanime" }
                ]
            },
            {
                "number": 1,
                "title": "Operation Strix",
                "image": "https://artworks.thetvdb.com/banners/episodes/1.jpg",
                "sources": [
                    { "id": "src-1g", "url": "https://gogoanime.tel/spy-x-family-episode-1/", "website": "Gogoanime" }
                ]
            },
            { "number": 3, "title": "Unreleased", "sources": [] }
        ]
    }"#;

    fn anime() -> EnimeAnime {
        serde_json::from_str(MAPPING).unwrap()
    }

    #[test]
    fn test_own_episode_ids_carry_marker() {
        let anime = anime().into_provider_anime(None);

        assert_eq!(anime.title.preferred(), "SPY x FAMILY");
        assert_eq!(anime.sub_or_dub, SubOrDub::Sub);
        assert_eq!(anime.episodes.len(), 2);
        assert_eq!(anime.episodes[0].id, "src-2z-enime");
        assert!(anime.episodes[0].id.contains(ID_MARKER));
        assert_eq!(anime.episodes[1].number, 1);
    }

    #[test]
    fn test_site_filter_uses_mirrored_slugs() {
        let anime = anime().into_provider_anime(Some("gogoanime"));

        let ids: Vec<_> = anime.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["spy-x-family-episode-2", "spy-x-family-episode-1"]);
        assert_eq!(
            anime.episodes[1].image.as_deref(),
            Some("https://artworks.thetvdb.com/banners/episodes/1.jpg")
        );
    }

    #[test]
    fn test_site_filter_drops_unmirrored_episodes() {
        let anime = anime().into_provider_anime(Some("Zoro"));
        assert_eq!(anime.episodes.len(), 1);
        assert_eq!(anime.episodes[0].number, 2);
    }

    #[test]
    fn test_search_result_mapping() {
        let response: SearchResponse = serde_json::from_str(&format!(
            r#"{{"data": [{MAPPING}], "meta": {{"currentPage": 1, "lastPage": 3}}}}"#
        ))
        .unwrap();
        let result = response.data.into_iter().next().unwrap().into_search_result();

        assert_eq!(result.total_episodes, Some(2));
        assert_eq!(result.media_type.as_deref(), Some("TV"));
        assert_eq!(result.sub_or_dub, Some(SubOrDub::Sub));
    }
}
