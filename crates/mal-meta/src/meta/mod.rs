//! MyAnimeList meta-provider.
//!
//! Combines MAL metadata with the episode listing of a content provider,
//! enriched from Kitsu and an optional filler list.

pub mod enrich;
mod resolve;


use crate::api::LinkResolver;
use crate::error::Result;
use crate::mal::AuthoritativeSource;
use crate::provider::{ContentProvider, NativeMappingProvider};
use crate::services::{EpisodeMetadataService, FillerListService, SyncMappingService};
use chrono::Datelike;
use shared::{AnimeInfo, Episode, EpisodeServer, MediaStatus, Search, SearchResult, Source};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// First start year eligible for the native mirror
const MIRROR_FIRST_YEAR: i32 = 2000;

/// Collaborators consulted by [`MalMeta`]
#[derive(Clone)]
pub struct MetaServices {
    pub mal: Arc<dyn AuthoritativeSource>,
    pub native: Arc<dyn NativeMappingProvider>,
    pub sync: Arc<dyn SyncMappingService>,
    pub kitsu: Arc<dyn EpisodeMetadataService>,
    pub fillers: Arc<dyn FillerListService>,
    pub links: Arc<dyn LinkResolver>,
}

/// Aggregates MAL metadata with a content provider's episodes
#[derive(Clone)]
pub struct MalMeta {
    provider: Arc<dyn ContentProvider>,
    services: MetaServices,
}

/// Whether the native mirror should be asked before the normal chain
pub fn mirror_eligible(info: &AnimeInfo, dub: bool, current_year: i32) -> bool {
    if dub {
        return false;
    }
    info.status == MediaStatus::Ongoing
        || info
            .start_year()
            .is_some_and(|year| (MIRROR_FIRST_YEAR..=current_year).contains(&year))
}

impl MalMeta {
    pub fn new(provider: Arc<dyn ContentProvider>, services: MetaServices) -> Self {
        Self { provider, services }
    }

    /// Active content provider
    pub fn provider(&self) -> &dyn ContentProvider {
        self.provider.as_ref()
    }

    /// Fetch MAL info with the provider's episodes attached.
    pub async fn fetch_anime_info(&self, id: &str, dub: bool, fetch_filler: bool) -> Result<AnimeInfo> {
        info!(mal_id = %id, provider = self.provider.name(), dub, fetch_filler, "Fetching anime info");

        let mut anime = match self.services.mal.fetch_info(id).await {
            Ok(anime) => anime,
            Err(e) => {
                warn!(mal_id = %id, error = %e, "MAL lookup failed");
                return Err(e);
            }
        };

        let current_year = chrono::Local::now().year();
        let episodes = match self.mirrored_episodes(&anime, dub, current_year).await {
            Some(episodes) => episodes,
            None => match self.find_episodes(&anime, dub).await {
                Ok(episodes) => episodes,
                Err(e) => {
                    warn!(mal_id = %id, provider = self.provider.name(), error = %e, "Episode lookup failed");
                    return Err(e);
                }
            },
        };

        let episodes = if fetch_filler {
            self.apply_fillers(id, episodes).await
        } else {
            episodes
        };

        anime.episodes = enrich::backfill_images(episodes, anime.image.as_deref());
        info!(mal_id = %id, episodes = anime.episodes.len(), "Anime info complete");
        Ok(anime)
    }

    /// Ask the native-mapping service for the provider's mirrored listing.
    async fn mirrored_episodes(
        &self,
        anime: &AnimeInfo,
        dub: bool,
        current_year: i32,
    ) -> Option<Vec<Episode>> {
        if !self.provider.capabilities().native_mirror || !mirror_eligible(anime, dub, current_year) {
            return None;
        }

        let site = self.provider.name().to_lowercase();
        match self.services.native.fetch_by_mal_id(&anime.id, Some(&site)).await {
            Ok(mirrored) if !mirrored.episodes.is_empty() => {
                debug!(mal_id = %anime.id, site = %site, episodes = mirrored.episodes.len(), "Using mirrored episodes");
                Some(self.native_order(mirrored.episodes))
            }
            Ok(_) => {
                debug!(mal_id = %anime.id, site = %site, "Mirror has no episodes");
                None
            }
            Err(e) => {
                warn!(mal_id = %anime.id, site = %site, error = %e, "Mirror lookup failed");
                None
            }
        }
    }

    async fn apply_fillers(&self, id: &str, episodes: Vec<Episode>) -> Vec<Episode> {
        match self.services.fillers.fetch(id).await {
            Ok(Some(fillers)) => enrich::overlay_fillers(episodes, &fillers),
            Ok(None) => {
                debug!(mal_id = %id, "No filler list");
                episodes
            }
            Err(e) => {
                warn!(mal_id = %id, error = %e, "Filler list unavailable");
                episodes
            }
        }
    }

    /// Stream sources; ids carrying the native marker go to the native provider
    pub async fn fetch_episode_sources(&self, episode_id: &str) -> Result<Source> {
        let marker = self.services.native.id_marker();
        if !marker.is_empty() && episode_id.contains(marker) {
            return self.services.native.fetch_episode_sources(episode_id).await;
        }
        self.provider.fetch_episode_sources(episode_id).await
    }

    pub async fn fetch_episode_servers(&self, episode_id: &str) -> Result<Vec<EpisodeServer>> {
        self.provider.fetch_episode_servers(episode_id).await
    }

    /// Search MAL
    pub async fn search(&self, query: &str, page: u32) -> Result<Search<SearchResult>> {
        self.services.mal.search(query, page).await
    }

    /// MAL record without episodes
    pub async fn fetch_mal_info(&self, id: &str) -> Result<AnimeInfo> {
        self.services.mal.fetch_info(id).await
    }
}
