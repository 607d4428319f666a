//! Locating a MAL title on the active content provider.
//!
//! Tiers run in order until one yields a candidate: native mapping, the
//! cross-reference service, MAL's streaming links, then fuzzy title search.
//! Which of them apply is decided by the provider's [`LookupStrategy`].

use super::{enrich, MalMeta};
use crate::error::Result;
use crate::provider::{InfoOptions, LookupStrategy, ProviderCapabilities};
use crate::services::{episode_lookup, select_cross_reference};
use crate::similarity::{rank_by_similarity, slugify};
use shared::{AnimeInfo, Episode, ProviderAnime, SubOrDub};
use tracing::{debug, info, warn};

impl MalMeta {
    /// Resolve the provider's episode list for `info`.
    pub(crate) async fn find_episodes(&self, info: &AnimeInfo, dub: bool) -> Result<Vec<Episode>> {
        let caps = self.provider.capabilities();
        let slug = slugify(&info.title);
        let requested = SubOrDub::requested(dub);

        let candidate = match caps.lookup {
            LookupStrategy::NativeMapping => {
                let anime = self.services.native.fetch_by_mal_id(&info.id, None).await?;
                debug!(mal_id = %info.id, episodes = anime.episodes.len(), "Native mapping passthrough");
                if !offers_variant(info, &anime, requested) {
                    return Ok(Vec::new());
                }
                return Ok(self.native_order(anime.episodes));
            }
            LookupStrategy::CrossReference => self.cross_reference(info, &slug, caps, dub).await?,
            LookupStrategy::ExternalLinks => self.external_link(info, &slug, dub).await?,
            LookupStrategy::SearchOnly => self.search_fallback(&slug, dub).await?,
        };

        let Some(candidate) = candidate else {
            info!(mal_id = %info.id, provider = self.provider.name(), "No matching title on provider");
            return Ok(Vec::new());
        };

        if !offers_variant(info, &candidate, requested) {
            return Ok(Vec::new());
        }

        let episodes = enrich::filter_variant(candidate.episodes, caps.episode_variants, requested);
        let episodes = enrich::rewrite_variant_ids(
            episodes,
            candidate.sub_or_dub,
            caps.episode_ids,
            requested,
        );

        Ok(self.reconcile(info, &slug, episodes).await)
    }

    /// Tier 2: MALSync listing for the provider, falling back to search.
    async fn cross_reference(
        &self,
        info: &AnimeInfo,
        slug: &str,
        caps: ProviderCapabilities,
        dub: bool,
    ) -> Result<Option<ProviderAnime>> {
        match self.services.sync.lookup(&info.id).await {
            Ok(Some(mapping)) => {
                let entry =
                    select_cross_reference(&mapping, self.provider.name(), caps.dub_detection, dub);
                match entry {
                    Some(entry) => {
                        let options = InfoOptions {
                            dub,
                            media_type: None,
                        };
                        match self.provider.fetch_info(entry.provider_id(), &options).await {
                            Ok(anime) => {
                                debug!(mal_id = %info.id, url = %entry.url, "Matched cross-reference listing");
                                return Ok(Some(anime));
                            }
                            Err(e) => warn!(
                                mal_id = %info.id,
                                url = %entry.url,
                                error = %e,
                                "Cross-referenced listing failed, falling back to search"
                            ),
                        }
                    }
                    None => debug!(mal_id = %info.id, "No cross-reference listing for provider"),
                }
            }
            Ok(None) => debug!(mal_id = %info.id, "No cross-reference mapping"),
            Err(e) => warn!(mal_id = %info.id, error = %e, "Cross-reference lookup failed"),
        }

        self.search_fallback(slug, dub).await
    }

    /// Tier 4: follow the MAL streaming link for the provider's site.
    async fn external_link(
        &self,
        info: &AnimeInfo,
        slug: &str,
        dub: bool,
    ) -> Result<Option<ProviderAnime>> {
        let site = self.provider.name().to_lowercase();
        let Some(link) = info
            .streaming_links
            .iter()
            .find(|link| link.site.to_lowercase().contains(&site))
        else {
            return self.search_fallback(slug, dub).await;
        };

        let resolved = match self.services.links.resolve(&link.url).await {
            Ok(url) => url,
            Err(e) => {
                warn!(mal_id = %info.id, url = %link.url, error = %e, "Streaming link did not resolve");
                return self.search_fallback(slug, dub).await;
            }
        };

        let segments: Vec<&str> = resolved
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [media_type, id, ..] => {
                debug!(mal_id = %info.id, url = %resolved, "Following streaming link");
                let options = InfoOptions {
                    dub,
                    media_type: Some(media_type.to_string()),
                };
                Ok(Some(self.provider.fetch_info(id, &options).await?))
            }
            _ => {
                debug!(url = %resolved, "Streaming link has no title path");
                self.search_fallback(slug, dub).await
            }
        }
    }

    /// Tier 3: search the provider and take the closest title.
    async fn search_fallback(&self, slug: &str, dub: bool) -> Result<Option<ProviderAnime>> {
        let results = self.provider.search(slug).await?.results;
        let target = slug.to_lowercase();
        let ranked = rank_by_similarity(results, &target, |result| {
            result.title.preferred().to_lowercase()
        });

        let Some(top) = ranked.into_iter().next() else {
            debug!(slug = %slug, "Provider search returned nothing");
            return Ok(None);
        };

        debug!(slug = %slug, id = %top.id, title = %top.title.preferred(), "Best search match");
        let options = InfoOptions {
            dub,
            media_type: top.media_type.clone(),
        };
        Ok(Some(self.provider.fetch_info(&top.id, &options).await?))
    }

    /// Backfill episode fields from Kitsu unless the provider already has them.
    async fn reconcile(&self, info: &AnimeInfo, slug: &str, episodes: Vec<Episode>) -> Vec<Episode> {
        if episodes.is_empty() || enrich::is_self_sufficient(&episodes) {
            return episodes;
        }

        match self.services.kitsu.search_episodes(slug).await {
            Ok(nodes) => {
                let lookup = episode_lookup(nodes, info.season.as_deref(), info.start_year());
                debug!(mal_id = %info.id, matched = lookup.len(), "Kitsu episode lookup");
                enrich::merge_episodes(episodes, &lookup)
            }
            Err(e) => {
                warn!(mal_id = %info.id, error = %e, "Kitsu lookup failed, keeping provider episodes");
                episodes
            }
        }
    }

    /// Native listings may arrive newest first; episodes are returned oldest first.
    pub(crate) fn native_order(&self, mut episodes: Vec<Episode>) -> Vec<Episode> {
        if self.services.native.newest_first() {
            episodes.reverse();
        }
        episodes
    }
}

/// A candidate offering only the other variant is rejected, never substituted.
fn offers_variant(info: &AnimeInfo, candidate: &ProviderAnime, requested: SubOrDub) -> bool {
    let accepted = candidate.sub_or_dub.accepts(requested);
    if !accepted {
        info!(
            mal_id = %info.id,
            candidate = %candidate.id,
            available = %candidate.sub_or_dub,
            requested = %requested,
            "Candidate does not offer the requested variant"
        );
    }
    accepted
}
