//! Content provider abstractions.
//!
//! Providers describe how the aggregator should locate their titles through a
//! [`ProviderCapabilities`] descriptor instead of being identified by type.

use crate::error::{MetaError, Result};
use async_trait::async_trait;
use shared::{
    ChapterPage, EpisodeServer, MangaInfo, MangaResult, ProviderAnime, Search, SearchResult,
    Source,
};

/// How a provider's title is located from a MAL record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// The provider indexes titles by MAL id itself
    NativeMapping,
    /// Resolve through the cross-reference service, then fall back to search
    CrossReference,
    /// Follow the MAL streaming link for the provider's site, else search
    ExternalLinks,
    /// Fuzzy title search only
    SearchOnly,
}

/// How dubbed listings are told apart on the cross-reference service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DubDetection {
    /// Dubbed listings carry "dub" in their title
    TitleSubstring,
    /// Listings are not marked, any same-site entry qualifies
    Unmarked,
}

/// Episode id conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeIdStyle {
    /// Ids are used as given
    Plain,
    /// Ids carry a `$sub` / `$dub` / `$both` variant token
    VariantSuffix,
}

/// Which episodes of a title serve the requested variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeVariantFilter {
    /// Every episode serves the title's variant
    Uniform,
    /// Episodes carry their own variant; only matching ones are kept
    PerEpisodeFlag,
}

/// Capability descriptor consulted by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub lookup: LookupStrategy,
    pub dub_detection: DubDetection,
    pub episode_ids: EpisodeIdStyle,
    pub episode_variants: EpisodeVariantFilter,
    /// Listings of this provider are mirrored by the native-mapping service
    pub native_mirror: bool,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            lookup: LookupStrategy::CrossReference,
            dub_detection: DubDetection::Unmarked,
            episode_ids: EpisodeIdStyle::Plain,
            episode_variants: EpisodeVariantFilter::Uniform,
            native_mirror: false,
        }
    }
}

/// Extra arguments for [`ContentProvider::fetch_info`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoOptions {
    pub dub: bool,
    pub media_type: Option<String>,
}

/// A site serving anime episodes and their streams
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Site name, compared case-insensitively against cross-reference pages
    fn name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    async fn search(&self, query: &str) -> Result<Search<SearchResult>>;

    async fn fetch_info(&self, id: &str, options: &InfoOptions) -> Result<ProviderAnime>;

    async fn fetch_episode_sources(&self, episode_id: &str) -> Result<Source>;

    async fn fetch_episode_servers(&self, _episode_id: &str) -> Result<Vec<EpisodeServer>> {
        Err(MetaError::Unsupported {
            provider: self.name().to_string(),
            operation: "fetch_episode_servers",
        })
    }
}

/// A provider indexing titles directly by MAL id
#[async_trait]
pub trait NativeMappingProvider: Send + Sync {
    /// Substring marking episode ids this provider serves
    fn id_marker(&self) -> &str;

    /// Whether episode lists arrive newest first
    fn newest_first(&self) -> bool {
        false
    }

    /// Look a title up by MAL id; `site` restricts episodes to a mirrored provider
    async fn fetch_by_mal_id(&self, mal_id: &str, site: Option<&str>) -> Result<ProviderAnime>;

    async fn fetch_episode_sources(&self, episode_id: &str) -> Result<Source>;
}

/// A site serving manga chapters
#[async_trait]
pub trait MangaProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Search<MangaResult>>;

    async fn fetch_manga_info(&self, id: &str) -> Result<MangaInfo>;

    async fn fetch_chapter_pages(&self, chapter_id: &str) -> Result<Vec<ChapterPage>>;
}
