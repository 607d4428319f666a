//! MyAnimeList meta-provider.
//!
//! This library fetches title metadata from MyAnimeList and attaches the
//! episode listing of a pluggable content provider, resolved through
//! cross-reference lookups or fuzzy title search and enriched from Kitsu.

pub mod api;
pub mod error;
pub mod factory;
pub mod mal;
pub mod meta;
pub mod provider;
pub mod providers;
pub mod services;
pub mod similarity;

pub use api::{HttpClient, LinkResolver};
pub use error::{MetaError, Result};
pub use mal::{AuthoritativeSource, MalClient};
pub use meta::{MalMeta, MetaServices};
pub use provider::{
    ContentProvider, DubDetection, EpisodeIdStyle, EpisodeVariantFilter, InfoOptions,
    LookupStrategy, MangaProvider, NativeMappingProvider, ProviderCapabilities,
};
