//! Lookup services consulted while resolving and enriching episode lists.

pub mod filler;
pub mod kitsu;
pub mod malsync;

pub use filler::{FillerClient, FillerEntry, FillerListService};
pub use kitsu::{episode_lookup, EpisodeMetadata, EpisodeMetadataService, KitsuClient, KitsuNode};
pub use malsync::{
    select_cross_reference, CrossReferenceEntry, MalSyncClient, SyncMapping, SyncMappingService,
};
