//! Episode list merging, filler overlay and image backfill.
//!
//! All helpers take the episode list by value and return a new one; they only
//! fill fields that are absent and never renumber.

use crate::provider::{EpisodeIdStyle, EpisodeVariantFilter};
use crate::services::{EpisodeMetadata, FillerEntry};
use shared::{Episode, SubOrDub};
use std::collections::HashMap;

/// Whether the first episode already carries an image, title and description
pub fn is_self_sufficient(episodes: &[Episode]) -> bool {
    episodes.first().is_some_and(|first| {
        first.image.is_some() && first.title.is_some() && first.description.is_some()
    })
}

/// Fill absent fields from `lookup`, consulted at each episode's 1-based position
pub fn merge_episodes(
    episodes: Vec<Episode>,
    lookup: &HashMap<u32, EpisodeMetadata>,
) -> Vec<Episode> {
    episodes
        .into_iter()
        .enumerate()
        .map(|(index, episode)| {
            let Some(metadata) = lookup.get(&(index as u32 + 1)) else {
                return episode;
            };
            Episode {
                title: episode.title.or_else(|| metadata.title.clone()),
                image: episode.image.or_else(|| metadata.thumbnail.clone()),
                description: episode.description.or_else(|| metadata.description.clone()),
                ..episode
            }
        })
        .collect()
}

/// Flag fillers, only when the list covers every episode
pub fn overlay_fillers(episodes: Vec<Episode>, fillers: &[FillerEntry]) -> Vec<Episode> {
    if fillers.is_empty() || fillers.len() < episodes.len() {
        return episodes;
    }

    episodes
        .into_iter()
        .map(|episode| {
            let entry = (episode.number as usize)
                .checked_sub(1)
                .and_then(|index| fillers.get(index));
            match entry {
                Some(entry) => Episode {
                    is_filler: Some(entry.filler),
                    ..episode
                },
                None => episode,
            }
        })
        .collect()
}

/// Use the cover image for episodes without one
pub fn backfill_images(episodes: Vec<Episode>, cover: Option<&str>) -> Vec<Episode> {
    let Some(cover) = cover else {
        return episodes;
    };

    episodes
        .into_iter()
        .map(|episode| Episode {
            image: episode.image.or_else(|| Some(cover.to_string())),
            ..episode
        })
        .collect()
}

/// Keep the episodes serving `requested`; unmarked episodes are dropped
pub fn filter_variant(
    episodes: Vec<Episode>,
    filter: EpisodeVariantFilter,
    requested: SubOrDub,
) -> Vec<Episode> {
    match filter {
        EpisodeVariantFilter::Uniform => episodes,
        EpisodeVariantFilter::PerEpisodeFlag => episodes
            .into_iter()
            .filter(|episode| episode.sub_or_dub.is_some_and(|v| v.accepts(requested)))
            .collect(),
    }
}

/// Point `$both` episode ids at the requested variant
pub fn rewrite_variant_ids(
    episodes: Vec<Episode>,
    candidate: SubOrDub,
    style: EpisodeIdStyle,
    requested: SubOrDub,
) -> Vec<Episode> {
    match (style, candidate) {
        (EpisodeIdStyle::VariantSuffix, SubOrDub::Both) => {
            let both = SubOrDub::Both.id_token();
            episodes
                .into_iter()
                .map(|episode| Episode {
                    id: episode.id.replace(both, requested.id_token()),
                    ..episode
                })
                .collect()
        }
        _ => episodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(number: u32) -> Episode {
        Episode {
            id: format!("ep-{number}"),
            number,
            ..Default::default()
        }
    }

    fn filler(number: u32, filler: bool) -> FillerEntry {
        FillerEntry {
            number: number.to_string(),
            filler,
        }
    }

    #[test]
    fn test_self_sufficient() {
        let mut first = episode(1);
        assert!(!is_self_sufficient(&[first.clone()]));
        assert!(!is_self_sufficient(&[]));

        first.image = Some("img".to_string());
        first.title = Some("title".to_string());
        first.description = Some("desc".to_string());
        assert!(is_self_sufficient(&[first, episode(2)]));
    }

    #[test]
    fn test_merge_never_overwrites() {
        let mut first = episode(1);
        first.title = Some("Provider title".to_string());
        first.image = Some("provider.jpg".to_string());

        let lookup = HashMap::from([
            (
                1,
                EpisodeMetadata {
                    title: Some("Kitsu title".to_string()),
                    description: Some("Kitsu description".to_string()),
                    thumbnail: Some("kitsu.jpg".to_string()),
                },
            ),
            (
                2,
                EpisodeMetadata {
                    title: Some("Second".to_string()),
                    ..Default::default()
                },
            ),
        ]);

        let merged = merge_episodes(vec![first, episode(2), episode(3)], &lookup);

        assert_eq!(merged[0].title.as_deref(), Some("Provider title"));
        assert_eq!(merged[0].image.as_deref(), Some("provider.jpg"));
        assert_eq!(merged[0].description.as_deref(), Some("Kitsu description"));
        assert_eq!(merged[1].title.as_deref(), Some("Second"));
        assert_eq!(merged[1].image, None);
        assert_eq!(merged[2], episode(3));
    }

    #[test]
    fn test_merge_is_positional() {
        // Provider numbering starts at 5, lookup is still consulted by position
        let lookup = HashMap::from([(
            1,
            EpisodeMetadata {
                title: Some("First listed".to_string()),
                ..Default::default()
            },
        )]);

        let merged = merge_episodes(vec![episode(5)], &lookup);
        assert_eq!(merged[0].title.as_deref(), Some("First listed"));
        assert_eq!(merged[0].number, 5);
    }

    #[test]
    fn test_fillers_applied_when_covering() {
        let fillers = vec![filler(1, false), filler(2, true), filler(3, true)];
        let episodes = overlay_fillers(vec![episode(1), episode(2)], &fillers);

        assert_eq!(episodes[0].is_filler, Some(false));
        assert_eq!(episodes[1].is_filler, Some(true));
    }

    #[test]
    fn test_fillers_skipped_when_short() {
        let fillers = vec![filler(1, true)];
        let episodes = overlay_fillers(vec![episode(1), episode(2)], &fillers);
        assert!(episodes.iter().all(|e| e.is_filler.is_none()));

        let episodes = overlay_fillers(vec![episode(1)], &[]);
        assert!(episodes[0].is_filler.is_none());
    }

    #[test]
    fn test_fillers_out_of_range_numbers() {
        let fillers = vec![filler(1, true), filler(2, true)];
        let episodes = overlay_fillers(vec![episode(0), episode(7)], &fillers);
        assert!(episodes.iter().all(|e| e.is_filler.is_none()));
    }

    #[test]
    fn test_backfill_images() {
        let mut first = episode(1);
        first.image = Some("own.jpg".to_string());

        let episodes = backfill_images(vec![first, episode(2)], Some("cover.jpg"));
        assert_eq!(episodes[0].image.as_deref(), Some("own.jpg"));
        assert_eq!(episodes[1].image.as_deref(), Some("cover.jpg"));

        let episodes = backfill_images(vec![episode(1)], None);
        assert_eq!(episodes[0].image, None);
    }

    #[test]
    fn test_rewrite_variant_ids() {
        let episodes = vec![Episode {
            id: "spy-x-family-17977$episode$89507$both".to_string(),
            number: 1,
            ..Default::default()
        }];

        let dubbed = rewrite_variant_ids(
            episodes.clone(),
            SubOrDub::Both,
            EpisodeIdStyle::VariantSuffix,
            SubOrDub::Dub,
        );
        assert_eq!(dubbed[0].id, "spy-x-family-17977$episode$89507$dub");

        let plain = rewrite_variant_ids(
            episodes.clone(),
            SubOrDub::Both,
            EpisodeIdStyle::Plain,
            SubOrDub::Dub,
        );
        assert_eq!(plain, episodes);

        let sub_only = rewrite_variant_ids(
            episodes.clone(),
            SubOrDub::Sub,
            EpisodeIdStyle::VariantSuffix,
            SubOrDub::Sub,
        );
        assert_eq!(sub_only, episodes);
    }

    fn marked(number: u32, variant: Option<SubOrDub>) -> Episode {
        Episode {
            sub_or_dub: variant,
            ..episode(number)
        }
    }

    #[test]
    fn test_filter_variant_keeps_marked_episodes() {
        let episodes = vec![
            marked(1, Some(SubOrDub::Sub)),
            marked(2, Some(SubOrDub::Dub)),
            marked(3, Some(SubOrDub::Both)),
            marked(4, None),
        ];

        let dubbed = filter_variant(
            episodes.clone(),
            EpisodeVariantFilter::PerEpisodeFlag,
            SubOrDub::Dub,
        );
        let numbers: Vec<_> = dubbed.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![2, 3]);

        let subbed = filter_variant(
            episodes.clone(),
            EpisodeVariantFilter::PerEpisodeFlag,
            SubOrDub::Sub,
        );
        let numbers: Vec<_> = subbed.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 3]);

        let uniform = filter_variant(episodes.clone(), EpisodeVariantFilter::Uniform, SubOrDub::Dub);
        assert_eq!(uniform, episodes);
    }
}
