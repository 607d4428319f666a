//! Data models for the project.
//!
//! This module defines the normalized result shapes every provider maps into:
//! anime metadata and episodes, provider candidates, stream sources, and the
//! manga equivalents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Airing status of a title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Ongoing,
    Completed,
    NotYetAired,
    #[default]
    Unknown,
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaStatus::Ongoing => write!(f, "ONGOING"),
            MediaStatus::Completed => write!(f, "COMPLETED"),
            MediaStatus::NotYetAired => write!(f, "NOT_YET_AIRED"),
            MediaStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Audio variant of a title or episode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubOrDub {
    Sub,
    Dub,
    Both,
}

impl SubOrDub {
    /// The variant a caller asks for.
    pub fn requested(dub: bool) -> Self {
        if dub {
            SubOrDub::Dub
        } else {
            SubOrDub::Sub
        }
    }

    /// Whether a title carrying `self` can serve the `requested` variant.
    pub fn accepts(self, requested: SubOrDub) -> bool {
        self == SubOrDub::Both || self == requested
    }

    /// Episode id token used by providers that encode the variant in ids.
    pub fn id_token(&self) -> &'static str {
        match self {
            SubOrDub::Sub => "$sub",
            SubOrDub::Dub => "$dub",
            SubOrDub::Both => "$both",
        }
    }
}

impl std::fmt::Display for SubOrDub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubOrDub::Sub => write!(f, "sub"),
            SubOrDub::Dub => write!(f, "dub"),
            SubOrDub::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for SubOrDub {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sub" => Ok(SubOrDub::Sub),
            "dub" => Ok(SubOrDub::Dub),
            "both" => Ok(SubOrDub::Both),
            _ => Err(anyhow::anyhow!("Invalid sub/dub variant: {}", s)),
        }
    }
}

/// Media format as listed by MyAnimeList
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    Manga,
    Novel,
    OneShot,
}

impl MediaFormat {
    /// Map a MAL type column value; anything unrecognized is `None`.
    pub fn from_mal_type(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "TV" => Some(MediaFormat::Tv),
            "TV_SHORT" => Some(MediaFormat::TvShort),
            "MOVIE" => Some(MediaFormat::Movie),
            "SPECIAL" => Some(MediaFormat::Special),
            "OVA" => Some(MediaFormat::Ova),
            "ONA" => Some(MediaFormat::Ona),
            "MUSIC" => Some(MediaFormat::Music),
            "MANGA" => Some(MediaFormat::Manga),
            "NOVEL" => Some(MediaFormat::Novel),
            "ONE_SHOT" => Some(MediaFormat::OneShot),
            _ => None,
        }
    }
}

/// Partial calendar date; MAL often omits the day or month
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FuzzyDate {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Promotional video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trailer {
    pub id: String,
    pub site: String,
    pub thumbnail: String,
}

/// Link to a licensed streaming site listed on the MAL page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamingLink {
    pub site: String,
    pub url: String,
}

/// A single episode, as listed by a content provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_filler: Option<bool>,
    /// Audio variant of this episode, for providers that mark it per episode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_or_dub: Option<SubOrDub>,
}

/// Anime metadata from MyAnimeList, with the provider's episodes attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub image: Option<String>,
    pub studios: Vec<String>,
    pub rating: Option<f64>,
    pub age_rating: Option<String>,
    pub total_episodes: Option<u32>,
    pub season: Option<String>,
    pub start_date: Option<FuzzyDate>,
    pub end_date: Option<FuzzyDate>,
    pub synonyms: Vec<String>,
    pub trailer: Option<Trailer>,
    pub status: MediaStatus,
    pub streaming_links: Vec<StreamingLink>,
    pub episodes: Vec<Episode>,
}

impl AnimeInfo {
    /// Year the title started airing, when known.
    pub fn start_year(&self) -> Option<i32> {
        self.start_date.and_then(|d| d.year)
    }
}

/// Title as returned by providers: either a plain string or localized variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Title {
    Plain(String),
    Localized(LocalizedTitle),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocalizedTitle {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
}

impl Title {
    /// Comparable form: the plain title, else English, else romaji.
    pub fn preferred(&self) -> &str {
        match self {
            Title::Plain(title) => title,
            Title::Localized(t) => t
                .english
                .as_deref()
                .or(t.romaji.as_deref())
                .unwrap_or(""),
        }
    }
}

impl From<&str> for Title {
    fn from(value: &str) -> Self {
        Title::Plain(value.to_string())
    }
}

/// Paged search response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Search<T> {
    pub current_page: u32,
    pub has_next_page: bool,
    pub results: Vec<T>,
}

impl<T> Search<T> {
    /// Single page of results with no continuation.
    pub fn single(results: Vec<T>) -> Self {
        Self {
            current_page: 1,
            has_next_page: false,
            results,
        }
    }
}

/// Search hit from MAL or a content provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: Title,
    pub image: Option<String>,
    pub description: Option<String>,
    pub rating: Option<u32>,
    pub total_episodes: Option<u32>,
    pub format: Option<MediaFormat>,
    /// Provider-specific media type (e.g. "series"), passed back on info lookups
    pub media_type: Option<String>,
    pub sub_or_dub: Option<SubOrDub>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, title: impl Into<Title>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
            description: None,
            rating: None,
            total_episodes: None,
            format: None,
            media_type: None,
            sub_or_dub: None,
        }
    }
}

impl From<String> for Title {
    fn from(value: String) -> Self {
        Title::Plain(value)
    }
}

/// Full title info from a content provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAnime {
    pub id: String,
    pub title: Title,
    pub media_type: Option<String>,
    pub sub_or_dub: SubOrDub,
    pub image: Option<String>,
    pub description: Option<String>,
    pub episodes: Vec<Episode>,
}

/// Stream sources for one episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub headers: HashMap<String, String>,
    pub sources: Vec<VideoSource>,
    pub subtitles: Vec<Subtitle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    pub url: String,
    pub quality: Option<String>,
    #[serde(rename = "isM3U8")]
    pub is_m3u8: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtitle {
    pub url: String,
    pub lang: String,
}

/// Mirror server hosting an episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeServer {
    pub name: String,
    pub url: String,
}

/// Manga search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MangaResult {
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub header_for_image: HashMap<String, String>,
}

/// Manga details with its chapter list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MangaInfo {
    pub id: String,
    pub title: String,
    pub alt_titles: Vec<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub header_for_image: HashMap<String, String>,
    pub genres: Vec<String>,
    pub status: MediaStatus,
    pub views: Option<u64>,
    pub authors: Vec<String>,
    pub chapters: Vec<MangaChapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MangaChapter {
    pub id: String,
    pub title: String,
    pub views: Option<u64>,
    pub release_date: Option<String>,
}

/// One page image of a chapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPage {
    pub page: u32,
    pub img: String,
    pub title: Option<String>,
    pub header_for_image: HashMap<String, String>,
}
