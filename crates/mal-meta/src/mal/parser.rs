//! MyAnimeList page parsing.
//!
//! Parsing is deliberately lenient: MAL markup changes often, so a field that
//! does not parse is left empty instead of failing the whole page.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use shared::{
    AnimeInfo, FuzzyDate, MediaFormat, MediaStatus, Search, SearchResult, StreamingLink, Trailer,
};

const TRAILER_SITE: &str = "https://youtube.com/watch?v=";
const MAL_CDN_IMAGES: &str = "https://cdn.myanimelist.net/images/anime/";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static TITLE: Lazy<Selector> = Lazy::new(|| selector(".title-name"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"[itemprop="description"]"#));
static IMAGE: Lazy<Selector> = Lazy::new(|| selector(r#"[itemprop="image"]"#));
static GENRE: Lazy<Selector> = Lazy::new(|| selector(r#"[itemprop="genre"]"#));
static TRAILER: Lazy<Selector> = Lazy::new(|| selector(".video-promotion > a"));
static INFO_ROW: Lazy<Selector> = Lazy::new(|| selector(".spaceit_pad"));
static RATING_VALUE: Lazy<Selector> = Lazy::new(|| selector(r#"[itemprop="ratingValue"]"#));
static BROADCAST: Lazy<Selector> = Lazy::new(|| selector("a.broadcast-item"));
static CAPTION: Lazy<Selector> = Lazy::new(|| selector(".caption"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));

static SEARCH_ROW: Lazy<Selector> = Lazy::new(|| selector("tr"));
static SEARCH_TITLE: Lazy<Selector> = Lazy::new(|| selector("strong"));
static SEARCH_LINK: Lazy<Selector> = Lazy::new(|| selector(".hoverinfo_trigger"));
static SEARCH_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(".pt4"));
static SEARCH_PAGES: Lazy<Selector> = Lazy::new(|| selector(".normal_header span"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));

/// Map MAL's airing status text.
pub fn status_from_mal(status: &str) -> MediaStatus {
    match status.trim().to_lowercase().as_str() {
        "currently airing" => MediaStatus::Ongoing,
        "finished airing" => MediaStatus::Completed,
        "not yet aired" => MediaStatus::NotYetAired,
        _ => MediaStatus::Unknown,
    }
}

/// Parse an anime page (`/anime/{id}`) into a record without episodes.
pub fn parse_anime_page(id: &str, html: &str) -> AnimeInfo {
    let document = Html::parse_document(html);

    let mut info = AnimeInfo {
        id: id.to_string(),
        title: first_text(&document, &TITLE).unwrap_or_default(),
        description: first_text(&document, &DESCRIPTION),
        ..Default::default()
    };

    info.image = document.select(&IMAGE).next().and_then(|element| {
        let value = element.value();
        ["src", "data-image", "data-src"]
            .into_iter()
            .filter_map(|attr| value.attr(attr))
            .find(|url| !url.is_empty())
            .map(str::to_string)
    });

    info.genres = document
        .select(&GENRE)
        .map(text_of)
        .filter(|genre| !genre.is_empty())
        .collect();

    info.trailer = document.select(&TRAILER).next().and_then(parse_trailer);
    info.streaming_links = document.select(&BROADCAST).filter_map(parse_broadcast).collect();

    for row in document.select(&INFO_ROW) {
        apply_info_row(&mut info, row);
    }

    info
}

/// Fill one field from a "Key: value" information row. Unknown keys are ignored.
fn apply_info_row(info: &mut AnimeInfo, row: ElementRef) {
    let text = collapse_whitespace(&row.text().collect::<String>());
    let Some((key, value)) = text.split_once(':') else {
        return;
    };
    let value = value.trim();

    match key.trim().to_lowercase().as_str() {
        "status" => info.status = status_from_mal(value),
        "episodes" => info.total_episodes = Some(leading_number(value).unwrap_or(0)),
        "premiered" => {
            info.season = value
                .split_whitespace()
                .next()
                .filter(|season| *season != "?")
                .map(str::to_string);
        }
        "aired" => {
            let (start, end) = parse_aired(value);
            info.start_date = start;
            info.end_date = end;
        }
        "score" => {
            // The score label is followed by a footnote marker; prefer the tagged value
            info.rating = row
                .select(&RATING_VALUE)
                .next()
                .and_then(|element| text_of(element).parse().ok())
                .or_else(|| leading_float(value));
        }
        "synonyms" => {
            info.synonyms = value
                .split(',')
                .map(str::trim)
                .filter(|synonym| !synonym.is_empty())
                .map(str::to_string)
                .collect();
        }
        "studios" => {
            info.studios = row
                .select(&ANCHOR)
                .map(text_of)
                .filter(|studio| !studio.is_empty() && studio != "add some")
                .collect();
        }
        "rating" => {
            info.age_rating = Some(value.to_string()).filter(|rating| !rating.is_empty());
        }
        _ => {}
    }
}

/// Split an "Aired" value on the ` to ` token into start and end dates.
pub fn parse_aired(value: &str) -> (Option<FuzzyDate>, Option<FuzzyDate>) {
    match value.split_once(" to ") {
        Some((start, end)) => (parse_fuzzy_date(start), parse_fuzzy_date(end)),
        None => (parse_fuzzy_date(value), None),
    }
}

/// Parse MAL's date forms: "Apr 4, 2021", "Apr 2021" and "2021".
pub fn parse_fuzzy_date(value: &str) -> Option<FuzzyDate> {
    let parts: Vec<&str> = value.split_whitespace().collect();

    match parts.as_slice() {
        [month, day, year] => {
            let month = parse_month(month)?;
            let day: u32 = day.trim_end_matches(',').parse().ok()?;
            let year: i32 = year.parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)?;
            Some(FuzzyDate {
                day: Some(day),
                month: Some(month),
                year: Some(year),
            })
        }
        [month, year] => Some(FuzzyDate {
            day: None,
            month: Some(parse_month(month)?),
            year: Some(year.parse().ok()?),
        }),
        [year] if year.len() == 4 => Some(FuzzyDate {
            day: None,
            month: None,
            year: Some(year.parse().ok()?),
        }),
        _ => None,
    }
}

fn parse_month(value: &str) -> Option<u32> {
    value
        .trim_end_matches(',')
        .parse::<chrono::Month>()
        .ok()
        .map(|month| month.number_from_month())
}

fn parse_trailer(element: ElementRef) -> Option<Trailer> {
    let href = element.value().attr("href")?;
    let id = substring_after(href, "embed/")
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();
    let thumbnail = element
        .value()
        .attr("style")
        .map(|style| substring_before(substring_after(style, "url('"), "'").to_string())
        .unwrap_or_default();

    Some(Trailer {
        id,
        site: TRAILER_SITE.to_string(),
        thumbnail,
    })
}

fn parse_broadcast(element: ElementRef) -> Option<StreamingLink> {
    let url = element.value().attr("href")?.to_string();
    let site = element
        .select(&CAPTION)
        .next()
        .map(text_of)
        .filter(|caption| !caption.is_empty())
        .or_else(|| element.value().attr("title").map(str::to_string))?;

    Some(StreamingLink { site, url })
}

/// Parse a search results page (`anime.php?q=...`).
pub fn parse_search_page(html: &str, page: u32) -> Search<SearchResult> {
    let document = Html::parse_document(html);

    let max_page = document
        .select(&SEARCH_PAGES)
        .next()
        .and_then(|pages| pages.children().filter_map(ElementRef::wrap).last())
        .and_then(|last| text_of(last).parse::<u32>().ok());

    let mut results = Vec::new();
    for row in document.select(&SEARCH_ROW) {
        let title = row.select(&SEARCH_TITLE).next().map(text_of).unwrap_or_default();
        if title.is_empty() {
            continue;
        }

        let id = row
            .select(&SEARCH_LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| href.split("anime/").nth(1))
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();

        let cells: Vec<ElementRef> = row.children().filter_map(ElementRef::wrap).collect();
        let cell_text = |index: usize| cells.get(index).map(|cell| text_of(*cell));

        let mut result = SearchResult::new(id, title);
        result.description = row
            .select(&SEARCH_DESCRIPTION)
            .next()
            .map(|element| text_of(element).replace("...read more.", "..."));
        result.format = cell_text(2).and_then(|kind| MediaFormat::from_mal_type(&kind));
        result.total_episodes = cell_text(3).and_then(|count| count.parse().ok());
        result.rating = cell_text(4)
            .and_then(|score| score.parse::<f64>().ok())
            .map(|score| (score * 10.0).round() as u32);
        result.image = cells
            .first()
            .and_then(|cell| cell.select(&IMG).next())
            .and_then(|img| img.value().attr("data-src"))
            .and_then(|src| src.split("anime/").nth(1))
            .map(|path| format!("{MAL_CDN_IMAGES}{path}"));

        results.push(result);
    }

    Search {
        current_page: page,
        has_next_page: max_page.is_some_and(|max| page < max),
        results,
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty())
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn leading_float(value: &str) -> Option<f64> {
    let number: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.parse().ok()
}

fn substring_after<'a>(text: &'a str, pattern: &str) -> &'a str {
    text.find(pattern)
        .map(|index| &text[index + pattern.len()..])
        .unwrap_or("")
}

fn substring_before<'a>(text: &'a str, pattern: &str) -> &'a str {
    text.find(pattern).map(|index| &text[..index]).unwrap_or("")
}
