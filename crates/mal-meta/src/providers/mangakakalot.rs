//! MangaKakalot manga scraper.
//!
//! Titles live either on mangakakalot.com or on its Manganato mirror, which
//! uses a different layout. Chapter ids from the mirror carry
//! [`MANGANATO_MARKER`] so page lookups go back to the right site.

use crate::api::HttpClient;
use crate::error::{MetaError, Result};
use crate::provider::MangaProvider;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use shared::{ChapterPage, MangaChapter, MangaInfo, MangaResult, MediaStatus, Search};
use std::collections::HashMap;
use tracing::debug;

const NAME: &str = "MangaKakalot";

/// Suffix of chapter ids hosted on the Manganato mirror
pub const MANGANATO_MARKER: &str = "$$READMANGANATO";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static SEARCH_ITEM: Lazy<Selector> = Lazy::new(|| selector("div.daily-update > div > div"));
static SEARCH_LINK: Lazy<Selector> = Lazy::new(|| selector("div > h3 > a"));
static SEARCH_IMAGE: Lazy<Selector> = Lazy::new(|| selector("a > img"));
static PAGE_IMAGE: Lazy<Selector> = Lazy::new(|| selector("div.container-chapter-reader > img"));

struct KakalotLayout {
    title: Selector,
    alt_titles: Selector,
    description: Selector,
    image: Selector,
    genres: Selector,
    status: Selector,
    views: Selector,
    authors: Selector,
    chapters: Selector,
    chapter_link: Selector,
    chapter_views: Selector,
    chapter_date: Selector,
}

static KAKALOT: Lazy<KakalotLayout> = Lazy::new(|| KakalotLayout {
    title: selector("div.manga-info-top > ul > li:nth-child(1) > h1"),
    alt_titles: selector("div.manga-info-top > ul > li:nth-child(1) > h2"),
    description: selector("#noidungm"),
    image: selector("div.manga-info-top > div > img"),
    genres: selector("div.manga-info-top > ul > li:nth-child(7) > a"),
    status: selector("div.manga-info-top > ul > li:nth-child(3)"),
    views: selector("div.manga-info-top > ul > li:nth-child(6)"),
    authors: selector("div.manga-info-top > ul > li:nth-child(2) > a"),
    chapters: selector("div.chapter-list > div.row"),
    chapter_link: selector("span > a"),
    chapter_views: selector("span:nth-child(2)"),
    chapter_date: selector("span:nth-child(3)"),
});

static MANGANATO: Lazy<KakalotLayout> = Lazy::new(|| KakalotLayout {
    title: selector("div.panel-story-info > div.story-info-right > h1"),
    alt_titles: selector(
        "div.story-info-right > table > tbody > tr:nth-child(1) > td.table-value > h2",
    ),
    description: selector("#panel-story-info-description"),
    image: selector("div.story-info-left > span.info-image > img"),
    genres: selector(
        "div.story-info-right > table > tbody > tr:nth-child(4) > td.table-value > a",
    ),
    status: selector("div.story-info-right > table > tbody > tr:nth-child(3) > td.table-value"),
    views: selector("div.story-info-right > div > p:nth-child(2) > span.stre-value"),
    authors: selector(
        "div.story-info-right > table > tbody > tr:nth-child(2) > td.table-value > a",
    ),
    chapters: selector("div.container-main-left > div.panel-story-chapter-list > ul > li"),
    chapter_link: selector("a"),
    chapter_views: selector("span.chapter-view.text-nowrap"),
    chapter_date: selector("span.chapter-time.text-nowrap"),
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Kakalot,
    Manganato,
}

impl Site {
    /// Titles hosted on mangakakalot.com have ids like "read-ab123"
    fn for_manga(id: &str) -> Self {
        if id.contains("read") {
            Site::Kakalot
        } else {
            Site::Manganato
        }
    }

    fn layout(self) -> &'static KakalotLayout {
        match self {
            Site::Kakalot => &KAKALOT,
            Site::Manganato => &MANGANATO,
        }
    }
}

/// Client for mangakakalot.com and readmanganato.com
#[derive(Debug, Clone)]
pub struct MangaKakalot {
    http: HttpClient,
    base_url: String,
    manganato_url: String,
}

impl MangaKakalot {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        manganato_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            manganato_url: manganato_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn site_url(&self, site: Site) -> &str {
        match site {
            Site::Kakalot => &self.base_url,
            Site::Manganato => &self.manganato_url,
        }
    }

    fn referer(&self, site: Site) -> HashMap<String, String> {
        HashMap::from([("Referer".to_string(), self.site_url(site).to_string())])
    }

    fn chapter_url(&self, chapter_id: &str) -> (Site, String) {
        match chapter_id.strip_suffix(MANGANATO_MARKER) {
            Some(path) => (Site::Manganato, format!("{}/{}", self.manganato_url, path)),
            None => (Site::Kakalot, format!("{}/chapter/{}", self.base_url, chapter_id)),
        }
    }

    fn parse_search(&self, html: &str) -> Vec<MangaResult> {
        let document = Html::parse_document(html);

        document
            .select(&SEARCH_ITEM)
            .filter_map(|item| {
                let link = item.select(&SEARCH_LINK).next()?;
                let id = link.value().attr("href")?.split('/').nth(3)?.to_string();
                Some(MangaResult {
                    id,
                    title: text_of(link),
                    image: item
                        .select(&SEARCH_IMAGE)
                        .next()
                        .and_then(|img| img.value().attr("src"))
                        .map(str::to_string),
                    header_for_image: self.referer(Site::Kakalot),
                })
            })
            .collect()
    }

    fn parse_info(&self, id: &str, site: Site, html: &str) -> MangaInfo {
        let document = Html::parse_document(html);
        let layout = site.layout();
        let first = |selector: &Selector| document.select(selector).next().map(text_of);
        let all = |selector: &Selector| -> Vec<String> {
            document.select(selector).map(text_of).collect()
        };

        let title = first(&layout.title).unwrap_or_default();

        let alt_titles: Vec<String> = first(&layout.alt_titles)
            .map(|alt| {
                alt.replace("Alternative :", "")
                    .split(';')
                    .map(str::trim)
                    .filter(|alt| !alt.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let summary_prefix = match site {
            Site::Kakalot => format!("{title} summary:"),
            Site::Manganato => "Description :".to_string(),
        };
        let description = first(&layout.description)
            .map(|desc| desc.replace(&summary_prefix, "").replace('\n', "").trim().to_string())
            .filter(|desc| !desc.is_empty());

        let status = match first(&layout.status)
            .unwrap_or_default()
            .replace("Status :", "")
            .trim()
        {
            "Completed" => MediaStatus::Completed,
            "Ongoing" => MediaStatus::Ongoing,
            _ => MediaStatus::Unknown,
        };

        let views = first(&layout.views).and_then(|views| parse_count(&views.replace("View :", "")));

        let chapters = document
            .select(&layout.chapters)
            .filter_map(|row| self.parse_chapter(site, row))
            .collect();

        MangaInfo {
            id: id.to_string(),
            title,
            alt_titles,
            description,
            image: document
                .select(&layout.image)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::to_string),
            header_for_image: self.referer(site),
            genres: all(&layout.genres),
            status,
            views,
            authors: all(&layout.authors),
            chapters,
        }
    }

    fn parse_chapter(&self, site: Site, row: ElementRef) -> Option<MangaChapter> {
        let layout = site.layout();
        let link = row.select(&layout.chapter_link).next()?;
        let href = link.value().attr("href")?;

        let id = match site {
            Site::Kakalot => href.split("chapter/").nth(1)?.to_string(),
            Site::Manganato => format!("{}{}", href.split(".com/").nth(1)?, MANGANATO_MARKER),
        };

        Some(MangaChapter {
            id,
            title: text_of(link),
            views: row
                .select(&layout.chapter_views)
                .next()
                .and_then(|views| parse_count(&text_of(views))),
            release_date: row
                .select(&layout.chapter_date)
                .next()
                .and_then(|date| date.value().attr("title"))
                .map(str::to_string),
        })
    }

    fn parse_pages(&self, site: Site, html: &str) -> Vec<ChapterPage> {
        let document = Html::parse_document(html);

        document
            .select(&PAGE_IMAGE)
            .enumerate()
            .filter_map(|(index, img)| {
                let src = img.value().attr("src")?;
                Some(ChapterPage {
                    page: index as u32,
                    img: src.to_string(),
                    title: img.value().attr("alt").map(|alt| {
                        alt.replace("- Mangakakalot.com", " ")
                            .replace("- MangaNato.com", " ")
                            .trim()
                            .to_string()
                    }),
                    header_for_image: self.referer(site),
                })
            })
            .collect()
    }
}

#[async_trait]
impl MangaProvider for MangaKakalot {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str) -> Result<Search<MangaResult>> {
        let url = format!("{}/search/story/{}", self.base_url, query.replace(' ', "_"));
        let html = self.http.get_text(&url).await?;

        let results = self.parse_search(&html);
        debug!(provider = NAME, query = %query, count = results.len(), "Manga search complete");
        Ok(Search::single(results))
    }

    async fn fetch_manga_info(&self, id: &str) -> Result<MangaInfo> {
        let site = Site::for_manga(id);
        let url = format!("{}/{}", self.site_url(site), id);
        let html = self.http.get_text(&url).await?;

        let info = self.parse_info(id, site, &html);
        if info.title.is_empty() {
            return Err(MetaError::Parse {
                what: "manga page",
                reason: format!("no title found for {id}"),
            });
        }
        debug!(provider = NAME, id = %id, chapters = info.chapters.len(), "Fetched manga info");
        Ok(info)
    }

    async fn fetch_chapter_pages(&self, chapter_id: &str) -> Result<Vec<ChapterPage>> {
        let (site, url) = self.chapter_url(chapter_id);
        let html = self.http.get_text(&url).await?;

        let pages = self.parse_pages(site, &html);
        debug!(provider = NAME, chapter_id = %chapter_id, pages = pages.len(), "Fetched chapter pages");
        Ok(pages)
    }
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_count(text: &str) -> Option<u64> {
    text.replace(',', "").trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider() -> MangaKakalot {
        let http = HttpClient::new("mal-meta-test/0.1.0", Duration::from_secs(5)).unwrap();
        MangaKakalot::new(http, "https://mangakakalot.com", "https://readmanganato.com/")
    }

    const SEARCH_PAGE: &str = r#"
<html><body>
<div class="panel_story_list">
<div class="daily-update">
  <div class="panel_story_list">
    <div class="story_item">
      <a href="https://mangakakalot.com/read-ox3yk158504833790"><img src="https://avt.mkklcdnv6temp.com/9/t/18-1583497987.jpg" alt="Kaguya"></a>
      <div class="story_item_right">
        <h3 class="story_name"><a href="https://mangakakalot.com/read-ox3yk158504833790">Kaguya-sama: Love is War</a></h3>
      </div>
    </div>
    <div class="story_item">
      <a href="https://readmanganato.com/manga-ax951880"><img src="https://avt.mkklcdnv6temp.com/3/h/1-1583464472.jpg"></a>
      <div class="story_item_right">
        <h3 class="story_name"><a href="https://readmanganato.com/manga-ax951880">Kaguya-sama: Doodle</a></h3>
      </div>
    </div>
  </div>
</div>
</div>
</body></html>
"#;

    const KAKALOT_INFO: &str = r#"
<html><body>
<div class="manga-info-top">
  <div class="manga-info-pic"><img src="https://avt.mkklcdnv6temp.com/9/t/18-1583497987.jpg"></div>
  <ul class="manga-info-text">
    <li><h1>Kaguya-sama: Love is War</h1><h2 class="story-alternative">Alternative : Kaguya-sama wa Kokurasetai; かぐや様は告らせたい</h2></li>
    <li>Author(s) : <a href="/search/author/Akasaka">Akasaka Aka</a></li>
    <li>Status : Completed</li>
    <li>Last updated : Nov-04-2022</li>
    <li>TransGroup : </li>
    <li>View : 12,345,678</li>
    <li>Genres : <a href="/genre-2">Comedy</a>, <a href="/genre-27">Romance</a></li>
  </ul>
</div>
<div id="noidungm"><h2>Kaguya-sama: Love is War summary:</h2>
Two geniuses at war.</div>
<div class="chapter-list">
  <div class="row">
    <span><a href="https://mangakakalot.com/chapter/ox3yk158504833790/chapter_281">Chapter 281</a></span>
    <span>1,234</span>
    <span title="Nov-04-2022 10:00">Nov-04-22</span>
  </div>
  <div class="row">
    <span><a href="https://mangakakalot.com/chapter/ox3yk158504833790/chapter_280">Chapter 280</a></span>
    <span>2,000</span>
    <span title="Oct-27-2022 10:00">Oct-27-22</span>
  </div>
</div>
</body></html>
"#;

    const MANGANATO_INFO: &str = r##"
<html><body>
<div class="container-main-left">
  <div class="panel-story-info">
    <div class="story-info-left"><span class="info-image"><img src="https://avt.mkklcdnv6temp.com/3/h/1-1583464472.jpg"></span></div>
    <div class="story-info-right">
      <h1>Kaguya-sama: Doodle</h1>
      <table class="variations-tableInfo">
        <tr><td class="table-label">Alternative :</td><td class="table-value"><h2>Doodle; 落書き</h2></td></tr>
        <tr><td class="table-label">Author(s) :</td><td class="table-value"><a href="#">Akasaka Aka</a></td></tr>
        <tr><td class="table-label">Status :</td><td class="table-value">Ongoing</td></tr>
        <tr><td class="table-label">Genres :</td><td class="table-value"><a href="#">Comedy</a></td></tr>
      </table>
      <div class="story-info-right-extent">
        <p><span class="stre-label">Updated :</span><span class="stre-value">Nov 04,2022</span></p>
        <p><span class="stre-label">View :</span><span class="stre-value">98,765</span></p>
      </div>
    </div>
  </div>
  <div class="panel-story-info-description" id="panel-story-info-description">Description :
Short gag strips.</div>
  <div class="panel-story-chapter-list">
    <ul class="row-content-chapter">
      <li class="a-h"><a class="chapter-name text-nowrap" href="https://readmanganato.com/manga-ax951880/chapter-12">Chapter 12</a><span class="chapter-view text-nowrap">4,321</span><span class="chapter-time text-nowrap" title="Nov 04,2022 10:00">Nov 04,22</span></li>
    </ul>
  </div>
</div>
</body></html>
"##;

    const CHAPTER_PAGE: &str = r#"
<html><body>
<div class="container-chapter-reader">
  <img src="https://v1.mkklcdnv6tempv5.com/img/1.jpg" alt="Kaguya-sama Chapter 281 page 1 - Mangakakalot.com">
  <img src="https://v1.mkklcdnv6tempv5.com/img/2.jpg" alt="Kaguya-sama Chapter 281 page 2 - MangaNato.com">
  <img alt="broken">
</div>
</body></html>
"#;

    #[test]
    fn test_site_from_id() {
        assert_eq!(Site::for_manga("read-ox3yk158504833790"), Site::Kakalot);
        assert_eq!(Site::for_manga("manga-ax951880"), Site::Manganato);
    }

    #[test]
    fn test_chapter_url() {
        let provider = provider();
        assert_eq!(
            provider.chapter_url("ox3yk158504833790/chapter_281"),
            (
                Site::Kakalot,
                "https://mangakakalot.com/chapter/ox3yk158504833790/chapter_281".to_string()
            )
        );
        assert_eq!(
            provider.chapter_url("manga-ax951880/chapter-12$$READMANGANATO"),
            (
                Site::Manganato,
                "https://readmanganato.com/manga-ax951880/chapter-12".to_string()
            )
        );
    }

    #[test]
    fn test_parse_search() {
        let results = provider().parse_search(SEARCH_PAGE);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "read-ox3yk158504833790");
        assert_eq!(results[0].title, "Kaguya-sama: Love is War");
        assert_eq!(
            results[0].image.as_deref(),
            Some("https://avt.mkklcdnv6temp.com/9/t/18-1583497987.jpg")
        );
        assert_eq!(results[1].id, "manga-ax951880");
        assert_eq!(
            results[0].header_for_image.get("Referer").map(String::as_str),
            Some("https://mangakakalot.com")
        );
    }

    #[test]
    fn test_parse_kakalot_info() {
        let info = provider().parse_info("read-ox3yk158504833790", Site::Kakalot, KAKALOT_INFO);

        assert_eq!(info.title, "Kaguya-sama: Love is War");
        assert_eq!(info.alt_titles, vec!["Kaguya-sama wa Kokurasetai", "かぐや様は告らせたい"]);
        assert_eq!(info.description.as_deref(), Some("Two geniuses at war."));
        assert_eq!(info.status, MediaStatus::Completed);
        assert_eq!(info.views, Some(12_345_678));
        assert_eq!(info.authors, vec!["Akasaka Aka"]);
        assert_eq!(info.genres, vec!["Comedy", "Romance"]);

        assert_eq!(info.chapters.len(), 2);
        assert_eq!(info.chapters[0].id, "ox3yk158504833790/chapter_281");
        assert_eq!(info.chapters[0].views, Some(1234));
        assert_eq!(info.chapters[0].release_date.as_deref(), Some("Nov-04-2022 10:00"));
    }

    #[test]
    fn test_parse_manganato_info() {
        let info = provider().parse_info("manga-ax951880", Site::Manganato, MANGANATO_INFO);

        assert_eq!(info.title, "Kaguya-sama: Doodle");
        assert_eq!(info.alt_titles, vec!["Doodle", "落書き"]);
        assert_eq!(info.description.as_deref(), Some("Short gag strips."));
        assert_eq!(info.status, MediaStatus::Ongoing);
        assert_eq!(info.views, Some(98_765));
        assert_eq!(info.genres, vec!["Comedy"]);

        assert_eq!(info.chapters.len(), 1);
        assert_eq!(info.chapters[0].id, "manga-ax951880/chapter-12$$READMANGANATO");
        assert_eq!(info.chapters[0].views, Some(4321));
        assert_eq!(
            info.header_for_image.get("Referer").map(String::as_str),
            Some("https://readmanganato.com")
        );
    }

    #[test]
    fn test_parse_pages() {
        let pages = provider().parse_pages(Site::Kakalot, CHAPTER_PAGE);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 0);
        assert_eq!(pages[0].title.as_deref(), Some("Kaguya-sama Chapter 281 page 1"));
        assert_eq!(pages[1].title.as_deref(), Some("Kaguya-sama Chapter 281 page 2"));
        assert_eq!(pages[1].img, "https://v1.mkklcdnv6tempv5.com/img/2.jpg");
    }
}
