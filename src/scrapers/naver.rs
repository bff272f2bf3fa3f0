//! Naver blog scraper.
//!
//! Posts are listed through the blog's RSS feed and fetched from the mobile
//! site (`m.blog.naver.com`), whose markup is simpler than the desktop
//! iframe layout. Two body layouts exist: the SmartEditor ONE container
//! (`div.se-main-container`) and the legacy `div#postViewArea`.

use crate::error::{PostError, PostResult};
use crate::markdown::{atx_headings, normalize_markdown, normalize_ws};
use crate::models::FeedEntry;
use crate::scrapers::FetchText;
use crate::scrapers::rss::parse_feed;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Browser-like agent; the mobile site serves an empty shell to unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0";

const MOBILE_POST_URL: &str = "https://m.blog.naver.com/PostView.naver";

static LOG_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)").unwrap());

static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:title']").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h3.se_textarea").unwrap());
static CATEGORY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.blog_category a").unwrap());
static MAIN_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.se-main-container").unwrap());
static LEGACY_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#postViewArea").unwrap());
static UNWANTED: Lazy<Selector> = Lazy::new(|| Selector::parse("script, style").unwrap());

/// Title, source category and Markdown body of one post page.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    /// Empty when the page had neither an `og:title` nor a heading.
    pub title: String,
    pub category: String,
    pub markdown: String,
}

pub fn rss_url(blog_id: &str) -> String {
    format!("https://rss.blog.naver.com/{}.xml", urlencoding::encode(blog_id))
}

/// Canonical desktop URL, used as the source link in imported posts.
pub fn source_url(blog_id: &str, log_no: &str) -> String {
    format!("https://blog.naver.com/{}/{}", urlencoding::encode(blog_id), log_no)
}

pub fn mobile_post_url(blog_id: &str, log_no: &str) -> PostResult<String> {
    Url::parse_with_params(MOBILE_POST_URL, &[("blogId", blog_id), ("logNo", log_no)])
        .map(String::from)
        .map_err(|e| PostError::Format(format!("bad post URL for {blog_id}/{log_no}: {e}")))
}

/// Numeric post id: the first `/digits` path run of a post link.
pub fn extract_log_no(link: &str) -> Option<&str> {
    LOG_NO
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Parse an RSS `pubDate` and move it into `offset`.
pub fn parse_published(raw: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(offset))
}

/// Pull title, category and body out of a mobile post page.
///
/// # Errors
///
/// [`PostError::Format`] when no body container exists or the body converts
/// to empty Markdown.
pub fn extract_post_page(html: &str, log_no: &str) -> PostResult<PostPage> {
    let mut document = Html::parse_document(html);

    let mut title = document
        .select(&OG_TITLE)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(normalize_ws)
        .unwrap_or_default();
    if title.is_empty() {
        if let Some(h) = document.select(&HEADING).next() {
            title = normalize_ws(&element_text(h));
        }
    }

    let category = document
        .select(&CATEGORY)
        .next()
        .map(|a| normalize_ws(&element_text(a)))
        .unwrap_or_default();

    let container = document
        .select(&MAIN_CONTAINER)
        .next()
        .or_else(|| document.select(&LEGACY_CONTAINER).next())
        .ok_or_else(|| {
            PostError::Format(format!("post body container not found: logNo={log_no}"))
        })?;
    let container_id = container.id();
    let unwanted: Vec<_> = container.select(&UNWANTED).map(|e| e.id()).collect();

    for id in unwanted {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    let body_html = document
        .tree
        .get(container_id)
        .and_then(ElementRef::wrap)
        .map(|c| c.html())
        .unwrap_or_default();

    let markdown = normalize_markdown(&atx_headings(&html2md::parse_html(&body_html)));
    if markdown.is_empty() {
        return Err(PostError::Format(format!("post body is empty: logNo={log_no}")));
    }
    debug!(bytes = markdown.len(), %title, %category, "Extracted post page");

    Ok(PostPage {
        title,
        category,
        markdown,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// List a blog's posts from its RSS feed.
///
/// # Errors
///
/// Fails when the feed cannot be fetched or is not well-formed; there is
/// nothing to import without it.
#[instrument(level = "info", skip(fetcher))]
pub async fn load_entries<F: FetchText>(fetcher: &F, blog_id: &str) -> PostResult<Vec<FeedEntry>> {
    let body = fetcher.fetch_text(&rss_url(blog_id)).await?;
    let feed = parse_feed(&body)?;
    info!(count = feed.entries.len(), "Listed blog posts");
    Ok(feed.entries)
}

/// Fetch and extract one post from the mobile site.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_post_page<F: FetchText>(
    fetcher: &F,
    blog_id: &str,
    log_no: &str,
) -> PostResult<PostPage> {
    let url = mobile_post_url(blog_id, log_no)?;
    let html = fetcher.fetch_text(&url).await?;
    extract_post_page(&html, log_no)
}
