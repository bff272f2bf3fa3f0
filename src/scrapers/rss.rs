//! RSS 2.0 and Atom feeds, and the news collector built on them.
//!
//! # Collection rules
//!
//! - sources are fetched one after another; a failing source is logged and skipped
//! - entries without a link or title are dropped
//! - URLs are unique across every source, first occurrence wins
//! - the fallback list is only consulted when the primary list came up short
//! - newest first, undated entries (timestamp 0) last, then truncate

use crate::error::{PostError, PostResult};
use crate::models::{FeedEntry, NewsItem, ParsedFeed};
use crate::scrapers::FetchText;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, instrument, warn};

const UNKNOWN_SOURCE: &str = "Unknown source";

/// Parse an RFC 2822 (RSS) or RFC 3339 (Atom) date into epoch seconds.
///
/// Anything else maps to `0`, which sorts after every dated entry.
pub fn parse_timestamp(raw: &str) -> i64 {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

/// Text-bearing elements we read, by their qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Published,
    DcDate,
    Updated,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"published" => Some(Field::Published),
            b"dc:date" => Some(Field::DcDate),
            b"updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: String,
    link: String,
    link_is_alternate: bool,
    pub_date: String,
    published: String,
    dc_date: String,
    updated: String,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Link => {
                if self.link.is_empty() {
                    self.link = value;
                }
            }
            Field::PubDate => self.pub_date = value,
            Field::Published => self.published = value,
            Field::DcDate => self.dc_date = value,
            Field::Updated => self.updated = value,
        }
    }

    /// Atom `<link href=".." rel=".."/>`: keep the alternate link, else the first.
    fn offer_href(&mut self, start: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in start.attributes().flatten() {
            let value = decode_text(&attr.value);
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        let Some(href) = href else { return };
        let alternate = rel.as_deref().is_none_or(|r| r == "alternate");
        if self.link.is_empty() || (alternate && !self.link_is_alternate) {
            self.link = href;
            self.link_is_alternate = alternate;
        }
    }

    fn build(self) -> FeedEntry {
        let published = [self.pub_date, self.published, self.dc_date, self.updated]
            .into_iter()
            .find(|d| !d.is_empty())
            .unwrap_or_default();
        FeedEntry {
            timestamp: parse_timestamp(&published),
            title: self.title,
            link: self.link,
            published,
        }
    }
}

fn decode_text(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&s) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => s.into_owned(),
    }
}

/// Resolve a general entity reference (`amp`, `#39`, `#x2019`).
fn resolve_entity(name: &str) -> String {
    let resolved = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32).map(String::from)
    } else {
        match name {
            "amp" => Some("&".to_string()),
            "lt" => Some("<".to_string()),
            "gt" => Some(">".to_string()),
            "quot" => Some("\"".to_string()),
            "apos" => Some("'".to_string()),
            _ => None,
        }
    };
    resolved.unwrap_or_else(|| format!("&{name};"))
}

/// Parse an RSS 2.0 or Atom document.
///
/// # Errors
///
/// Returns [`PostError::Xml`] when the document is not well-formed XML.
pub fn parse_feed(xml: &str) -> PostResult<ParsedFeed> {
    let mut reader = Reader::from_str(xml);
    let mut feed = ParsedFeed::default();
    let mut entry: Option<EntryBuilder> = None;
    // Field currently collecting text, with its accumulated content.
    let mut capture: Option<(Field, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    entry = Some(EntryBuilder::default());
                    capture = None;
                }
                name => {
                    let field = Field::from_name(name);
                    match (&mut entry, field) {
                        (Some(b), Some(Field::Link)) => {
                            b.offer_href(&e);
                            capture = Some((Field::Link, String::new()));
                        }
                        (Some(_), Some(f)) => capture = Some((f, String::new())),
                        (None, Some(Field::Title)) if feed.title.is_none() => {
                            capture = Some((Field::Title, String::new()));
                        }
                        _ => {}
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if let (Some(b), b"link") = (&mut entry, e.name().as_ref()) {
                    b.offer_href(&e);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, buf)) = &mut capture {
                    buf.push_str(&decode_text(&t));
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, buf)) = &mut capture {
                    buf.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some((_, buf)) = &mut capture {
                    buf.push_str(&resolve_entity(&String::from_utf8_lossy(&r)));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(b) = entry.take() {
                        feed.entries.push(b.build());
                    }
                    capture = None;
                }
                name => {
                    let ended = Field::from_name(name);
                    if let Some((field, buf)) = capture.take_if(|(f, _)| Some(*f) == ended) {
                        let value = buf.trim().to_string();
                        match &mut entry {
                            Some(b) if !value.is_empty() => b.set(field, value),
                            Some(_) => {}
                            None => feed.title = Some(value).filter(|v| !v.is_empty()),
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PostError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(feed)
}

/// Fetch and parse one feed.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_feed<F: FetchText>(fetcher: &F, url: &str) -> PostResult<ParsedFeed> {
    let body = fetcher.fetch_text(url).await?;
    let feed = parse_feed(&body)?;
    info!(count = feed.entries.len(), "Parsed feed");
    Ok(feed)
}

/// Turn a parsed feed into news items, dropping entries without link or title.
fn news_items(feed: ParsedFeed) -> Vec<NewsItem> {
    let source = feed.title.unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
    feed.entries
        .into_iter()
        .filter(|e| !e.link.is_empty() && !e.title.is_empty())
        .map(|e| NewsItem {
            title: e.title,
            url: e.link,
            source: source.clone(),
            published: e.published,
            timestamp: e.timestamp,
        })
        .collect()
}

/// Fetch every feed in order. Failed feeds are logged and contribute nothing.
#[instrument(level = "info", skip_all, fields(feeds = urls.len()))]
pub async fn collect_from_feeds<F: FetchText>(fetcher: &F, urls: &[String]) -> Vec<NewsItem> {
    let per_feed: Vec<Vec<NewsItem>> = stream::iter(urls)
        .then(|url| async move {
            match fetch_feed(fetcher, url).await {
                Ok(feed) => news_items(feed),
                Err(e) => {
                    warn!(%url, error = %e, "Feed unavailable; skipping");
                    Vec::new()
                }
            }
        })
        .collect()
        .await;
    per_feed.into_iter().flatten().collect()
}

/// Collect today's news references.
///
/// Falls back to `fallback` when `primary` yields fewer than `min_items`
/// unique items. The result is sorted newest first and holds at most `limit`
/// items.
#[instrument(level = "info", skip_all, fields(limit = limit, min_items = min_items))]
pub async fn fetch_news_items<F: FetchText>(
    fetcher: &F,
    primary: &[String],
    fallback: &[String],
    limit: usize,
    min_items: usize,
) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = collect_from_feeds(fetcher, primary)
        .await
        .into_iter()
        .unique_by(|item| item.url.clone())
        .collect();

    if items.len() < min_items {
        info!(
            count = items.len(),
            min_items, "Primary news items are low; loading fallback feeds"
        );
        let extra = collect_from_feeds(fetcher, fallback).await;
        items = items
            .into_iter()
            .chain(extra)
            .unique_by(|item| item.url.clone())
            .collect();
    }

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(limit);
    debug!(urls = ?items.iter().map(|i| &i.url).collect::<Vec<_>>(), "Selected news items");
    info!(count = items.len(), "Collected news items");
    items
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scrapers::stub::StubFetcher;

    /// Build an RSS 2.0 document with `(title, link, pubDate)` items.
    pub(crate) fn rss(channel: &str, items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(t, l, d)| {
                format!("<item><title>{t}</title><link>{l}</link><pubDate>{d}</pubDate></item>")
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{channel}</title>{body}</channel></rss>"#
        )
    }

    const ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">The Verge -  AI</title>
  <link rel="self" href="https://www.theverge.com/rss/index.xml"/>
  <entry>
    <title type="html"><![CDATA[Models & agents]]></title>
    <link rel="self" href="https://www.theverge.com/self/1"/>
    <link rel="alternate" type="text/html" href="https://www.theverge.com/ai/1"/>
    <published>2026-10-18T09:00:00-04:00</published>
    <updated>2026-10-18T10:00:00-04:00</updated>
  </entry>
  <entry>
    <title>No date</title>
    <link href="https://www.theverge.com/ai/2"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items_and_channel_title() {
        let xml = rss(
            "TechCrunch",
            &[
                ("A", "https://t.co/a", "Sun, 18 Oct 2026 10:00:00 GMT"),
                ("B", "https://t.co/b", "Sun, 18 Oct 2026 11:00:00 +0000"),
            ],
        );
        let feed = parse_feed(&xml).unwrap();
        assert_eq!(feed.title.as_deref(), Some("TechCrunch"));
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[1].link, "https://t.co/b");
        assert_eq!(feed.entries[1].timestamp - feed.entries[0].timestamp, 3600);
    }

    #[test]
    fn test_parse_atom_prefers_alternate_link() {
        let feed = parse_feed(ATOM).unwrap();
        assert_eq!(feed.title.as_deref(), Some("The Verge -  AI"));
        assert_eq!(feed.entries[0].title, "Models & agents");
        assert_eq!(feed.entries[0].link, "https://www.theverge.com/ai/1");
        assert_eq!(feed.entries[0].published, "2026-10-18T09:00:00-04:00");
        assert!(feed.entries[0].timestamp > 0);
        assert_eq!(feed.entries[1].link, "https://www.theverge.com/ai/2");
        assert_eq!(feed.entries[1].timestamp, 0);
    }

    #[test]
    fn test_entities_are_decoded() {
        let xml = rss("S", &[("AT&amp;T &#39;bets&#39; on AI", "https://x/1", "")]);
        let feed = parse_feed(&xml).unwrap();
        assert_eq!(feed.entries[0].title, "AT&T 'bets' on AI");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = parse_feed("<rss><channel><item><title>x</link></item>");
        assert!(matches!(result, Err(PostError::Xml(_))));
    }

    #[test]
    fn test_parse_timestamp_fallbacks() {
        assert_eq!(parse_timestamp("Thu, 01 Jan 1970 00:01:00 GMT"), 60);
        assert_eq!(parse_timestamp("1970-01-01T00:02:00Z"), 120);
        assert_eq!(parse_timestamp("yesterday"), 0);
        assert_eq!(parse_timestamp(""), 0);
    }

    #[tokio::test]
    async fn test_fallback_consulted_when_primary_is_short() {
        let primary = vec!["https://p/1".to_string(), "https://p/2".to_string()];
        let fallback = vec!["https://f/1".to_string()];
        let fetcher = StubFetcher::default()
            .with(
                "https://p/1",
                &rss(
                    "P1",
                    &[
                        ("one", "https://n/1", "Sun, 18 Oct 2026 01:00:00 GMT"),
                        ("two", "https://n/2", "Sun, 18 Oct 2026 02:00:00 GMT"),
                    ],
                ),
            )
            .with(
                "https://p/2",
                &rss(
                    "P2",
                    &[
                        // duplicate of a P1 item: first occurrence wins
                        ("dup", "https://n/1", "Sun, 18 Oct 2026 09:00:00 GMT"),
                        ("three", "https://n/3", "Sun, 18 Oct 2026 03:00:00 GMT"),
                    ],
                ),
            )
            .with(
                "https://f/1",
                &rss(
                    "F1",
                    &[
                        ("four", "https://n/4", "Sun, 18 Oct 2026 04:00:00 GMT"),
                        ("undated", "https://n/5", "not a date"),
                        ("again", "https://n/3", "Sun, 18 Oct 2026 05:00:00 GMT"),
                    ],
                ),
            );

        let items = fetch_news_items(&fetcher, &primary, &fallback, 4, 5).await;

        assert!(fetcher.requested.borrow().contains(&"https://f/1".to_string()));
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["four", "three", "two", "one"]);
        assert_eq!(items[0].source, "F1");
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_primary_suffices() {
        let primary = vec!["https://p/1".to_string()];
        let fallback = vec!["https://f/1".to_string()];
        let fetcher = StubFetcher::default().with(
            "https://p/1",
            &rss(
                "P1",
                &[
                    ("a", "https://n/a", ""),
                    ("b", "https://n/b", ""),
                    ("c", "https://n/c", ""),
                ],
            ),
        );

        let items = fetch_news_items(&fetcher, &primary, &fallback, 8, 3).await;
        assert_eq!(items.len(), 3);
        assert_eq!(*fetcher.requested.borrow(), vec!["https://p/1".to_string()]);
        // Undated entries keep feed order (stable sort).
        assert_eq!(items[0].title, "a");
    }

    #[tokio::test]
    async fn test_failed_feed_is_skipped() {
        let primary = vec!["https://down".to_string(), "https://p/1".to_string()];
        let fetcher = StubFetcher::default()
            .with("https://p/1", &rss("P1", &[("a", "https://n/a", "")]));
        let items = collect_from_feeds(&fetcher, &primary).await;
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_entries_without_link_are_dropped() {
        let feed = ParsedFeed {
            title: None,
            entries: vec![
                FeedEntry {
                    title: "x".into(),
                    ..FeedEntry::default()
                },
                FeedEntry {
                    title: "y".into(),
                    link: "https://n/y".into(),
                    ..FeedEntry::default()
                },
            ],
        };
        let items = news_items(feed);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Unknown source");
    }
}
