//! The import run: copy a Naver blog's posts into the site.
//!
//! Entries are handled one at a time. A failing entry is logged, counted as
//! skipped, and the run moves on. The post file is written only after
//! fetching, extraction and classification have all succeeded, so a failure
//! never leaves a partial file behind.

use crate::classify::classify;
use crate::config::Settings;
use crate::error::PostResult;
use crate::models::{FeedEntry, NaverPost};
use crate::outputs::post::{FrontMatter, PostKind, post_path, write_post};
use crate::scrapers::FetchText;
use crate::scrapers::naver::{self, fetch_post_page, load_entries, source_url};
use crate::utils::prefix_chars;
use chrono::FixedOffset;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Characters of the body handed to the classifier.
const CLASSIFY_SNIPPET_CHARS: usize = 1500;
const ARCHIVE_CATEGORY: &str = "naver-archive";
const IMPORT_TAG: &str = "naver-import";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub blog_id: String,
    /// Maximum entries to consider; `0` means all.
    pub limit: usize,
    /// Leave posts whose file already exists untouched.
    pub skip_existing: bool,
}

/// Running tally shown at the end of an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Write an imported post with its source link in front matter and body.
#[instrument(level = "info", skip_all, fields(log_no = %post.log_no, link = %post.link))]
pub async fn write_naver_post(
    posts_dir: &Path,
    post: &NaverPost,
    blog_id: &str,
) -> PostResult<PathBuf> {
    let path = post_path(posts_dir, &post.published_at, PostKind::Naver(&post.log_no));
    let source = source_url(blog_id, &post.log_no);
    let meta = FrontMatter {
        title: &post.title,
        date: post.published_at,
        categories: vec![post.category.clone(), ARCHIVE_CATEGORY.to_string()],
        tags: vec![IMPORT_TAG.to_string()],
        extra: vec![("naver_source", source.clone())],
    };
    let body = format!("> 원문: [{source}]({source})\n\n{}", post.markdown);
    write_post(&path, &meta, &body).await?;
    Ok(path)
}

/// Fetch, convert, classify and write a single entry.
async fn import_entry<F: FetchText>(
    fetcher: &F,
    posts_dir: &Path,
    blog_id: &str,
    entry: &FeedEntry,
    log_no: &str,
    published_at: chrono::DateTime<FixedOffset>,
) -> PostResult<(PathBuf, String)> {
    let page = fetch_post_page(fetcher, blog_id, log_no).await?;
    let category = classify(
        &page.title,
        &page.category,
        prefix_chars(&page.markdown, CLASSIFY_SNIPPET_CHARS),
    );
    let title = [page.title.as_str(), entry.title.trim()]
        .into_iter()
        .find(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Naver Post {log_no}"));

    let post = NaverPost {
        log_no: log_no.to_string(),
        title,
        link: entry.link.clone(),
        category: category.to_string(),
        published_at,
        markdown: page.markdown,
    };
    let path = write_naver_post(posts_dir, &post, blog_id).await?;
    Ok((path, post.category))
}

/// Import the blog's posts listed in its RSS feed.
///
/// # Errors
///
/// Only a failure to list the posts (or to create the posts directory) is
/// returned. Per-entry failures are logged and counted as skipped.
#[instrument(level = "info", skip_all, fields(blog_id = %options.blog_id, limit = options.limit))]
pub async fn run_import<F: FetchText>(
    settings: &Settings,
    fetcher: &F,
    options: &ImportOptions,
) -> PostResult<ImportSummary> {
    tokio::fs::create_dir_all(&settings.posts_dir).await?;
    let offset = settings.utc_offset()?;
    let mut entries = load_entries(fetcher, &options.blog_id).await?;
    if options.limit > 0 {
        entries.truncate(options.limit);
    }

    let mut summary = ImportSummary::default();
    for entry in &entries {
        let link = entry.link.trim();
        let Some(log_no) = naver::extract_log_no(link) else {
            warn!(%link, "Skip entry; no logNo in link");
            summary.skipped += 1;
            continue;
        };
        let Some(published_at) = naver::parse_published(&entry.published, &offset) else {
            warn!(%log_no, published = %entry.published, "Skip entry; unparseable publish date");
            summary.skipped += 1;
            continue;
        };

        let expected = post_path(&settings.posts_dir, &published_at, PostKind::Naver(log_no));
        if options.skip_existing && expected.exists() {
            info!(path = %expected.display(), "Skip entry; already imported");
            summary.skipped += 1;
            continue;
        }

        let imported = import_entry(
            fetcher,
            &settings.posts_dir,
            &options.blog_id,
            entry,
            log_no,
            published_at,
        )
        .await;
        match imported {
            Ok((path, category)) => {
                summary.imported += 1;
                info!(path = %path.display(), %category, "Imported post");
            }
            Err(e) => {
                summary.skipped += 1;
                warn!(%log_no, error = %e, "Skip entry; import failed");
            }
        }
    }

    info!(imported = summary.imported, skipped = summary.skipped, "Import done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::naver::tests::SMART_EDITOR_PAGE;
    use crate::scrapers::stub::StubFetcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>me</title>
<item><title>Kafka notes</title><link>https://blog.naver.com/me/101?fromRss=true</link><pubDate>Mon, 02 Mar 2026 10:00:00 +0900</pubDate></item>
<item><title>Broken page</title><link>https://blog.naver.com/me/102?fromRss=true</link><pubDate>Mon, 02 Mar 2026 11:00:00 +0900</pubDate></item>
<item><title>No id</title><link>https://blog.naver.com/me</link><pubDate>Mon, 02 Mar 2026 12:00:00 +0900</pubDate></item>
<item><title>Bad date</title><link>https://blog.naver.com/me/104</link><pubDate>someday</pubDate></item>
</channel></rss>"#;

    fn fixture() -> (tempfile::TempDir, Settings, StubFetcher) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            posts_dir: dir.path().join("_posts"),
            ..Settings::default()
        };
        let fetcher = StubFetcher::default()
            .with("https://rss.blog.naver.com/me.xml", FEED)
            .with(
                "https://m.blog.naver.com/PostView.naver?blogId=me&logNo=101",
                SMART_EDITOR_PAGE,
            )
            .with(
                "https://m.blog.naver.com/PostView.naver?blogId=me&logNo=102",
                "<html><body>no container</body></html>",
            );
        (dir, settings, fetcher)
    }

    fn options(limit: usize, skip_existing: bool) -> ImportOptions {
        ImportOptions {
            blog_id: "me".to_string(),
            limit,
            skip_existing,
        }
    }

    #[tokio::test]
    async fn test_entries_are_isolated() {
        let (_dir, settings, fetcher) = fixture();

        let summary = run_import(&settings, &fetcher, &options(0, true)).await.unwrap();

        assert_eq!(summary, ImportSummary { imported: 1, skipped: 3 });
        let written =
            std::fs::read_to_string(settings.posts_dir.join("2026-03-02-naver-101.md")).unwrap();
        assert!(written.contains("title: \"Kafka consumer groups\"\n"));
        assert!(written.contains("date: 2026-03-02 10:00:00 +0900\n"));
        assert!(
            written.contains("categories: [data-infra, naver-archive]\ntags: [naver-import]\n")
        );
        assert!(written.contains("naver_source: https://blog.naver.com/me/101\n"));
        assert!(written.contains(
            "> 원문: [https://blog.naver.com/me/101](https://blog.naver.com/me/101)\n\n"
        ));
        assert!(!settings.posts_dir.join("2026-03-02-naver-102.md").exists());
    }

    #[tokio::test]
    async fn test_existing_post_is_skipped_without_fetch() {
        let (_dir, settings, fetcher) = fixture();
        std::fs::create_dir_all(&settings.posts_dir).unwrap();
        let existing = settings.posts_dir.join("2026-03-02-naver-101.md");
        std::fs::write(&existing, "kept").unwrap();

        let summary = run_import(&settings, &fetcher, &options(1, true)).await.unwrap();

        assert_eq!(summary, ImportSummary { imported: 0, skipped: 1 });
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "kept");
        assert_eq!(fetcher.requested.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_no_skip_existing_overwrites() {
        let (_dir, settings, fetcher) = fixture();
        std::fs::create_dir_all(&settings.posts_dir).unwrap();
        let existing = settings.posts_dir.join("2026-03-02-naver-101.md");
        std::fs::write(&existing, "stale").unwrap();

        let summary = run_import(&settings, &fetcher, &options(1, false)).await.unwrap();

        assert_eq!(summary.imported, 1);
        assert!(std::fs::read_to_string(&existing).unwrap().starts_with("---\n"));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            posts_dir: dir.path().join("_posts"),
            ..Settings::default()
        };
        let result = run_import(&settings, &StubFetcher::default(), &options(0, true)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rss_title_used_when_page_has_none() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            posts_dir: dir.path().join("_posts"),
            ..Settings::default()
        };
        let feed = r#"<rss><channel><item><title>From RSS</title><link>https://blog.naver.com/me/7</link><pubDate>Mon, 02 Mar 2026 10:00:00 +0900</pubDate></item></channel></rss>"#;
        let fetcher = StubFetcher::default()
            .with("https://rss.blog.naver.com/me.xml", feed)
            .with(
                "https://m.blog.naver.com/PostView.naver?blogId=me&logNo=7",
                r#"<div id="postViewArea"><p>simple words</p></div>"#,
            );

        run_import(&settings, &fetcher, &options(0, true)).await.unwrap();

        let written =
            std::fs::read_to_string(settings.posts_dir.join("2026-03-02-naver-7.md")).unwrap();
        assert!(written.contains("title: \"From RSS\"\n"));
        assert!(written.contains("categories: [java, naver-archive]"));
    }
}
