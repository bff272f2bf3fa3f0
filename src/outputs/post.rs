//! Jekyll post files: filenames and front matter.
//!
//! The filename is a pure function of the date, the post kind and a slug or
//! id. Callers check [`Path::exists`] on it before doing any expensive work;
//! that check is the only deduplication there is. [`write_post`] itself
//! overwrites whatever is there.

use crate::error::PostResult;
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// The three kinds of posts this tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind<'a> {
    /// `{date}-ai-news-daily.md`
    News,
    /// `{date}-study-{slug}.md`
    Study(&'a str),
    /// `{date}-naver-{logNo}.md`
    Naver(&'a str),
}

/// Deterministic post filename for `date` (local date, already offset).
pub fn post_filename(date: &DateTime<FixedOffset>, kind: PostKind<'_>) -> String {
    let day = date.format("%Y-%m-%d");
    match kind {
        PostKind::News => format!("{day}-ai-news-daily.md"),
        PostKind::Study(slug) => format!("{day}-study-{slug}.md"),
        PostKind::Naver(log_no) => format!("{day}-naver-{log_no}.md"),
    }
}

pub fn post_path(posts_dir: &Path, date: &DateTime<FixedOffset>, kind: PostKind<'_>) -> PathBuf {
    posts_dir.join(post_filename(date, kind))
}

/// Front matter fields of a post.
#[derive(Debug, Clone)]
pub struct FrontMatter<'a> {
    pub title: &'a str,
    pub date: DateTime<FixedOffset>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Extra `key: value` lines emitted after `tags`, in order.
    pub extra: Vec<(&'a str, String)>,
}

/// Escape a value for a double-quoted YAML scalar.
///
/// Line breaks become spaces so the value stays on its `key:` line.
pub fn quote_yaml(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Render the full file contents: front matter, a blank line, the body.
pub fn render_post(meta: &FrontMatter<'_>, body: &str) -> String {
    let mut out = String::new();
    out.push_str("---\nlayout: post\n");
    let _ = writeln!(out, "title: \"{}\"", quote_yaml(meta.title));
    let _ = writeln!(out, "date: {}", meta.date.format(DATE_FORMAT));
    let _ = writeln!(out, "categories: [{}]", meta.categories.iter().join(", "));
    let _ = writeln!(out, "tags: [{}]", meta.tags.iter().join(", "));
    for (key, value) in &meta.extra {
        let _ = writeln!(out, "{key}: {value}");
    }
    out.push_str("---\n\n");
    out.push_str(body.trim());
    out.push('\n');
    out
}

/// Write a post to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Fails with [`crate::error::PostError::Io`] when the directory or file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_post(path: &Path, meta: &FrontMatter<'_>, body: &str) -> PostResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let contents = render_post(meta, body);
    fs::write(path, &contents).await?;
    info!(bytes = contents.len(), "Wrote post");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst_date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 7, 5, 9)
            .unwrap()
    }

    fn meta(title: &str) -> FrontMatter<'_> {
        FrontMatter {
            title,
            date: kst_date(),
            categories: vec!["ai-daily-news".into()],
            tags: vec!["ai".into(), "news".into(), "automation".into()],
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_filenames() {
        let d = kst_date();
        assert_eq!(post_filename(&d, PostKind::News), "2026-10-19-ai-news-daily.md");
        assert_eq!(
            post_filename(&d, PostKind::Study("sql-mysql")),
            "2026-10-19-study-sql-mysql.md"
        );
        assert_eq!(
            post_filename(&d, PostKind::Naver("223456789")),
            "2026-10-19-naver-223456789.md"
        );
    }

    #[test]
    fn test_render_front_matter() {
        let out = render_post(&meta("Daily AI"), "\n\nBody text\n\n");
        let expected = "---\n\
                        layout: post\n\
                        title: \"Daily AI\"\n\
                        date: 2026-10-19 07:05:09 +0900\n\
                        categories: [ai-daily-news]\n\
                        tags: [ai, news, automation]\n\
                        ---\n\
                        \n\
                        Body text\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_quotes_in_title_stay_valid_yaml() {
        let out = render_post(&meta(r#"The "agent" era"#), "x");
        assert!(out.contains(r#"title: "The \"agent\" era""#));

        let header = out.split("---\n").nth(1).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(header).unwrap();
        assert_eq!(parsed["title"].as_str(), Some(r#"The "agent" era"#));
        assert_eq!(parsed["tags"][2].as_str(), Some("automation"));
    }

    #[test]
    fn test_backslashes_and_line_breaks_in_title_stay_valid_yaml() {
        let title = r#"Regex \d+ basics in C:\tools "quoted""#;
        let out = render_post(&meta(&format!("{title}\nsecond line")), "x");
        assert!(out.contains(r#"title: "Regex \\d+ basics in C:\\tools \"quoted\" second line""#));

        let header = out.split("---\n").nth(1).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(header).unwrap();
        assert_eq!(
            parsed["title"].as_str(),
            Some(r#"Regex \d+ basics in C:\tools "quoted" second line"#)
        );
    }

    #[test]
    fn test_extra_fields_follow_tags() {
        let mut m = meta("Imported");
        m.extra
            .push(("naver_source", "https://blog.naver.com/me/1".to_string()));
        let out = render_post(&m, "body");
        assert!(out.contains(
            "tags: [ai, news, automation]\nnaver_source: https://blog.naver.com/me/1\n---\n\nbody\n"
        ));
    }

    #[tokio::test]
    async fn test_write_post_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = post_path(&dir.path().join("_posts"), &kst_date(), PostKind::News);
        write_post(&path, &meta("T"), "B").await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("---\nlayout: post\n"));
        assert!(written.ends_with("\nB\n"));
    }
}
