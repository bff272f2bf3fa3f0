//! Runtime settings.
//!
//! Settings come from an optional YAML file. Every field has a default, so an
//! absent file (or a file that only sets `posts_dir`) yields the reference
//! configuration: the AI news feeds below and the nine study topics from
//! [`default_study_topics`]. Secrets never live here; they arrive through CLI
//! flags backed by environment variables (see [`crate::cli`]).
//!
//! ```yaml
//! posts_dir: _posts
//! state_file: .automation/state.json
//! utc_offset_hours: 9
//! news:
//!   limit: 8
//!   min_items: 5
//! topics:
//!   - slug: rust
//!     prompt_topic: Rust
//!     category: rust
//!     tags: [rust, systems]
//! ```

use crate::error::{PostError, PostResult};
use crate::models::{StudyTopic, default_study_topics};
use chrono::FixedOffset;
use itertools::Itertools;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const PRIMARY_NEWS_FEEDS: &[&str] = &[
    "https://news.google.com/rss/search?q=artificial+intelligence+when:1d&hl=en-US&gl=US&ceid=US:en",
    "https://techcrunch.com/category/artificial-intelligence/feed/",
];

pub const FALLBACK_NEWS_FEEDS: &[&str] = &[
    "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
    "https://venturebeat.com/category/ai/feed/",
    "https://www.wired.com/feed/tag/ai/latest/rss",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the generated `*.md` posts.
    pub posts_dir: PathBuf,
    /// JSON file holding the study rotation cursor.
    pub state_file: PathBuf,
    /// Offset used for post dates and filenames (Asia/Seoul by default).
    pub utc_offset_hours: i32,
    pub news: NewsSettings,
    pub topics: Vec<StudyTopic>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub primary_feeds: Vec<String>,
    /// Consulted only when the primary feeds yield fewer than `min_items`.
    pub fallback_feeds: Vec<String>,
    /// Maximum number of references put in the news prompt.
    pub limit: usize,
    pub min_items: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            primary_feeds: PRIMARY_NEWS_FEEDS.iter().map(|s| s.to_string()).collect(),
            fallback_feeds: FALLBACK_NEWS_FEEDS.iter().map(|s| s.to_string()).collect(),
            limit: 8,
            min_items: 5,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("_posts"),
            state_file: PathBuf::from(".automation/state.json"),
            utc_offset_hours: 9,
            news: NewsSettings::default(),
            topics: default_study_topics(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`Settings::validate`].
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> PostResult<Self> {
        let settings = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                let s: Settings = serde_yaml::from_str(&raw)?;
                info!(path = %p.display(), topics = s.topics.len(), "Loaded settings file");
                s
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make the rotation or date math meaningless.
    pub fn validate(&self) -> PostResult<()> {
        if self.topics.is_empty() {
            return Err(PostError::Config("at least one study topic is required".into()));
        }
        if let Some(dup) = self.topics.iter().map(|t| t.slug.as_str()).duplicates().next() {
            return Err(PostError::Config(format!("duplicate study topic slug: {dup}")));
        }
        if let Some(bad) = self
            .topics
            .iter()
            .find(|t| t.slug.is_empty() || t.slug.contains(['/', '\\']))
        {
            return Err(PostError::Config(format!(
                "study topic slug is not filename-safe: {:?}",
                bad.slug
            )));
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> PostResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            PostError::Config(format!("invalid utc_offset_hours: {}", self.utc_offset_hours))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let s = Settings::load(None).unwrap();
        assert_eq!(s.posts_dir, PathBuf::from("_posts"));
        assert_eq!(s.topics.len(), 9);
        assert_eq!(s.news.limit, 8);
        assert_eq!(s.news.min_items, 5);
        assert_eq!(s.news.primary_feeds.len(), 2);
        assert_eq!(s.news.fallback_feeds.len(), 3);
        assert_eq!(s.utc_offset().unwrap().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "posts_dir: site/_posts\nnews:\n  limit: 3").unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.posts_dir, PathBuf::from("site/_posts"));
        assert_eq!(s.news.limit, 3);
        assert_eq!(s.news.min_items, 5);
        assert_eq!(s.topics.len(), 9);
    }

    #[test]
    fn test_custom_topics_replace_rotation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "topics:\n  - slug: a\n    prompt_topic: A\n    category: x\n  - slug: b\n    prompt_topic: B\n    category: y\n    tags: [t]"
        )
        .unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.topics.len(), 2);
        assert_eq!(s.topics[1].tags, vec!["t".to_string()]);
    }

    #[test]
    fn test_empty_topics_rejected() {
        let s = Settings {
            topics: Vec::new(),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(PostError::Config(_))));
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let mut s = Settings::default();
        s.topics.push(StudyTopic::new("python", "Python again", "python", &[]));
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("python"));
    }

    #[test]
    fn test_invalid_yaml_is_yaml_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "topics: [unclosed").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(PostError::Yaml(_))
        ));
    }
}
