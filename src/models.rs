//! Data models for feed items, study topics and imported posts.
//!
//! - [`FeedEntry`] / [`ParsedFeed`]: one parsed RSS or Atom document
//! - [`NewsItem`]: a deduplicated news reference fed into the news prompt
//! - [`StudyTopic`]: one entry of the study rotation
//! - [`NaverPost`]: an imported blog post ready to be written
//!
//! Rotation state lives next to its logic in [`crate::rotation`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One `<item>` (RSS 2.0) or `<entry>` (Atom) as read from a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Publication date exactly as the feed spelled it.
    pub published: String,
    /// Seconds since the epoch, `0` when `published` could not be parsed.
    pub timestamp: i64,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Channel (RSS) or feed (Atom) title, if present.
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// A news reference collected for today's news post.
///
/// `url` is the unique key across every feed source.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published: String,
    pub timestamp: i64,
}

/// One study topic of the rotation.
///
/// The order of the configured list is the rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudyTopic {
    /// Filename-safe, unique identifier (`sql-postgresql`).
    pub slug: String,
    /// Human name placed in the prompt (`PostgreSQL SQL`).
    pub prompt_topic: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StudyTopic {
    pub fn new(slug: &str, prompt_topic: &str, category: &str, tags: &[&str]) -> Self {
        Self {
            slug: slug.to_string(),
            prompt_topic: prompt_topic.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The reference rotation: nine topics, cycled in this order.
pub fn default_study_topics() -> Vec<StudyTopic> {
    vec![
        StudyTopic::new("python", "Python", "python", &["python", "backend"]),
        StudyTopic::new("nextjs", "Next.js", "nextjs", &["nextjs", "react", "frontend"]),
        StudyTopic::new("java", "Java", "java", &["java", "spring", "backend"]),
        StudyTopic::new(
            "sql-postgresql",
            "PostgreSQL SQL",
            "sql",
            &["sql", "postgresql", "database"],
        ),
        StudyTopic::new("sql-mysql", "MySQL SQL", "sql", &["sql", "mysql", "database"]),
        StudyTopic::new("sql-oracle", "Oracle SQL", "sql", &["sql", "oracle", "database"]),
        StudyTopic::new("redis", "Redis", "sql", &["redis", "caching", "database"]),
        StudyTopic::new(
            "elasticsearch",
            "Elasticsearch",
            "data-infra",
            &["elasticsearch", "search", "infra"],
        ),
        StudyTopic::new("kafka", "Apache Kafka", "data-infra", &["kafka", "streaming", "infra"]),
    ]
}

/// A Naver blog post scraped and converted, ready for the post writer.
#[derive(Debug, Clone)]
pub struct NaverPost {
    /// Numeric post id taken from the post URL.
    pub log_no: String,
    pub title: String,
    pub link: String,
    /// Site category chosen by [`crate::classify::classify`].
    pub category: String,
    pub published_at: DateTime<FixedOffset>,
    pub markdown: String,
}
