//! The daily run: one AI news post and one study post.
//!
//! The two paths are independent. An error in one is logged and recorded in
//! the [`DailyReport`], and the other still runs. Each path checks for its
//! output file before doing any network work, so re-running on the same day
//! is a no-op for whatever already exists.

use crate::api::{AskAsync, parse_structured_response};
use crate::config::Settings;
use crate::error::PostResult;
use crate::outputs::post::{FrontMatter, PostKind, post_path, write_post};
use crate::prompts::{
    NEWS_SYSTEM_PROMPT, STUDY_SYSTEM_PROMPT, build_news_prompt, build_study_prompt,
};
use crate::rotation::{RotationState, TopicRotator};
use crate::scrapers::FetchText;
use crate::scrapers::rss::fetch_news_items;
use crate::utils::truncate_for_log;
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use tracing::{debug, error, info, instrument};

const NEWS_CATEGORY: &str = "ai-daily-news";
const NEWS_TAGS: &[&str] = &["ai", "news", "automation"];

/// Outcome of one daily run.
#[derive(Debug, Default)]
pub struct DailyReport {
    pub created_news: bool,
    pub created_study: bool,
    /// `"news: ..."` / `"study: ..."` messages for failed paths.
    pub errors: Vec<String>,
}

impl DailyReport {
    pub fn created_any(&self) -> bool {
        self.created_news || self.created_study
    }

    /// Nothing was produced and at least one path failed.
    ///
    /// Both posts already existing is not a failure.
    pub fn is_failure(&self) -> bool {
        !self.created_any() && !self.errors.is_empty()
    }
}

/// Generate and write today's news post.
///
/// Returns `Ok(false)` when the post already exists or no feed items were
/// found.
#[instrument(level = "info", skip_all)]
pub async fn create_news_post<F: FetchText, G: AskAsync>(
    settings: &Settings,
    fetcher: &F,
    generator: &G,
    now: &DateTime<FixedOffset>,
) -> PostResult<bool> {
    let path = post_path(&settings.posts_dir, now, PostKind::News);
    if path.exists() {
        info!(path = %path.display(), "Skip news post; already exists");
        return Ok(false);
    }

    let news = &settings.news;
    let items = fetch_news_items(
        fetcher,
        &news.primary_feeds,
        &news.fallback_feeds,
        news.limit,
        news.min_items,
    )
    .await;
    if items.is_empty() {
        info!("No RSS items found; skip news post");
        return Ok(false);
    }

    let today = now.format("%Y-%m-%d").to_string();
    let answer = generator
        .ask(NEWS_SYSTEM_PROMPT, &build_news_prompt(&items, &today))
        .await?;
    debug!(response_preview = %truncate_for_log(&answer, 300), "News model answer");
    let (title, content) = parse_structured_response(&answer)?;

    let meta = FrontMatter {
        title: &title,
        date: *now,
        categories: vec![NEWS_CATEGORY.to_string()],
        tags: NEWS_TAGS.iter().map(|t| t.to_string()).collect(),
        extra: Vec::new(),
    };
    write_post(&path, &meta, &content).await?;
    info!(path = %path.display(), %title, "Created news post");
    Ok(true)
}

/// Generate and write the study post for the rotator's current topic.
///
/// The rotator advances only after the file has been written.
#[instrument(level = "info", skip_all, fields(topic = %rotator.current().slug))]
pub async fn create_study_post<G: AskAsync>(
    settings: &Settings,
    generator: &G,
    now: &DateTime<FixedOffset>,
    rotator: &mut TopicRotator<'_>,
) -> PostResult<bool> {
    let topic = rotator.current();
    let path = post_path(&settings.posts_dir, now, PostKind::Study(&topic.slug));
    if path.exists() {
        info!(path = %path.display(), "Skip study post; already exists");
        return Ok(false);
    }

    let today = now.format("%Y-%m-%d").to_string();
    let answer = generator
        .ask(STUDY_SYSTEM_PROMPT, &build_study_prompt(topic, &today))
        .await?;
    debug!(response_preview = %truncate_for_log(&answer, 300), "Study model answer");
    let (title, content) = parse_structured_response(&answer)?;

    let tags = std::iter::once("study".to_string())
        .chain(topic.tags.iter().cloned())
        .chain(std::iter::once("automation".to_string()))
        .collect();
    let meta = FrontMatter {
        title: &title,
        date: *now,
        categories: vec![topic.category.clone()],
        tags,
        extra: Vec::new(),
    };
    write_post(&path, &meta, &content).await?;
    rotator.advance();
    info!(path = %path.display(), %title, next_index = rotator.index(), "Created study post");
    Ok(true)
}

/// Run both paths and persist the rotation if a study post was created.
///
/// # Errors
///
/// Only failures around the run itself (creating the posts directory, an
/// empty topic list, saving the rotation state) are returned; path failures
/// land in [`DailyReport::errors`].
#[instrument(level = "info", skip_all, fields(posts_dir = %settings.posts_dir.display()))]
pub async fn run_daily<F: FetchText, G: AskAsync>(
    settings: &Settings,
    fetcher: &F,
    generator: &G,
    state_file: &Path,
    now: DateTime<FixedOffset>,
) -> PostResult<DailyReport> {
    tokio::fs::create_dir_all(&settings.posts_dir).await?;
    let state = RotationState::load(state_file).await;
    let mut rotator = TopicRotator::new(&settings.topics, state)?;
    let mut report = DailyReport::default();

    match create_news_post(settings, fetcher, generator, &now).await {
        Ok(created) => report.created_news = created,
        Err(e) => {
            error!(error = %e, network = e.is_network(), "News post failed");
            report.errors.push(format!("news: {e}"));
        }
    }

    match create_study_post(settings, generator, &now, &mut rotator).await {
        Ok(created) => report.created_study = created,
        Err(e) => {
            error!(error = %e, network = e.is_network(), "Study post failed");
            report.errors.push(format!("study: {e}"));
        }
    }

    if report.created_study {
        rotator.state().save(state_file).await?;
    }

    for err in &report.errors {
        error!(%err, "Generation error");
    }
    if report.created_any() {
        info!(
            news = report.created_news,
            study = report.created_study,
            "Post generation completed"
        );
    } else {
        info!("No new posts created");
    }
    Ok(report)
}
