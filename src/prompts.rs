//! Prompts for the news post and the study post.
//!
//! Both prompts demand a bare `{"title": "...", "content": "..."}` JSON answer
//! (see [`crate::api::parse_structured_response`]) and spell out formatting
//! rules for small screens: short paragraphs, bold-title bullets, fenced code.

use crate::models::{NewsItem, StudyTopic};
use itertools::Itertools;

pub const NEWS_SYSTEM_PROMPT: &str = "You are a technical blog writer. \
You return strict JSON exactly matching requested schema.";

pub const STUDY_SYSTEM_PROMPT: &str = "You are a senior software engineer writing practical study guides. \
You return strict JSON exactly matching requested schema.";

const MOBILE_BULLET_RULES: &str = "\
- Keep paragraphs short: max 2-3 sentences per paragraph.
- For bullet points, use bold title on one line, then description on the next line. Example:
  - **Title here**
    Description text here.
- Never write a bullet as a single long sentence. Always split title and detail.";

/// Prompt asking for today's AI news roundup built only from `items`.
pub fn build_news_prompt(items: &[NewsItem], today: &str) -> String {
    let refs = items
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("{}. {} | {} | {}", idx + 1, item.title, item.source, item.url))
        .join("\n");

    format!(
        r#"Date: {today} (Asia/Seoul)

Write a Korean blog post in Markdown about today's AI news.
Use only the references below.

References:
{refs}

Output requirements:
1) Respond with JSON only.
2) JSON schema: {{"title":"...","content":"..."}}
3) content must be valid Markdown (no code fences).
4) Include:
   - short intro
   - "Top News" section with at least 5 bullets
   - "What This Means for Developers" section
   - "Source Links" section with the URLs
5) Keep a practical, concise tone.
6) Do NOT include any "팁" or "Tip" section. Do NOT add motivational closing remarks.

Mobile-friendly formatting rules (MUST follow):
{MOBILE_BULLET_RULES}
- If any code is included, always use fenced code blocks (```language), never 4-space indent."#
    )
}

/// Prompt asking for one day's study guide on `topic`.
pub fn build_study_prompt(topic: &StudyTopic, today: &str) -> String {
    format!(
        r#"Date: {today} (Asia/Seoul)
Topic: {prompt_topic}
Category hint: {category}

Write a Korean daily study post in Markdown for developers.

Output requirements:
1) Respond with JSON only.
2) JSON schema: {{"title":"...","content":"..."}}
3) content must be valid Markdown (no code fences).
4) Include:
   - Why this topic matters in real projects
   - Core concepts (3-5 bullets)
   - Hands-on mini example (code block allowed inside Markdown)
   - Common mistakes
   - One-day practice checklist
5) Keep it practical and focused.
6) Do NOT include any "팁" or "Tip" section at the end. Do NOT add motivational closing remarks or preview of next day's topic.

Mobile-friendly formatting rules (MUST follow):
{MOBILE_BULLET_RULES}
- Break long paragraphs into multiple short ones.
- Always use fenced code blocks (```language), NEVER use 4-space indented code blocks.
- If a code example is longer than 15 lines, split it into multiple separate fenced code blocks with a short explanation between each block.
- For "Common mistakes" section, format each item as a bold title + newline + description, not a single long line."#,
        prompt_topic = topic.prompt_topic,
        category = topic.category,
    )
}
