//! Keyword classifier mapping imported posts onto the site's categories.

/// Ordered `(keywords, category)` rules; the first rule with any keyword
/// present in the text wins. Keywords are substring matches, so padding
/// spaces (`"sql "`) are significant.
const RULES: &[(&[&str], &str)] = &[
    (
        &["elasticsearch", "elastic search", "kafka", "logstash", "kibana"],
        "data-infra",
    ),
    (
        &["oracle", "postgresql", "mysql", "sql ", " sql", "redis"],
        "sql",
    ),
    (&["python", "pydantic", "fastapi"], "python"),
    (
        &["next.js", "nextjs", "react", "typescript", "javascript", "vue"],
        "nextjs",
    ),
    (&["java", "spring", "springboot", "jpa"], "java"),
    (&["ai", "llm", "chatgpt", "claude", "gpt"], "ai-daily-news"),
];

// TODO: ask the site owner whether unmatched posts should go to an
// "uncategorized" bucket; existing archives were filed under java.
pub const FALLBACK_CATEGORY: &str = "java";

/// Pick a category from a post's title, its source category and a body snippet.
///
/// Matching is case-insensitive and deterministic.
pub fn classify(title: &str, source_category: &str, snippet: &str) -> &'static str {
    let text = format!("{title} {source_category} {snippet}").to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}
