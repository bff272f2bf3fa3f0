//! Markdown clean-up applied to scraped and generated post bodies.
//!
//! [`normalize_markdown`] is total: any input yields some output, and the
//! steps run in a fixed order:
//!
//! 1. strip zero-width spaces and byte-order marks
//! 2. collapse runs of three or more newlines into one blank line, then trim
//! 3. rewrite 4-space indented code into fenced blocks
//!
//! Fenced blocks render far better than indented code on narrow screens,
//! which is where most readers of the blog are.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";
const CODE_INDENT: &str = "    ";

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SETEXT_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=+\s*$").unwrap());
// Three dashes alone is a thematic break, not an underline.
static SETEXT_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{4,}\s*$").unwrap());
static CLOSED_ATX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6}) (.*?)\s+#+\s*$").unwrap());

/// Normalize raw Markdown into the form written to post files.
pub fn normalize_markdown(raw: &str) -> String {
    let stripped = raw.replace(['\u{200b}', '\u{feff}'], "");
    let collapsed = NEWLINE_RUNS.replace_all(&stripped, "\n\n");
    convert_indented_code_to_fenced(collapsed.trim())
}

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_ws(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Rewrite headings into open ATX form (`## Title`).
///
/// Setext headings (a text line underlined with `=` or `-`) become `#` and
/// `##`, and closing hash runs are dropped. Fenced code is left alone.
pub fn atx_headings(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in text.split('\n') {
        if line.trim_start().starts_with(FENCE) {
            in_fence = !in_fence;
        } else if !in_fence {
            let hashes = if SETEXT_H1.is_match(line) {
                Some("#")
            } else if SETEXT_H2.is_match(line) {
                Some("##")
            } else {
                None
            };
            if let (Some(hashes), Some(prev)) = (hashes, out.last_mut()) {
                let heading = prev.trim().to_string();
                if !heading.is_empty() && !heading.starts_with('#') {
                    *prev = format!("{hashes} {heading}");
                    continue;
                }
            }
            if let Some(caps) = CLOSED_ATX.captures(line) {
                out.push(format!("{} {}", &caps[1], &caps[2]));
                continue;
            }
        }
        out.push(line.to_string());
    }

    out.join("\n")
}

/// Rewrite 4-space indented code runs as fenced code blocks.
///
/// A line is code when it starts with four spaces and has visible content.
/// Blank lines inside a run stay in the block as empty lines; any other line
/// ends the block and passes through untouched.
pub fn convert_indented_code_to_fenced(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut in_code = false;

    for line in text.split('\n') {
        let is_blank = line.trim().is_empty();
        if line.starts_with(CODE_INDENT) && !is_blank {
            in_code = true;
            block.push(&line[CODE_INDENT.len()..]);
        } else if in_code && is_blank {
            block.push("");
        } else {
            if in_code {
                flush_block(&mut block, &mut out);
                in_code = false;
            }
            out.push(line);
        }
    }
    if in_code {
        flush_block(&mut block, &mut out);
    }

    out.join("\n")
}

/// Emit `block` wrapped in a fence pair, minus trailing blank lines.
/// A block with nothing but blanks emits nothing.
fn flush_block<'a>(block: &mut Vec<&'a str>, out: &mut Vec<&'a str>) {
    while block.last().is_some_and(|l| l.trim().is_empty()) {
        block.pop();
    }
    if !block.is_empty() {
        out.push(FENCE);
        out.append(block);
        out.push(FENCE);
    }
    block.clear();
}
