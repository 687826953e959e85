//! Plain-text snippets of markdown note bodies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Snippet length used by search hits.
pub const SNIPPET_MAX_CHARS: usize = 100;

// Images vanish entirely; links keep their label.
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("image regex"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link regex"));
static BLOCK_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:#{1,6}|>+|[-*+]|\d+[.)])[ \t]+|```\w*)").expect("block prefix regex")
});
static INLINE_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`~]+").expect("inline mark regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Strips markdown syntax from `content`, collapses whitespace and keeps at
/// most `max_chars` characters. Blank bodies give an empty string.
pub fn markdown_snippet(content: &str, max_chars: usize) -> String {
    let text = IMAGE.replace_all(content, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = BLOCK_PREFIX.replace_all(&text, "");
    let text = INLINE_MARK.replace_all(&text, "");
    let text = SPACES.replace_all(&text, " ");
    text.trim().chars().take(max_chars).collect()
}
