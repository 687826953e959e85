//! Note search entry points.
//!
//! # Responsibility
//! - Filter notes by case-insensitive substring over title and/or content.
//! - Shape hits with a markdown-stripped snippet for result lists.

pub mod preview;
mod substring;

pub use preview::{markdown_snippet, SNIPPET_MAX_CHARS};
pub use substring::{
    search_notes, SearchError, SearchHit, SearchQuery, SearchResult, SearchScope,
    SEARCH_DEFAULT_LIMIT, SEARCH_LIMIT_MAX,
};
