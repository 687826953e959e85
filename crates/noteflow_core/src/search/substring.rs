//! Case-insensitive substring search over notes.
//!
//! # Invariants
//! - Blank query text matches every note.
//! - Matching uses Unicode lowercase on both sides.
//! - Result ordering is deterministic: `updated_at DESC, id ASC`.

use super::preview::{markdown_snippet, SNIPPET_MAX_CHARS};
use crate::db::DbError;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::parse_note_row;
use crate::repo::RepoError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const SEARCH_DEFAULT_LIMIT: u32 = 50;
pub const SEARCH_LIMIT_MAX: u32 = 200;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error.
#[derive(Debug)]
pub enum SearchError {
    /// Scope label is not one of `all|title|content`.
    InvalidScope(String),
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidScope(value) => {
                write!(f, "invalid search scope `{value}`; expected all|title|content")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Which note fields a query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    Title,
    Content,
}

impl SearchScope {
    pub fn parse(value: &str) -> SearchResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "title" => Ok(Self::Title),
            "content" => Ok(Self::Content),
            other => Err(SearchError::InvalidScope(other.to_string())),
        }
    }

    fn matches(self, note: &Note, needle: &str) -> bool {
        let in_title = || note.title.to_lowercase().contains(needle);
        let in_content = || note.content.to_lowercase().contains(needle);
        match self {
            Self::All => in_title() || in_content(),
            Self::Title => in_title(),
            Self::Content => in_content(),
        }
    }
}

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub scope: SearchScope,
    /// Maximum hits. `0` means default; values above max are clamped.
    pub limit: u32,
}

impl SearchQuery {
    /// Creates an all-fields query with default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: SearchScope::All,
            limit: SEARCH_DEFAULT_LIMIT,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Effective limit after defaulting and clamping.
    pub fn applied_limit(&self) -> u32 {
        match self.limit {
            0 => SEARCH_DEFAULT_LIMIT,
            value if value > SEARCH_LIMIT_MAX => SEARCH_LIMIT_MAX,
            value => value,
        }
    }
}

/// Single search hit returned by [`search_notes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub note_id: NoteId,
    pub title: String,
    pub is_folder: bool,
    pub parent_id: Option<NoteId>,
    /// Markdown-stripped preview of content (empty for blank notes).
    pub snippet: String,
    pub updated_at: i64,
}

/// Searches notes by substring.
///
/// A whitespace-only query lists every note. Any other query matches as
/// typed, surrounding spaces included.
pub fn search_notes(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let blank = query.text.trim().is_empty();
    let needle = query.text.to_lowercase();
    let limit = query.applied_limit() as usize;

    let mut stmt = conn.prepare(
        "SELECT
            id,
            title,
            content,
            parent_id,
            sort_order,
            is_folder,
            is_expanded,
            created_at,
            updated_at
         FROM notes
         ORDER BY updated_at DESC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;

    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        let note = parse_note_row(row)?;
        if !blank && !query.scope.matches(&note, &needle) {
            continue;
        }
        hits.push(to_search_hit(note));
        if hits.len() >= limit {
            break;
        }
    }
    Ok(hits)
}

fn to_search_hit(note: Note) -> SearchHit {
    let snippet = markdown_snippet(&note.content, SNIPPET_MAX_CHARS);
    SearchHit {
        note_id: note.id,
        title: note.title,
        is_folder: note.is_folder,
        parent_id: note.parent_id,
        snippet,
        updated_at: note.updated_at,
    }
}
