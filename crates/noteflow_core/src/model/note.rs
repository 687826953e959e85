//! Note domain model.
//!
//! # Responsibility
//! - Define the tree node record shared by folders and leaf documents.
//! - Provide input shapes for create and partial-update use-cases.
//! - Own title/tag normalization rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `parent_id` is `None` (root) or references an existing folder note.
//! - `order` is unique among siblings of the same parent.
//! - `tags` are lowercase, trimmed, deduplicated and sorted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for every note and folder.
pub type NoteId = Uuid;

/// Default title for new leaf notes.
pub const DEFAULT_NOTE_TITLE: &str = "New Note";
/// Default title for new folders.
pub const DEFAULT_FOLDER_TITLE: &str = "New Folder";

/// Canonical tree node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Markdown body. Always empty-able, never null.
    pub content: String,
    /// `None` means root-level node.
    pub parent_id: Option<NoteId>,
    /// Sibling rank within `parent_id`.
    pub order: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_folder: bool,
    /// Whether a folder is shown expanded in the document tree.
    pub is_expanded: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for creating one note. Identity, timestamps and order are assigned
/// by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<NoteId>,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewNote {
    /// Builds a leaf note input.
    pub fn note(title: impl Into<String>, parent_id: Option<NoteId>) -> Self {
        Self {
            title: title.into(),
            parent_id,
            ..Self::default()
        }
    }

    /// Builds a folder input.
    pub fn folder(title: impl Into<String>, parent_id: Option<NoteId>) -> Self {
        Self {
            title: title.into(),
            parent_id,
            is_folder: true,
            ..Self::default()
        }
    }

    /// Sets markdown content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Partial update for one note. `None` fields are left untouched.
///
/// Re-parenting and ordering go through the move use-case instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_expanded: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    /// Returns whether the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.is_expanded.is_none()
            && self.tags.is_none()
    }
}

/// Nested read model used by the document tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTreeNode {
    #[serde(flatten)]
    pub note: Note,
    pub children: Vec<NoteTreeNode>,
}

/// Trims a title. Returns `None` when nothing is left.
pub fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes one tag value.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

/// Assembles a nested tree from a flat note list.
///
/// Siblings are sorted by `order ASC, id ASC`. Notes whose parent is not in
/// `notes` are treated as roots so a partial listing never drops rows.
pub fn build_tree(notes: Vec<Note>) -> Vec<NoteTreeNode> {
    let known: BTreeSet<NoteId> = notes.iter().map(|note| note.id).collect();
    let mut sorted = notes;
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));

    let (roots, rest): (Vec<Note>, Vec<Note>) = sorted.into_iter().partition(|note| {
        note.parent_id
            .map_or(true, |parent_id| !known.contains(&parent_id))
    });

    let mut remaining = rest;
    roots
        .into_iter()
        .map(|note| attach_children(note, &mut remaining))
        .collect()
}

fn attach_children(note: Note, remaining: &mut Vec<Note>) -> NoteTreeNode {
    let (children, rest): (Vec<Note>, Vec<Note>) = std::mem::take(remaining)
        .into_iter()
        .partition(|candidate| candidate.parent_id == Some(note.id));
    *remaining = rest;

    let children = children
        .into_iter()
        .map(|child| attach_children(child, remaining))
        .collect();
    NoteTreeNode { note, children }
}
