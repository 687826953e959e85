//! Per-note edit history buffers.
//!
//! # Responsibility
//! - Keep a bounded, linear undo buffer of content snapshots per note.
//! - Track redo snapshots produced by undo until the next new edit.
//!
//! # Invariants
//! - Each note keeps at most `HISTORY_CAPACITY` undo entries; the oldest
//!   entry is dropped first.
//! - Any new `push` clears the note's redo buffer.
//! - History is process-local and never persisted.

use super::note::NoteId;
use super::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Maximum undo snapshots retained per note.
pub const HISTORY_CAPACITY: usize = 20;

/// One content snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditHistoryEntry {
    pub id: Uuid,
    /// Note content captured at the time of the entry.
    pub content: String,
    pub timestamp: i64,
    /// Label of the edit that replaced this content (`edit`, `ai-insert`, ...).
    pub action: String,
}

impl EditHistoryEntry {
    fn capture(content: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            timestamp: now_epoch_ms(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Default)]
struct NoteHistory {
    undo: VecDeque<EditHistoryEntry>,
    redo: Vec<EditHistoryEntry>,
}

/// Undo/redo buffers for all notes.
#[derive(Debug)]
pub struct EditHistory {
    capacity: usize,
    notes: HashMap<NoteId, NoteHistory>,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates buffers keeping at most `capacity` undo entries per note.
    ///
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            notes: HashMap::new(),
        }
    }

    /// Records the content a note had before an edit.
    pub fn push(&mut self, note_id: NoteId, content: impl Into<String>, action: impl Into<String>) {
        let capacity = self.capacity;
        let history = self.notes.entry(note_id).or_default();
        history.redo.clear();
        history
            .undo
            .push_back(EditHistoryEntry::capture(content, action));
        while history.undo.len() > capacity {
            history.undo.pop_front();
        }
    }

    /// Latest snapshot [`undo`](Self::undo) would return, without moving it.
    pub fn peek_undo(&self, note_id: NoteId) -> Option<&EditHistoryEntry> {
        self.notes.get(&note_id)?.undo.back()
    }

    /// Latest snapshot [`redo`](Self::redo) would return, without moving it.
    pub fn peek_redo(&self, note_id: NoteId) -> Option<&EditHistoryEntry> {
        self.notes.get(&note_id)?.redo.last()
    }

    /// Pops the latest snapshot and stashes `current_content` for redo.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, note_id: NoteId, current_content: &str) -> Option<EditHistoryEntry> {
        let history = self.notes.get_mut(&note_id)?;
        let entry = history.undo.pop_back()?;
        history
            .redo
            .push(EditHistoryEntry::capture(current_content, entry.action.clone()));
        Some(entry)
    }

    /// Re-applies the latest undone snapshot and stashes `current_content`
    /// back onto the undo buffer.
    pub fn redo(&mut self, note_id: NoteId, current_content: &str) -> Option<EditHistoryEntry> {
        let capacity = self.capacity;
        let history = self.notes.get_mut(&note_id)?;
        let entry = history.redo.pop()?;
        history
            .undo
            .push_back(EditHistoryEntry::capture(current_content, entry.action.clone()));
        while history.undo.len() > capacity {
            history.undo.pop_front();
        }
        Some(entry)
    }

    /// Returns undo entries oldest-first.
    pub fn entries(&self, note_id: NoteId) -> Vec<EditHistoryEntry> {
        self.notes
            .get(&note_id)
            .map(|history| history.undo.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn can_undo(&self, note_id: NoteId) -> bool {
        self.notes
            .get(&note_id)
            .is_some_and(|history| !history.undo.is_empty())
    }

    pub fn can_redo(&self, note_id: NoteId) -> bool {
        self.notes
            .get(&note_id)
            .is_some_and(|history| !history.redo.is_empty())
    }

    /// Drops buffers for removed notes.
    pub fn forget<'a>(&mut self, note_ids: impl IntoIterator<Item = &'a NoteId>) {
        for note_id in note_ids {
            self.notes.remove(note_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditHistory, HISTORY_CAPACITY};
    use uuid::Uuid;

    #[test]
    fn push_keeps_only_last_entries() {
        let mut history = EditHistory::new();
        let note_id = Uuid::new_v4();
        for index in 0..(HISTORY_CAPACITY + 5) {
            history.push(note_id, format!("v{index}"), "edit");
        }

        let entries = history.entries(note_id);
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        assert_eq!(entries[0].content, "v5");
        assert_eq!(
            entries.last().map(|entry| entry.content.as_str()),
            Some(format!("v{}", HISTORY_CAPACITY + 4).as_str())
        );
    }

    #[test]
    fn undo_then_redo_restores_contents() {
        let mut history = EditHistory::new();
        let note_id = Uuid::new_v4();
        history.push(note_id, "first", "edit");

        let undone = history.undo(note_id, "second").expect("undo entry");
        assert_eq!(undone.content, "first");
        assert!(!history.can_undo(note_id));
        assert!(history.can_redo(note_id));

        let redone = history.redo(note_id, "first").expect("redo entry");
        assert_eq!(redone.content, "second");
        assert!(history.can_undo(note_id));
        assert!(!history.can_redo(note_id));
    }

    #[test]
    fn new_push_clears_redo() {
        let mut history = EditHistory::new();
        let note_id = Uuid::new_v4();
        history.push(note_id, "a", "edit");
        history.undo(note_id, "b");
        history.push(note_id, "c", "edit");
        assert!(!history.can_redo(note_id));
        assert!(history.redo(note_id, "d").is_none());
    }

    #[test]
    fn peek_leaves_buffers_untouched() {
        let mut history = EditHistory::new();
        let note_id = Uuid::new_v4();
        history.push(note_id, "a", "edit");

        assert_eq!(history.peek_undo(note_id).map(|entry| entry.content.as_str()), Some("a"));
        assert!(history.peek_redo(note_id).is_none());
        assert_eq!(history.entries(note_id).len(), 1);
        assert!(!history.can_redo(note_id));

        history.undo(note_id, "b");
        assert_eq!(history.peek_redo(note_id).map(|entry| entry.content.as_str()), Some("b"));
        assert!(history.peek_undo(note_id).is_none());
    }

    #[test]
    fn undo_on_unknown_note_is_none() {
        let mut history = EditHistory::new();
        assert!(history.undo(Uuid::new_v4(), "x").is_none());
    }

    #[test]
    fn forget_drops_buffers() {
        let mut history = EditHistory::with_capacity(0);
        let note_id = Uuid::new_v4();
        history.push(note_id, "a", "edit");
        history.push(note_id, "b", "edit");
        assert_eq!(history.entries(note_id).len(), 1);

        history.forget([note_id].iter());
        assert!(history.entries(note_id).is_empty());
    }
}
