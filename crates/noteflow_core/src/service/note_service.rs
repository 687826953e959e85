//! Note tree use-case service.
//!
//! # Responsibility
//! - Provide the note store actions: add, update, delete, move, expand,
//!   select, undo/redo and content insertion.
//! - Validate hierarchy invariants above the repository layer.
//! - Record content snapshots into the caller's `EditHistory`.
//!
//! # Invariants
//! - Parent must exist and be a folder when provided.
//! - Move operations must not create parent-child cycles.
//! - Deleting a note deletes all descendants and their history.
//! - Undo/redo restore content without recording new history entries.

use crate::model::history::EditHistory;
use crate::model::note::{
    build_tree, normalize_tags, normalize_title, NewNote, Note, NoteId, NotePatch, NoteTreeNode,
    DEFAULT_FOLDER_TITLE, DEFAULT_NOTE_TITLE,
};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// History action label for manual edits.
pub const HISTORY_ACTION_EDIT: &str = "edit";
/// History action label for AI output inserted into a note.
pub const HISTORY_ACTION_AI_INSERT: &str = "ai-insert";

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Tag input contains blank values.
    InvalidTag(String),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Parent note does not exist.
    ParentNotFound(NoteId),
    /// Parent exists but is not a folder.
    ParentMustBeFolder(NoteId),
    /// Move operation would create a cycle.
    CycleDetected { note_id: NoteId, parent_id: NoteId },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent note not found: {id}"),
            Self::ParentMustBeFolder(id) => write!(f, "parent note must be a folder: {id}"),
            Self::CycleDetected { note_id, parent_id } => write!(
                f,
                "move would create cycle: note {note_id} under parent {parent_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note tree service facade.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one note or folder at the end of its sibling list and makes it
    /// the active note.
    ///
    /// A blank title falls back to `New Note` / `New Folder`. A failed
    /// selection is logged and does not fail the call.
    pub fn add_note(&self, input: NewNote) -> NoteServiceResult<Note> {
        let title = normalize_title(&input.title).unwrap_or_else(|| {
            if input.is_folder {
                DEFAULT_FOLDER_TITLE.to_string()
            } else {
                DEFAULT_NOTE_TITLE.to_string()
            }
        });
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_is_folder(parent_id)?;
        }
        let tags = validate_tags(&input.tags)?;

        let normalized = NewNote {
            title,
            tags,
            ..input
        };
        let note = self.repo.insert_note(&normalized)?;
        // The note is already stored; a lost selection must not hide it.
        if let Err(err) = self.repo.set_active_note(Some(note.id)) {
            warn!(
                "event=note_select module=note_service status=error stage=after_create error={}",
                err
            );
        }

        info!(
            "event=note_create module=note_service status=ok is_folder={} has_parent={}",
            note.is_folder,
            note.parent_id.is_some()
        );
        Ok(note)
    }

    /// Gets one note by id.
    pub fn get_note(&self, id: NoteId) -> NoteServiceResult<Note> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Lists every note (flat).
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        self.repo.list_notes().map_err(Into::into)
    }

    /// Lists direct children under optional parent folder.
    pub fn list_children(&self, parent_id: Option<NoteId>) -> NoteServiceResult<Vec<Note>> {
        if let Some(parent_id) = parent_id {
            self.ensure_parent_is_folder(parent_id)?;
        }
        self.repo.list_children(parent_id).map_err(Into::into)
    }

    /// Returns the whole store as a nested tree.
    pub fn tree(&self) -> NoteServiceResult<Vec<NoteTreeNode>> {
        Ok(build_tree(self.repo.list_notes()?))
    }

    /// Applies a partial update.
    ///
    /// When content changes and `history` is provided, the previous content
    /// is recorded with action `edit`. An update that changes nothing returns
    /// the stored note untouched.
    pub fn update_note(
        &self,
        id: NoteId,
        patch: NotePatch,
        history: Option<&mut EditHistory>,
    ) -> NoteServiceResult<Note> {
        self.apply_update(id, patch, history, HISTORY_ACTION_EDIT)
    }

    /// Inserts AI output at the end of a note: `existing + "\n\n" + text`,
    /// or just `text` when the note is empty.
    pub fn append_content(
        &self,
        id: NoteId,
        text: &str,
        history: Option<&mut EditHistory>,
    ) -> NoteServiceResult<Note> {
        let existing = self.get_note(id)?;
        if text.trim().is_empty() {
            return Ok(existing);
        }
        let content = if existing.content.is_empty() {
            text.to_string()
        } else {
            format!("{}\n\n{}", existing.content, text)
        };
        let patch = NotePatch {
            content: Some(content),
            ..NotePatch::default()
        };
        self.apply_update(id, patch, history, HISTORY_ACTION_AI_INSERT)
    }

    /// Deletes one note and all descendants. Returns removed ids.
    pub fn delete_note(
        &self,
        id: NoteId,
        history: Option<&mut EditHistory>,
    ) -> NoteServiceResult<Vec<NoteId>> {
        let removed = self.repo.delete_subtree(id)?;
        if let Some(history) = history {
            history.forget(removed.iter());
        }
        info!(
            "event=note_delete module=note_service status=ok removed_count={}",
            removed.len()
        );
        Ok(removed)
    }

    /// Moves one note under optional parent folder at optional sibling index.
    pub fn move_note(
        &self,
        id: NoteId,
        new_parent_id: Option<NoteId>,
        target_index: Option<i64>,
    ) -> NoteServiceResult<Note> {
        self.get_note(id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(NoteServiceError::CycleDetected {
                    note_id: id,
                    parent_id,
                });
            }
            self.ensure_parent_is_folder(parent_id)?;
            if self.would_create_cycle(id, parent_id)? {
                return Err(NoteServiceError::CycleDetected {
                    note_id: id,
                    parent_id,
                });
            }
        }

        self.repo
            .move_note(id, new_parent_id, target_index.map(|value| value.max(0)))?;
        info!(
            "event=note_move module=note_service status=ok to_root={}",
            new_parent_id.is_none()
        );
        self.read_back(id, "moved note not found in read-back")
    }

    /// Flips the expansion flag of one note.
    pub fn toggle_folder_expand(&self, id: NoteId) -> NoteServiceResult<Note> {
        let note = self.get_note(id)?;
        self.repo.set_expanded(id, !note.is_expanded)?;
        self.read_back(id, "toggled note not found in read-back")
    }

    /// Returns the active note id, if any.
    pub fn active_note(&self) -> NoteServiceResult<Option<NoteId>> {
        self.repo.active_note().map_err(Into::into)
    }

    /// Selects a note (or clears selection with `None`).
    pub fn set_active_note(&self, id: Option<NoteId>) -> NoteServiceResult<()> {
        self.repo.set_active_note(id).map_err(Into::into)
    }

    /// Restores the latest history snapshot. Returns `None` when there is
    /// nothing to undo.
    pub fn undo(&self, id: NoteId, history: &mut EditHistory) -> NoteServiceResult<Option<Note>> {
        let note = self.get_note(id)?;
        let Some(snapshot) = history.peek_undo(id).map(|entry| entry.content.clone()) else {
            return Ok(None);
        };
        let restored = self.restore_content(id, snapshot)?;
        history.undo(id, &note.content);
        Ok(Some(restored))
    }

    /// Re-applies the latest undone snapshot. Returns `None` when there is
    /// nothing to redo.
    pub fn redo(&self, id: NoteId, history: &mut EditHistory) -> NoteServiceResult<Option<Note>> {
        let note = self.get_note(id)?;
        let Some(snapshot) = history.peek_redo(id).map(|entry| entry.content.clone()) else {
            return Ok(None);
        };
        let restored = self.restore_content(id, snapshot)?;
        history.redo(id, &note.content);
        Ok(Some(restored))
    }

    fn apply_update(
        &self,
        id: NoteId,
        patch: NotePatch,
        history: Option<&mut EditHistory>,
        action: &str,
    ) -> NoteServiceResult<Note> {
        let existing = self.get_note(id)?;

        let title = match patch.title {
            Some(value) => Some(normalize_title(&value).ok_or(NoteServiceError::InvalidTitle)?),
            None => None,
        };
        let tags = match patch.tags {
            Some(values) => Some(validate_tags(&values)?),
            None => None,
        };
        let content = patch
            .content
            .filter(|content| *content != existing.content);

        let normalized = NotePatch {
            title: title.filter(|title| *title != existing.title),
            content,
            is_expanded: patch
                .is_expanded
                .filter(|flag| *flag != existing.is_expanded),
            tags: tags.filter(|tags| *tags != existing.tags),
        };
        if normalized.is_empty() {
            return Ok(existing);
        }

        let content_changed = normalized.content.is_some();
        self.repo.update_note(id, &normalized)?;
        if content_changed {
            if let Some(history) = history {
                history.push(id, existing.content, action);
            }
        }
        self.read_back(id, "updated note not found in read-back")
    }

    fn restore_content(&self, id: NoteId, content: String) -> NoteServiceResult<Note> {
        let patch = NotePatch {
            content: Some(content),
            ..NotePatch::default()
        };
        self.repo.update_note(id, &patch)?;
        self.read_back(id, "restored note not found in read-back")
    }

    fn read_back(&self, id: NoteId, details: &'static str) -> NoteServiceResult<Note> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }

    fn ensure_parent_is_folder(&self, parent_id: NoteId) -> NoteServiceResult<()> {
        let parent = self
            .repo
            .get_note(parent_id)?
            .ok_or(NoteServiceError::ParentNotFound(parent_id))?;
        if !parent.is_folder {
            return Err(NoteServiceError::ParentMustBeFolder(parent_id));
        }
        Ok(())
    }

    fn would_create_cycle(
        &self,
        id: NoteId,
        candidate_parent_id: NoteId,
    ) -> NoteServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let node = self
                .repo
                .get_note(current)?
                .ok_or(NoteServiceError::ParentNotFound(current))?;
            cursor = node.parent_id;
        }
        Ok(false)
    }
}

fn validate_tags(tags: &[String]) -> NoteServiceResult<Vec<String>> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(NoteServiceError::InvalidTag(tag.clone()));
        }
    }
    Ok(normalize_tags(tags))
}
