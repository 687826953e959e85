use noteflow_core::db::open_db_in_memory;
use noteflow_core::{
    EditHistory, NewNote, Note, NoteId, NotePatch, NoteRepository, NoteService, RepoError,
    RepoResult, SqliteNoteRepository,
};
use std::cell::Cell;
use std::rc::Rc;

/// Switches the [`FlakyRepository`] write paths on and off from the test.
#[derive(Clone, Default)]
struct Faults {
    updates: Rc<Cell<bool>>,
    selection: Rc<Cell<bool>>,
}

/// Delegates to SQLite but fails the switched-on writes.
struct FlakyRepository<'conn> {
    inner: SqliteNoteRepository<'conn>,
    faults: Faults,
}

fn injected() -> RepoError {
    RepoError::InvalidData("injected write failure".to_string())
}

impl NoteRepository for FlakyRepository<'_> {
    fn insert_note(&self, note: &NewNote) -> RepoResult<Note> {
        self.inner.insert_note(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.inner.get_note(id)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.inner.list_notes()
    }

    fn list_children(&self, parent_id: Option<NoteId>) -> RepoResult<Vec<Note>> {
        self.inner.list_children(parent_id)
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        if self.faults.updates.get() {
            return Err(injected());
        }
        self.inner.update_note(id, patch)
    }

    fn move_note(
        &self,
        id: NoteId,
        new_parent_id: Option<NoteId>,
        target_index: Option<i64>,
    ) -> RepoResult<()> {
        self.inner.move_note(id, new_parent_id, target_index)
    }

    fn set_expanded(&self, id: NoteId, is_expanded: bool) -> RepoResult<()> {
        self.inner.set_expanded(id, is_expanded)
    }

    fn delete_subtree(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        self.inner.delete_subtree(id)
    }

    fn active_note(&self) -> RepoResult<Option<NoteId>> {
        self.inner.active_note()
    }

    fn set_active_note(&self, id: Option<NoteId>) -> RepoResult<()> {
        if self.faults.selection.get() {
            return Err(injected());
        }
        self.inner.set_active_note(id)
    }
}

fn content_patch(content: &str) -> NotePatch {
    NotePatch {
        content: Some(content.to_string()),
        ..NotePatch::default()
    }
}

fn history_contents(history: &EditHistory, id: NoteId) -> Vec<String> {
    history
        .entries(id)
        .into_iter()
        .map(|entry| entry.content)
        .collect()
}

#[test]
fn failed_update_leaves_history_untouched() {
    let conn = open_db_in_memory().unwrap();
    let faults = Faults::default();
    let service = NoteService::new(FlakyRepository {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
        faults: faults.clone(),
    });
    let mut history = EditHistory::new();
    let note = service
        .add_note(NewNote::note("Doc", None).with_content("v1"))
        .unwrap();
    service
        .update_note(note.id, content_patch("v2"), Some(&mut history))
        .unwrap();
    assert_eq!(history_contents(&history, note.id), vec!["v1"]);

    faults.updates.set(true);
    assert!(service
        .update_note(note.id, content_patch("v3"), Some(&mut history))
        .is_err());
    assert!(service
        .append_content(note.id, "more", Some(&mut history))
        .is_err());

    assert_eq!(service.get_note(note.id).unwrap().content, "v2");
    assert_eq!(history_contents(&history, note.id), vec!["v1"]);
    assert!(!history.can_redo(note.id));
}

#[test]
fn failed_undo_and_redo_keep_their_entries() {
    let conn = open_db_in_memory().unwrap();
    let faults = Faults::default();
    let service = NoteService::new(FlakyRepository {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
        faults: faults.clone(),
    });
    let mut history = EditHistory::new();
    let note = service
        .add_note(NewNote::note("Doc", None).with_content("v1"))
        .unwrap();
    service
        .update_note(note.id, content_patch("v2"), Some(&mut history))
        .unwrap();

    faults.updates.set(true);
    assert!(service.undo(note.id, &mut history).is_err());
    assert_eq!(service.get_note(note.id).unwrap().content, "v2");
    assert_eq!(history_contents(&history, note.id), vec!["v1"]);
    assert!(!history.can_redo(note.id));

    faults.updates.set(false);
    let undone = service.undo(note.id, &mut history).unwrap().unwrap();
    assert_eq!(undone.content, "v1");
    assert!(history.can_redo(note.id));

    faults.updates.set(true);
    assert!(service.redo(note.id, &mut history).is_err());
    assert_eq!(service.get_note(note.id).unwrap().content, "v1");
    assert!(history.can_redo(note.id));
    assert!(!history.can_undo(note.id));

    faults.updates.set(false);
    let redone = service.redo(note.id, &mut history).unwrap().unwrap();
    assert_eq!(redone.content, "v2");
    assert_eq!(history_contents(&history, note.id), vec!["v1"]);
}

#[test]
fn add_note_survives_failed_selection() {
    let conn = open_db_in_memory().unwrap();
    let faults = Faults::default();
    let service = NoteService::new(FlakyRepository {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
        faults: faults.clone(),
    });
    let first = service.add_note(NewNote::note("First", None)).unwrap();

    faults.selection.set(true);
    let second = service.add_note(NewNote::note("Second", None)).unwrap();

    assert_eq!(service.get_note(second.id).unwrap().title, "Second");
    assert_eq!(service.list_notes().unwrap().len(), 2);
    assert_eq!(service.active_note().unwrap(), Some(first.id));
}
