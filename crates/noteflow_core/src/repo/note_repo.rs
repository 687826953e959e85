//! Note tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the folder/note hierarchy.
//! - Keep SQL details, sibling ordering and cascade delete inside the
//!   repository boundary.
//! - Persist the active (selected) note.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, id ASC`.
//! - Appended notes get `max(sibling sort_order) + 1`, or `0` for the first.
//! - `move_note` leaves both old and new sibling lists densely numbered.
//! - `delete_subtree` removes a node and every descendant in one transaction.
//!
//! Hierarchy rules (parent must be a folder, no cycles) are enforced by
//! `NoteService`, not here.

use super::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use crate::model::note::{NewNote, Note, NoteId, NotePatch};
use crate::model::now_epoch_ms;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::HashMap;
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    parent_id,
    sort_order,
    is_folder,
    is_expanded,
    created_at,
    updated_at
FROM notes";

const ACTIVE_NOTE_KEY: &str = "active_note_id";

/// Repository interface for note tree operations.
pub trait NoteRepository {
    /// Inserts one note at the end of its sibling list. Input must already be
    /// normalized.
    fn insert_note(&self, note: &NewNote) -> RepoResult<Note>;
    /// Loads one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists every note, grouped by parent and ordered by sibling rank.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Lists direct children of one parent (`None` = roots).
    fn list_children(&self, parent_id: Option<NoteId>) -> RepoResult<Vec<Note>>;
    /// Applies a partial update and bumps `updated_at`.
    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    /// Re-parents one note and inserts it at `target_index` among its new
    /// siblings (`None` appends).
    fn move_note(
        &self,
        id: NoteId,
        new_parent_id: Option<NoteId>,
        target_index: Option<i64>,
    ) -> RepoResult<()>;
    /// Sets folder expansion flag without touching `updated_at`.
    fn set_expanded(&self, id: NoteId, is_expanded: bool) -> RepoResult<()>;
    /// Deletes one note and all descendants. Returns every removed id,
    /// starting with `id`.
    fn delete_subtree(&self, id: NoteId) -> RepoResult<Vec<NoteId>>;
    /// Loads the persisted active note, if it still exists.
    fn active_note(&self) -> RepoResult<Option<NoteId>>;
    /// Persists the active note selection.
    fn set_active_note(&self, id: Option<NoteId>) -> RepoResult<()>;
}

/// SQLite-backed note tree repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "notes",
            &[
                "id",
                "title",
                "content",
                "parent_id",
                "sort_order",
                "is_folder",
                "is_expanded",
                "created_at",
                "updated_at",
            ],
        )?;
        ensure_table_ready(conn, "note_tags", &["note_id", "tag"])?;
        ensure_table_ready(conn, "app_state", &["key", "value"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &NewNote) -> RepoResult<Note> {
        let id = Uuid::new_v4();
        let now = now_epoch_ms();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_sort_order(&tx, note.parent_id)?;
        tx.execute(
            "INSERT INTO notes (
                id,
                title,
                content,
                parent_id,
                sort_order,
                is_folder,
                is_expanded,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.parent_id.map(|value| value.to_string()),
                sort_order,
                note.is_folder,
                note.is_expanded,
                now,
                now,
            ],
        )?;
        replace_tags(&tx, id, &note.tags)?;
        tx.commit()?;

        self.get_note(id)?.ok_or(RepoError::NotFound(id))
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = load_tags_for_note(self.conn, note.id)?;
            return Ok(Some(note));
        }
        Ok(None)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut tags_by_note = load_all_tags(self.conn)?;
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             ORDER BY parent_id IS NOT NULL, parent_id ASC, sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = tags_by_note.remove(&note.id).unwrap_or_default();
            notes.push(note);
        }
        Ok(notes)
    }

    fn list_children(&self, parent_id: Option<NoteId>) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE parent_id IS ?1
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([parent_id.map(|value| value.to_string())])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = load_tags_for_note(self.conn, note.id)?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(is_expanded) = patch.is_expanded {
            assignments.push("is_expanded = ?");
            bind_values.push(Value::Integer(i64::from(is_expanded)));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(now_epoch_ms()));
        bind_values.push(Value::Text(id.to_string()));

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", ")),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        if let Some(tags) = patch.tags.as_ref() {
            replace_tags(&tx, id, tags)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn move_note(
        &self,
        id: NoteId,
        new_parent_id: Option<NoteId>,
        target_index: Option<i64>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let old_parent_id = load_parent_id(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        let mut sibling_ids = list_child_ids(&tx, new_parent_id)?;
        sibling_ids.retain(|sibling| *sibling != id);
        let target_index = target_index
            .unwrap_or(sibling_ids.len() as i64)
            .clamp(0, sibling_ids.len() as i64) as usize;
        sibling_ids.insert(target_index, id);

        tx.execute(
            "UPDATE notes
             SET parent_id = ?2,
                 updated_at = ?3
             WHERE id = ?1;",
            params![
                id.to_string(),
                new_parent_id.map(|value| value.to_string()),
                now_epoch_ms(),
            ],
        )?;
        reindex_siblings(&tx, &sibling_ids)?;

        if old_parent_id != new_parent_id {
            let old_siblings = list_child_ids(&tx, old_parent_id)?;
            reindex_siblings(&tx, &old_siblings)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn set_expanded(&self, id: NoteId, is_expanded: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET is_expanded = ?2 WHERE id = ?1;",
            params![id.to_string(), is_expanded],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_subtree(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = list_subtree_ids(&tx, id)?;
        if removed.is_empty() {
            return Err(RepoError::NotFound(id));
        }

        for note_id in removed.iter().rev() {
            tx.execute("DELETE FROM notes WHERE id = ?1;", [note_id.to_string()])?;
        }

        let active: Option<Option<String>> = tx
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1;",
                [ACTIVE_NOTE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(active_id) = active.flatten() {
            if removed.iter().any(|note_id| note_id.to_string() == active_id) {
                write_active_note(&tx, None)?;
            }
        }

        tx.commit()?;
        Ok(removed)
    }

    fn active_note(&self) -> RepoResult<Option<NoteId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT state.value
                 FROM app_state state
                 INNER JOIN notes n ON n.id = state.value
                 WHERE state.key = ?1;",
                [ACTIVE_NOTE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| parse_uuid(&text, "app_state.value"))
            .transpose()
    }

    fn set_active_note(&self, id: Option<NoteId>) -> RepoResult<()> {
        if let Some(id) = id {
            if load_parent_id(self.conn, id)?.is_none() {
                return Err(RepoError::NotFound(id));
            }
        }
        write_active_note(self.conn, id)
    }
}

fn write_active_note(conn: &Connection, id: Option<NoteId>) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![ACTIVE_NOTE_KEY, id.map(|value| value.to_string())],
    )?;
    Ok(())
}

/// Returns `Some(parent_id)` when the note exists.
fn load_parent_id(conn: &Connection, id: NoteId) -> RepoResult<Option<Option<NoteId>>> {
    let value: Option<Option<String>> = conn
        .query_row(
            "SELECT parent_id FROM notes WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(text)) => Ok(Some(Some(parse_uuid(&text, "notes.parent_id")?))),
    }
}

fn next_sort_order(conn: &Connection, parent_id: Option<NoteId>) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM notes
         WHERE parent_id IS ?1;",
        [parent_id.map(|value| value.to_string())],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_child_ids(conn: &Connection, parent_id: Option<NoteId>) -> RepoResult<Vec<NoteId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM notes
         WHERE parent_id IS ?1
         ORDER BY sort_order ASC, id ASC;",
    )?;
    let mut rows = stmt.query([parent_id.map(|value| value.to_string())])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "notes.id")?);
    }
    Ok(ids)
}

fn reindex_siblings(conn: &Connection, ordered_ids: &[NoteId]) -> RepoResult<()> {
    for (index, id) in ordered_ids.iter().enumerate() {
        conn.execute(
            "UPDATE notes SET sort_order = ?2 WHERE id = ?1;",
            params![id.to_string(), index as i64],
        )?;
    }
    Ok(())
}

fn list_subtree_ids(conn: &Connection, root_id: NoteId) -> RepoResult<Vec<NoteId>> {
    let mut stmt = conn.prepare(
        "WITH RECURSIVE subtree(id, depth) AS (
            SELECT id, 0
            FROM notes
            WHERE id = ?1
            UNION
            SELECT child.id, parent.depth + 1
            FROM notes child
            INNER JOIN subtree parent ON child.parent_id = parent.id
        )
        SELECT id FROM subtree ORDER BY depth ASC, id ASC;",
    )?;
    let mut rows = stmt.query([root_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "notes.id")?);
    }
    Ok(ids)
}

fn replace_tags(conn: &Connection, id: NoteId, tags: &[String]) -> RepoResult<()> {
    let id_text = id.to_string();
    conn.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id_text.as_str()])?;
    for tag in tags {
        conn.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag) VALUES (?1, ?2);",
            params![id_text.as_str(), tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags_for_note(conn: &Connection, id: NoteId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM note_tags
         WHERE note_id = ?1
         ORDER BY tag ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_all_tags(conn: &Connection) -> RepoResult<HashMap<NoteId, Vec<String>>> {
    let mut stmt = conn.prepare("SELECT note_id, tag FROM note_tags ORDER BY note_id, tag;")?;
    let mut rows = stmt.query([])?;
    let mut tags: HashMap<NoteId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let note_id: String = row.get(0)?;
        let tag: String = row.get(1)?;
        tags.entry(parse_uuid(&note_id, "note_tags.note_id")?)
            .or_default()
            .push(tag);
    }
    Ok(tags)
}

pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "notes.parent_id"))
        .transpose()?;

    Ok(Note {
        id: parse_uuid(&id_text, "notes.id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        parent_id,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_folder: row.get("is_folder")?,
        is_expanded: row.get("is_expanded")?,
        tags: Vec::new(),
    })
}
