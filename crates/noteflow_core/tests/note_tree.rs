use noteflow_core::db::open_db_in_memory;
use noteflow_core::{
    NewNote, NoteId, NotePatch, NoteService, NoteServiceError, SqliteNoteRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap())
}

fn child_titles(
    service: &NoteService<SqliteNoteRepository<'_>>,
    parent_id: Option<NoteId>,
) -> Vec<String> {
    service
        .list_children(parent_id)
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect()
}

#[test]
fn add_note_appends_with_next_order_and_selects_it() {
    let conn = setup();
    let service = service(&conn);

    let first = service.add_note(NewNote::note("First", None)).unwrap();
    let second = service.add_note(NewNote::note("Second", None)).unwrap();

    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);
    assert!(first.content.is_empty());
    assert!(!first.is_folder);
    assert_eq!(service.active_note().unwrap(), Some(second.id));
}

#[test]
fn blank_titles_fall_back_to_defaults() {
    let conn = setup();
    let service = service(&conn);

    let note = service.add_note(NewNote::note("   ", None)).unwrap();
    let folder = service.add_note(NewNote::folder("", None)).unwrap();

    assert_eq!(note.title, "New Note");
    assert_eq!(folder.title, "New Folder");
    assert!(folder.is_folder);
}

#[test]
fn order_continues_after_max_even_with_gaps() {
    let conn = setup();
    let service = service(&conn);

    let folder = service.add_note(NewNote::folder("Folder", None)).unwrap();
    let a = service
        .add_note(NewNote::note("A", Some(folder.id)))
        .unwrap();
    service
        .add_note(NewNote::note("B", Some(folder.id)))
        .unwrap();
    conn.execute(
        "UPDATE notes SET sort_order = 7 WHERE id = ?1;",
        [a.id.to_string()],
    )
    .unwrap();

    let c = service
        .add_note(NewNote::note("C", Some(folder.id)))
        .unwrap();
    assert_eq!(c.order, 8);
}

#[test]
fn parent_must_exist_and_be_a_folder() {
    let conn = setup();
    let service = service(&conn);

    let plain = service.add_note(NewNote::note("Plain", None)).unwrap();
    let missing = Uuid::new_v4();

    match service.add_note(NewNote::note("Child", Some(plain.id))) {
        Err(NoteServiceError::ParentMustBeFolder(id)) => assert_eq!(id, plain.id),
        other => panic!("unexpected result: {other:?}"),
    }
    match service.add_note(NewNote::note("Child", Some(missing))) {
        Err(NoteServiceError::ParentNotFound(id)) => assert_eq!(id, missing),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn update_changes_fields_and_rejects_blank_title() {
    let conn = setup();
    let service = service(&conn);
    let note = service.add_note(NewNote::note("Draft", None)).unwrap();

    let updated = service
        .update_note(
            note.id,
            NotePatch {
                title: Some("  Final  ".to_string()),
                content: Some("# Heading".to_string()),
                tags: Some(vec!["Work".to_string(), "work".to_string()]),
                ..NotePatch::default()
            },
            None,
        )
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.content, "# Heading");
    assert_eq!(updated.tags, vec!["work".to_string()]);
    assert!(updated.updated_at >= note.updated_at);

    let blank = service.update_note(
        note.id,
        NotePatch {
            title: Some("   ".to_string()),
            ..NotePatch::default()
        },
        None,
    );
    assert!(matches!(blank, Err(NoteServiceError::InvalidTitle)));
}

#[test]
fn update_missing_note_is_not_found() {
    let conn = setup();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    let result = service.update_note(
        missing,
        NotePatch {
            content: Some("x".to_string()),
            ..NotePatch::default()
        },
        None,
    );
    assert!(matches!(result, Err(NoteServiceError::NoteNotFound(id)) if id == missing));
}

#[test]
fn delete_removes_descendants_and_clears_active_note() {
    let conn = setup();
    let service = service(&conn);

    let root = service.add_note(NewNote::folder("Root", None)).unwrap();
    let inner = service
        .add_note(NewNote::folder("Inner", Some(root.id)))
        .unwrap();
    let leaf = service
        .add_note(NewNote {
            tags: vec!["draft".to_string()],
            ..NewNote::note("Leaf", Some(inner.id))
        })
        .unwrap();
    let survivor = service.add_note(NewNote::note("Survivor", None)).unwrap();
    service.set_active_note(Some(leaf.id)).unwrap();

    let removed = service.delete_note(root.id, None).unwrap();

    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0], root.id);
    assert!(removed.contains(&inner.id));
    assert!(removed.contains(&leaf.id));
    assert_eq!(service.active_note().unwrap(), None);

    let remaining: Vec<NoteId> = service
        .list_notes()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(remaining, vec![survivor.id]);

    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 0);
}

#[test]
fn delete_keeps_active_note_outside_subtree() {
    let conn = setup();
    let service = service(&conn);

    let doomed = service.add_note(NewNote::note("Doomed", None)).unwrap();
    let kept = service.add_note(NewNote::note("Kept", None)).unwrap();

    service.delete_note(doomed.id, None).unwrap();
    assert_eq!(service.active_note().unwrap(), Some(kept.id));
}

#[test]
fn delete_missing_note_is_not_found() {
    let conn = setup();
    let service = service(&conn);
    let result = service.delete_note(Uuid::new_v4(), None);
    assert!(matches!(result, Err(NoteServiceError::NoteNotFound(_))));
}

#[test]
fn move_reorders_and_reindexes_both_sibling_lists() {
    let conn = setup();
    let service = service(&conn);

    let left = service.add_note(NewNote::folder("Left", None)).unwrap();
    let right = service.add_note(NewNote::folder("Right", None)).unwrap();
    let a = service.add_note(NewNote::note("A", Some(left.id))).unwrap();
    service.add_note(NewNote::note("B", Some(left.id))).unwrap();
    service.add_note(NewNote::note("C", Some(left.id))).unwrap();
    service.add_note(NewNote::note("X", Some(right.id))).unwrap();

    let moved = service.move_note(a.id, Some(right.id), Some(0)).unwrap();
    assert_eq!(moved.parent_id, Some(right.id));
    assert_eq!(moved.order, 0);

    assert_eq!(child_titles(&service, Some(right.id)), vec!["A", "X"]);
    assert_eq!(child_titles(&service, Some(left.id)), vec!["B", "C"]);
    let left_orders: Vec<i64> = service
        .list_children(Some(left.id))
        .unwrap()
        .into_iter()
        .map(|note| note.order)
        .collect();
    assert_eq!(left_orders, vec![0, 1]);
}

#[test]
fn move_within_same_parent_and_to_root() {
    let conn = setup();
    let service = service(&conn);

    let folder = service.add_note(NewNote::folder("Folder", None)).unwrap();
    let a = service.add_note(NewNote::note("A", Some(folder.id))).unwrap();
    service.add_note(NewNote::note("B", Some(folder.id))).unwrap();
    service.add_note(NewNote::note("C", Some(folder.id))).unwrap();

    service.move_note(a.id, Some(folder.id), Some(99)).unwrap();
    assert_eq!(child_titles(&service, Some(folder.id)), vec!["B", "C", "A"]);

    service.move_note(a.id, None, None).unwrap();
    assert_eq!(child_titles(&service, None), vec!["Folder", "A"]);
    assert_eq!(child_titles(&service, Some(folder.id)), vec!["B", "C"]);
}

#[test]
fn move_rejects_cycles_and_non_folder_targets() {
    let conn = setup();
    let service = service(&conn);

    let outer = service.add_note(NewNote::folder("Outer", None)).unwrap();
    let inner = service
        .add_note(NewNote::folder("Inner", Some(outer.id)))
        .unwrap();
    let leaf = service.add_note(NewNote::note("Leaf", None)).unwrap();

    assert!(matches!(
        service.move_note(outer.id, Some(inner.id), None),
        Err(NoteServiceError::CycleDetected { .. })
    ));
    assert!(matches!(
        service.move_note(outer.id, Some(outer.id), None),
        Err(NoteServiceError::CycleDetected { .. })
    ));
    assert!(matches!(
        service.move_note(inner.id, Some(leaf.id), None),
        Err(NoteServiceError::ParentMustBeFolder(_))
    ));
    assert_eq!(
        service.get_note(inner.id).unwrap().parent_id,
        Some(outer.id)
    );
}

#[test]
fn toggle_expand_flips_flag() {
    let conn = setup();
    let service = service(&conn);
    let folder = service.add_note(NewNote::folder("Folder", None)).unwrap();
    assert!(!folder.is_expanded);

    let expanded = service.toggle_folder_expand(folder.id).unwrap();
    assert!(expanded.is_expanded);
    let collapsed = service.toggle_folder_expand(folder.id).unwrap();
    assert!(!collapsed.is_expanded);
}

#[test]
fn tree_nests_children_in_order() {
    let conn = setup();
    let service = service(&conn);

    let folder = service.add_note(NewNote::folder("Folder", None)).unwrap();
    service.add_note(NewNote::note("One", Some(folder.id))).unwrap();
    service.add_note(NewNote::note("Two", Some(folder.id))).unwrap();
    service.add_note(NewNote::note("Loose", None)).unwrap();

    let tree = service.tree().unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].note.title, "Folder");
    let children: Vec<&str> = tree[0]
        .children
        .iter()
        .map(|node| node.note.title.as_str())
        .collect();
    assert_eq!(children, vec!["One", "Two"]);
    assert!(tree[1].children.is_empty());
}

#[test]
fn set_active_note_rejects_unknown_id_and_allows_clearing() {
    let conn = setup();
    let service = service(&conn);
    let note = service.add_note(NewNote::note("Note", None)).unwrap();

    assert!(matches!(
        service.set_active_note(Some(Uuid::new_v4())),
        Err(NoteServiceError::NoteNotFound(_))
    ));
    assert_eq!(service.active_note().unwrap(), Some(note.id));

    service.set_active_note(None).unwrap();
    assert_eq!(service.active_note().unwrap(), None);
}
