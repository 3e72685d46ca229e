use sqlpanel::RowEditor;
use sqlpanel::editor::EditorLayout;
use sqlpanel_core::{ColumnType, DbError, ItemFlags, ItemKind, Value};
use sqlpanel_driver_sqlite::{Connection, Step};
use sqlpanel_test_support::ScriptedHost;
use sqlpanel_test_support::fixtures::{self, USERS_ROWS};

fn user_row(conn: &Connection, id: i64) -> Result<Vec<Value>, DbError> {
    let mut stmt = conn.statement();
    stmt.prepare("SELECT name, score, typeof(score), note FROM users WHERE id = ?1")?;
    stmt.bind(1, &Value::Int(id))?;
    let mut cursor = stmt.query()?;

    match cursor.step()? {
        Step::Row(row) => Ok(row.values()),
        Step::Done => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[test]
fn edit_updates_only_changed_fields() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save").with_edit("name", "bobby");
    assert!(editor.edit(&mut host, 2)?);

    let row = user_row(&conn, 2)?;
    assert_eq!(row[0], Value::Text("bobby".into()));
    assert_eq!(row[1], Value::Float(1.0));
    assert_eq!(row[3], Value::Text("a;b\"c".into()));
    assert_eq!(conn.changes(), 1);
    Ok(())
}

#[test]
fn edited_numbers_bind_by_field_type() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save").with_edit("score", "2.5abc");
    assert!(editor.edit(&mut host, 3)?);

    let row = user_row(&conn, 3)?;
    assert_eq!(row[1], Value::Float(2.5));
    assert_eq!(row[2], Value::Text("real".into()));
    Ok(())
}

#[test]
fn edit_dialog_shows_row_values() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Cancel");
    assert!(!editor.edit(&mut host, 1)?);

    let dialog = host.last_dialog().expect("dialog shown");
    assert_eq!(dialog.height, 11);
    assert_eq!(dialog.items[0].kind, ItemKind::DoubleBox);

    let edits: Vec<(&str, bool)> = dialog
        .items
        .iter()
        .filter(|item| item.kind == ItemKind::Edit)
        .map(|item| (item.text.as_str(), item.is_read_only()))
        .collect();
    assert_eq!(
        edits,
        vec![
            ("1", false),
            ("alice", false),
            ("4.5", false),
            ("[4]:0xdeadbeef", true),
            ("first", false),
        ]
    );
    Ok(())
}

#[test]
fn null_field_takes_declared_type() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let fields = editor.load_row(3)?;
    let note = fields.iter().find(|f| f.name == "note").expect("note field");
    assert_eq!(note.column_type, ColumnType::Text);
    assert_eq!(note.value, "");

    let avatar = fields.iter().find(|f| f.name == "avatar").expect("avatar field");
    assert_eq!(avatar.column_type, ColumnType::Blob);
    Ok(())
}

#[test]
fn untouched_save_is_a_no_op() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save").with_edit("name", "alice");
    assert!(!editor.edit(&mut host, 1)?);

    let mut dismissed = ScriptedHost::dismissing();
    assert!(!editor.edit(&mut dismissed, 1)?);
    assert_eq!(user_row(&conn, 1)?[0], Value::Text("alice".into()));
    Ok(())
}

#[test]
fn missing_row_is_reported() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save");
    let err = editor.edit(&mut host, 99).unwrap_err();

    assert!(matches!(err, DbError::RowNotFound { rowid: 99, .. }));
    assert!(host.dialogs.is_empty());
    Ok(())
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

#[test]
fn insert_binds_changed_fields() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save")
        .with_edit("name", "dave")
        .with_edit("score", "7");
    assert!(editor.insert(&mut host)?);

    let id = conn.last_insert_rowid();
    assert_eq!(id, 4);
    assert_eq!(conn.row_count("users")?, USERS_ROWS + 1);

    let row = user_row(&conn, id)?;
    assert_eq!(row[0], Value::Text("dave".into()));
    assert_eq!(row[1], Value::Float(7.0));
    assert_eq!(row[3], Value::Null);
    Ok(())
}

#[test]
fn insert_without_changes_is_rejected() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let mut host = ScriptedHost::pressing("Save");
    assert!(!editor.insert(&mut host)?);
    assert_eq!(conn.row_count("users")?, USERS_ROWS);
    Ok(())
}

#[test]
fn insert_dialog_makes_blob_columns_editable() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    let fields = editor.blank_row()?;
    let avatar = fields.iter().find(|f| f.name == "avatar").expect("avatar field");
    assert_eq!(avatar.column_type, ColumnType::Text);
    assert!(!avatar.read_only);

    let mut host = ScriptedHost::pressing("Cancel");
    editor.insert(&mut host)?;
    let dialog = host.last_dialog().expect("dialog shown");
    assert!(
        dialog
            .items
            .iter()
            .filter(|item| item.kind == ItemKind::Edit)
            .all(|item| !item.flags.contains(ItemFlags::READ_ONLY))
    );
    Ok(())
}

#[test]
fn failed_commit_carries_sql_and_engine_error() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users");

    // name is NOT NULL and left out
    let mut host = ScriptedHost::pressing("Save").with_edit("score", "1");
    let err = editor.insert(&mut host).unwrap_err();

    assert_eq!(
        err.sql(),
        Some("INSERT INTO \"users\" (\"score\") VALUES (?)")
    );
    assert_eq!(err.engine().map(|e| e.code), Some(19));
    Ok(())
}

#[test]
fn narrow_display_shrinks_edit_boxes() -> Result<(), DbError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let editor = RowEditor::new(&conn, "users").with_layout(EditorLayout {
        display_width: 50,
        min_value_width: 40,
    });

    let mut host = ScriptedHost::pressing("Cancel");
    editor.edit(&mut host, 1)?;

    // longest label is "avatar"
    let dialog = host.last_dialog().expect("dialog shown");
    assert_eq!(dialog.width, 50);
    let edit = dialog
        .items
        .iter()
        .find(|item| item.kind == ItemKind::Edit)
        .expect("edit box");
    assert_eq!(edit.x2 - edit.x1 + 1, 50 - 6 - 12);
    Ok(())
}
