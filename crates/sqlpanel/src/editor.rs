use std::collections::HashMap;

use sqlpanel_core::sql_dialect::quote_identifier;
use sqlpanel_core::{
    AppConfig, ColumnType, DbError, DbResult, Dialog, DialogHost, DialogItem, DialogResponse,
    ItemFlags, StorageClass, Value, parse_leading_f64, parse_leading_i64,
};
use sqlpanel_driver_sqlite::{Connection, Step};

const SAVE_BUTTON: &str = "Save";
const CANCEL_BUTTON: &str = "Cancel";
const MIN_DIALOG_WIDTH: usize = 30;

/// Horizontal space taken by the frame, margins and the `:` column.
const CHROME_WIDTH: usize = 12;

/// One editable field of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct EditField {
    pub name: String,
    pub value: String,
    pub column_type: ColumnType,
    pub read_only: bool,
}

impl EditField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            column_type,
            read_only: false,
        }
    }

    /// Value bound for `text` according to the field type.
    pub fn bind_value(&self, text: &str) -> Value {
        match self.column_type {
            ColumnType::Integer => Value::Int(parse_leading_i64(text)),
            ColumnType::Float => Value::Float(parse_leading_f64(text)),
            _ => Value::Text(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorLayout {
    pub display_width: usize,
    pub min_value_width: usize,
}

impl Default for EditorLayout {
    fn default() -> Self {
        Self {
            display_width: 80,
            min_value_width: 40,
        }
    }
}

impl From<&AppConfig> for EditorLayout {
    fn from(config: &AppConfig) -> Self {
        Self {
            display_width: config.display_width,
            min_value_width: config.min_value_width,
        }
    }
}

/// Editor dialog plus the item index of every field's edit box.
#[derive(Debug, Clone)]
pub struct EditorDialog {
    pub dialog: Dialog,
    pub edit_items: Vec<usize>,
    pub save_button: usize,
}

pub fn layout_dialog(title: &str, fields: &[EditField], layout: EditorLayout) -> EditorDialog {
    let label_width = fields.iter().map(|f| f.name.chars().count()).max().unwrap_or(0);
    let mut value_width = fields
        .iter()
        .map(|f| f.value.chars().count())
        .max()
        .unwrap_or(0)
        .max(layout.min_value_width);
    if label_width + value_width + CHROME_WIDTH > layout.display_width {
        value_width = layout.display_width.saturating_sub(label_width + CHROME_WIDTH);
    }

    let height = 6 + fields.len();
    let width = (CHROME_WIDTH + label_width + value_width).max(MIN_DIALOG_WIDTH);

    let mut dialog = Dialog::new(width, height);
    dialog.push(DialogItem::double_box(title, 3, 1, width - 4, height - 2));

    let label_x = 5;
    let colon_x = label_x + label_width;
    let edit_x = colon_x + 2;

    let mut edit_items = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let y = 2 + i;
        dialog.push(DialogItem::label(
            field.name.clone(),
            label_x,
            colon_x.saturating_sub(1).max(label_x),
            y,
        ));
        dialog.push(DialogItem::label(":", colon_x, colon_x, y));

        let mut flags = ItemFlags::empty();
        if i == 0 {
            flags |= ItemFlags::FOCUS;
        }
        if field.read_only {
            flags |= ItemFlags::READ_ONLY;
        }
        let edit_end = (edit_x + value_width).saturating_sub(1).max(edit_x);
        edit_items.push(dialog.push(
            DialogItem::edit(field.value.clone(), edit_x, edit_end, y).with_flags(flags),
        ));
    }

    dialog.push(DialogItem::separator(height - 4));
    let save_button =
        dialog.push(DialogItem::button(SAVE_BUTTON, height - 3).with_flags(ItemFlags::DEFAULT_BUTTON));
    dialog.push(DialogItem::button(CANCEL_BUTTON, height - 3));

    EditorDialog {
        dialog,
        edit_items,
        save_button,
    }
}

/// Fields whose edit box came back with a different value.
pub fn changed_fields(
    editor: &EditorDialog,
    fields: &[EditField],
    response: &DialogResponse,
) -> Vec<(EditField, String)> {
    if response.button != editor.save_button {
        return Vec::new();
    }

    fields
        .iter()
        .zip(&editor.edit_items)
        .filter(|(field, _)| !field.read_only)
        .filter_map(|(field, &item)| {
            let state = response.item(item)?;
            (state.changed && state.text != field.value).then(|| (field.clone(), state.text.clone()))
        })
        .collect()
}

/// Schema-driven editor for the rows of one table.
pub struct RowEditor<'a> {
    conn: &'a Connection,
    table: String,
    layout: EditorLayout,
}

impl<'a> RowEditor<'a> {
    pub fn new(conn: &'a Connection, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
            layout: EditorLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: EditorLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fields of an existing row, typed by the stored value.
    ///
    /// NULLs take the declared column type; blobs are shown as a read-only
    /// preview.
    pub fn load_row(&self, rowid: i64) -> DbResult<Vec<EditField>> {
        let declared: HashMap<String, ColumnType> = self
            .conn
            .column_description(&self.table)?
            .into_iter()
            .map(|c| (c.name, c.column_type))
            .collect();

        let sql = format!("SELECT * FROM {} WHERE rowid = ?", quote_identifier(&self.table));
        let mut stmt = self.conn.statement();
        stmt.prepare(&sql)?;
        stmt.bind(1, &Value::Int(rowid))?;
        let mut cursor = stmt.query()?;

        let Step::Row(row) = cursor.step()? else {
            return Err(DbError::RowNotFound {
                table: self.table.clone(),
                rowid,
            });
        };

        let mut fields = Vec::with_capacity(row.column_count());
        for i in 0..row.column_count() {
            let name = row.column_name(i).unwrap_or_default().to_string();
            let value = row.value(i);

            let column_type = match value.storage_class() {
                StorageClass::Integer => ColumnType::Integer,
                StorageClass::Float => ColumnType::Float,
                StorageClass::Text => ColumnType::Text,
                StorageClass::Blob => ColumnType::Blob,
                StorageClass::Null => match declared.get(&name) {
                    Some(ColumnType::Unknown) | None => ColumnType::Text,
                    Some(declared) => *declared,
                },
            };

            let mut field = EditField::new(name, value.to_cell_text(), column_type);
            field.read_only = column_type == ColumnType::Blob;
            fields.push(field);
        }

        Ok(fields)
    }

    /// Empty fields for a new row; blob columns are edited as text.
    pub fn blank_row(&self) -> DbResult<Vec<EditField>> {
        Ok(self
            .conn
            .column_description(&self.table)?
            .into_iter()
            .map(|c| {
                let column_type = match c.column_type {
                    ColumnType::Blob => ColumnType::Text,
                    other => other,
                };
                EditField::new(c.name, "", column_type)
            })
            .collect())
    }

    /// Edits row `rowid`. `Ok(false)` when cancelled or nothing changed.
    pub fn edit(&self, host: &mut dyn DialogHost, rowid: i64) -> DbResult<bool> {
        let fields = self.load_row(rowid)?;
        let title = format!("Edit {} [{}]", self.table, rowid);

        let changes = self.prompt(host, &title, &fields);
        if changes.is_empty() {
            return Ok(false);
        }

        let assignments: Vec<String> = changes
            .iter()
            .map(|(field, _)| format!("{} = ?", quote_identifier(&field.name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE rowid = {}",
            quote_identifier(&self.table),
            assignments.join(", "),
            rowid
        );

        self.commit(&sql, &changes)?;
        log::info!("[EDITOR] Updated {} fields of {} row {}", changes.len(), self.table, rowid);
        Ok(true)
    }

    /// Inserts a new row. `Ok(false)` when cancelled or every field was
    /// left untouched.
    pub fn insert(&self, host: &mut dyn DialogHost) -> DbResult<bool> {
        let fields = self.blank_row()?;
        let title = format!("Insert into {}", self.table);

        let changes = self.prompt(host, &title, &fields);
        if changes.is_empty() {
            return Ok(false);
        }

        let columns: Vec<String> = changes
            .iter()
            .map(|(field, _)| quote_identifier(&field.name))
            .collect();
        let placeholders = vec!["?"; changes.len()];
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );

        self.commit(&sql, &changes)?;
        log::info!(
            "[EDITOR] Inserted row {} into {}",
            self.conn.last_insert_rowid(),
            self.table
        );
        Ok(true)
    }

    fn prompt(
        &self,
        host: &mut dyn DialogHost,
        title: &str,
        fields: &[EditField],
    ) -> Vec<(EditField, String)> {
        let editor = layout_dialog(title, fields, self.layout);
        match host.run(&editor.dialog) {
            Some(response) => changed_fields(&editor, fields, &response),
            None => Vec::new(),
        }
    }

    fn commit(&self, sql: &str, changes: &[(EditField, String)]) -> DbResult<()> {
        log::debug!("[EDITOR] Executing: {}", sql);

        let mut stmt = self.conn.statement();
        stmt.prepare(sql)?;
        for (i, (field, text)) in changes.iter().enumerate() {
            stmt.bind(i + 1, &field.bind_value(text))?;
        }
        stmt.execute()?;
        Ok(())
    }
}
