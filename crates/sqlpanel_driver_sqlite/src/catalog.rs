use sqlpanel_core::sql_dialect::quote_identifier;
use sqlpanel_core::{Column, ColumnType, DbObject, DbResult, ObjectKind, Value, is_master_name};

use crate::connection::Connection;
use crate::statement::Step;

/// Informational pragmas shown by the database info view.
pub const PRAGMA_NAMES: &[&str] = &[
    "auto_vacuum",
    "automatic_index",
    "busy_timeout",
    "cache_size",
    "checkpoint_fullfsync",
    "encoding",
    "foreign_keys",
    "freelist_count",
    "fullfsync",
    "ignore_check_constraints",
    "integrity_check",
    "journal_mode",
    "journal_size_limit",
    "legacy_file_format",
    "locking_mode",
    "max_page_count",
    "page_count",
    "page_size",
    "quick_check",
    "read_uncommitted",
    "recursive_triggers",
    "reverse_unordered_selects",
    "schema_version",
    "secure_delete",
    "synchronous",
    "temp_store",
    "user_version",
    "wal_autocheckpoint",
    "wal_checkpoint",
];

const PRAGMA_LABEL_WIDTH: usize = 28;

/// `"<name>: "` padded to a fixed label column, followed by the value.
pub fn format_pragma_line(name: &str, value: &str) -> String {
    format!(
        "{:<width$}{}",
        format!("{}: ", name),
        value,
        width = PRAGMA_LABEL_WIDTH
    )
}

impl Connection {
    /// Every object in the schema catalog, preceded by the catalog itself.
    ///
    /// Tables, views and the catalog get their row count; a count that fails
    /// leaves `0` instead of failing the listing.
    pub fn list_objects(&self) -> DbResult<Vec<DbObject>> {
        let mut objects = vec![DbObject::master()];

        {
            let mut stmt = self.statement();
            stmt.prepare("SELECT name, type FROM sqlite_schema")?;
            let mut cursor = stmt.query()?;

            while let Step::Row(row) = cursor.step()? {
                objects.push(DbObject::new(
                    row.text(0),
                    ObjectKind::from_catalog_type(&row.text(1)),
                ));
            }
        }

        for object in objects.iter_mut().filter(|o| o.kind.has_row_count()) {
            object.row_count = self.row_count(&object.name).unwrap_or_else(|e| {
                log::warn!("[SCHEMA] Row count failed for {}: {}", object.name, e);
                0
            });
        }

        log::debug!("[SCHEMA] Listed {} objects", objects.len());
        Ok(objects)
    }

    /// Kind of the named object; names that cannot be resolved are
    /// `Unknown`.
    pub fn object_kind(&self, name: &str) -> ObjectKind {
        if is_master_name(name) {
            return ObjectKind::Master;
        }

        match self.catalog_type(name) {
            Ok(Some(type_name)) => ObjectKind::from_catalog_type(&type_name),
            Ok(None) => ObjectKind::Unknown,
            Err(e) => {
                log::warn!("[SCHEMA] Cannot resolve {}: {}", name, e);
                ObjectKind::Unknown
            }
        }
    }

    fn catalog_type(&self, name: &str) -> DbResult<Option<String>> {
        let mut stmt = self.statement();
        stmt.prepare("SELECT type FROM sqlite_schema WHERE name = ?1 COLLATE NOCASE")?;
        stmt.bind(1, &Value::Text(name.to_string()))?;

        let mut cursor = stmt.query()?;
        match cursor.step()? {
            Step::Row(row) => Ok(Some(row.text(0))),
            Step::Done => Ok(None),
        }
    }

    /// Columns of a table or view, typed from their declarations. Unknown
    /// objects have no columns.
    pub fn column_description(&self, name: &str) -> DbResult<Vec<Column>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(name));

        let mut stmt = self.statement();
        stmt.prepare(&sql)?;
        let mut cursor = stmt.query()?;

        let mut columns = Vec::new();
        while let Step::Row(row) = cursor.step()? {
            // cid, name, type, notnull, dflt_value, pk
            let declared = match row.value(2) {
                Value::Null => None,
                other => Some(other.as_text()),
            };
            columns.push(Column::new(
                row.text(1),
                ColumnType::from_declared(declared.as_deref()),
            ));
        }

        Ok(columns)
    }

    pub fn row_count(&self, name: &str) -> DbResult<u64> {
        let sql = format!("SELECT count(*) FROM {}", quote_identifier(name));

        let mut stmt = self.statement();
        stmt.prepare(&sql)?;
        let mut cursor = stmt.query()?;

        match cursor.step()? {
            Step::Row(row) => Ok(row.i64(0).max(0) as u64),
            Step::Done => Ok(0),
        }
    }

    /// `CREATE` statement stored in the catalog; `None` for the catalog
    /// itself and for objects without SQL (automatic indexes).
    pub fn creation_sql(&self, name: &str) -> DbResult<Option<String>> {
        if is_master_name(name) {
            return Ok(None);
        }

        let mut stmt = self.statement();
        stmt.prepare("SELECT sql FROM sqlite_schema WHERE name = ?1 COLLATE NOCASE")?;
        stmt.bind(1, &Value::Text(name.to_string()))?;

        let mut cursor = stmt.query()?;
        match cursor.step()? {
            Step::Row(row) => match row.value(0) {
                Value::Null => Ok(None),
                other => Ok(Some(other.as_text())),
            },
            Step::Done => Ok(None),
        }
    }

    /// Current values of [`PRAGMA_NAMES`]; pragmas that fail or return no
    /// row are left out.
    pub fn pragma_values(&self) -> Vec<(String, String)> {
        let mut values = Vec::with_capacity(PRAGMA_NAMES.len());

        for name in PRAGMA_NAMES {
            match self.pragma_value(name) {
                Ok(Some(value)) => values.push((name.to_string(), value)),
                Ok(None) => {}
                Err(e) => log::debug!("[SCHEMA] PRAGMA {} skipped: {}", name, e),
            }
        }

        values
    }

    fn pragma_value(&self, name: &str) -> DbResult<Option<String>> {
        let mut stmt = self.statement();
        stmt.prepare(&format!("PRAGMA {}", name))?;
        let mut cursor = stmt.query()?;

        match cursor.step()? {
            Step::Row(row) => Ok(Some(row.text(0))),
            Step::Done => Ok(None),
        }
    }
}
