use rusqlite::types::{Null, ValueRef};
use sqlpanel_core::{DbError, DbResult, StorageClass, Value};

use crate::connection::Connection;

/// Holder for at most one prepared statement on a connection.
///
/// Preparing again finalizes the previous statement first.
pub struct Statement<'conn> {
    conn: &'conn Connection,
    stmt: Option<rusqlite::Statement<'conn>>,
    sql: String,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            stmt: None,
            sql: String::new(),
        }
    }

    pub fn prepare(&mut self, sql: &str) -> DbResult<()> {
        self.stmt = None;
        self.sql = sql.to_string();

        let conn: &'conn Connection = self.conn;
        let stmt = conn.raw().prepare(sql).map_err(|e| conn.fail(sql, &e))?;
        self.stmt = Some(stmt);
        Ok(())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn column_count(&self) -> usize {
        self.stmt.as_ref().map(|s| s.column_count()).unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .as_ref()
            .map(|s| s.column_names().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Binds `value` to the 1-based parameter `index`.
    pub fn bind(&mut self, index: usize, value: &Value) -> DbResult<()> {
        let conn = self.conn;
        let sql = &self.sql;
        let stmt = self.stmt.as_mut().ok_or_else(|| not_prepared(conn))?;

        let result = match value {
            Value::Null => stmt.raw_bind_parameter(index, Null),
            Value::Int(i) => stmt.raw_bind_parameter(index, *i),
            Value::Float(f) => stmt.raw_bind_parameter(index, *f),
            Value::Text(s) => stmt.raw_bind_parameter(index, s.as_str()),
            Value::Bytes(b) => stmt.raw_bind_parameter(index, b.as_slice()),
        };

        result.map_err(|e| conn.fail(sql, &e))
    }

    /// Starts iterating the result rows.
    pub fn query(&mut self) -> DbResult<Cursor<'_, 'conn>> {
        let conn = self.conn;
        let stmt = self.stmt.as_mut().ok_or_else(|| not_prepared(conn))?;
        let column_names = stmt.column_names().into_iter().map(String::from).collect();

        Ok(Cursor {
            rows: stmt.raw_query(),
            conn,
            sql: &self.sql,
            column_names,
        })
    }

    /// Runs the statement to completion and returns the number of changed
    /// rows.
    pub fn execute(&mut self) -> DbResult<usize> {
        let conn = self.conn;
        let sql = &self.sql;
        let stmt = self.stmt.as_mut().ok_or_else(|| not_prepared(conn))?;

        stmt.raw_execute().map_err(|e| conn.fail(sql, &e))
    }
}

fn not_prepared(conn: &Connection) -> DbError {
    log::warn!("[QUERY] Statement used before prepare on {}", conn.name());
    DbError::NotSupported("statement is not prepared".to_string())
}

/// Forward-only cursor over the rows of a running statement.
pub struct Cursor<'stmt, 'conn> {
    rows: rusqlite::Rows<'stmt>,
    conn: &'conn Connection,
    sql: &'stmt str,
    column_names: Vec<String>,
}

pub enum Step<'a, 'stmt> {
    Row(RowRef<'a, 'stmt>),
    Done,
}

impl<'stmt, 'conn> Cursor<'stmt, 'conn> {
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn step(&mut self) -> DbResult<Step<'_, 'stmt>> {
        match self.rows.next() {
            Ok(Some(row)) => Ok(Step::Row(RowRef {
                row,
                names: &self.column_names,
            })),
            Ok(None) => Ok(Step::Done),
            Err(e) => Err(self.conn.fail(self.sql, &e)),
        }
    }
}

/// Current row of a [`Cursor`], valid until the next step.
pub struct RowRef<'a, 'stmt> {
    row: &'a rusqlite::Row<'stmt>,
    names: &'a [String],
}

impl RowRef<'_, '_> {
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Value at the 0-based column `index`; out-of-range reads as NULL.
    pub fn value(&self, index: usize) -> Value {
        match self.row.get_ref(index) {
            Ok(ValueRef::Null) => Value::Null,
            Ok(ValueRef::Integer(i)) => Value::Int(i),
            Ok(ValueRef::Real(f)) => Value::Float(f),
            Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).to_string()),
            Ok(ValueRef::Blob(b)) => Value::Bytes(b.to_vec()),
            Err(_) => Value::Null,
        }
    }

    pub fn values(&self) -> Vec<Value> {
        (0..self.column_count()).map(|i| self.value(i)).collect()
    }

    pub fn storage_class(&self, index: usize) -> StorageClass {
        self.value(index).storage_class()
    }

    pub fn i64(&self, index: usize) -> i64 {
        self.value(index).as_i64()
    }

    pub fn f64(&self, index: usize) -> f64 {
        self.value(index).as_f64()
    }

    pub fn text(&self, index: usize) -> String {
        self.value(index).as_text()
    }

    pub fn blob(&self, index: usize) -> Vec<u8> {
        match self.value(index) {
            Value::Bytes(b) => b,
            Value::Null => Vec::new(),
            other => other.as_text().into_bytes(),
        }
    }
}
