use std::cell::RefCell;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use sqlpanel_core::{DbError, DbResult, EngineError};

use crate::hooks;
use crate::statement::Statement;

/// Magic string at offset 0 of every database file.
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

const SQLITE_NOTADB: i32 = 26;

pub fn is_sqlite_header(bytes: &[u8]) -> bool {
    bytes.len() >= SQLITE_HEADER.len() && &bytes[..SQLITE_HEADER.len()] == SQLITE_HEADER
}

/// Open handle to one database file.
///
/// Every failure that goes through the connection is recorded and can be
/// read back with [`Connection::last_error`].
pub struct Connection {
    conn: rusqlite::Connection,
    path: PathBuf,
    last_error: RefCell<Option<EngineError>>,
}

impl Connection {
    /// Opens an existing database and installs the engine hooks.
    ///
    /// Missing files are not created. A file the engine cannot read as a
    /// database fails with [`DbError::NotADatabase`].
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = rusqlite::Connection::open_with_flags(&path, flags)
            .map_err(|e| connection_error(&path, &e))?;

        // The file header is only read on first access.
        conn.query_row("SELECT count(*) FROM sqlite_schema", [], |_| Ok(()))
            .map_err(|e| connection_error(&path, &e))?;

        hooks::install(&conn).map_err(|e| connection_error(&path, &e))?;

        log::info!("[OPEN] {}", path.display());

        Ok(Self {
            conn,
            path,
            last_error: RefCell::new(None),
        })
    }

    /// Like [`Connection::open`], but rejects files without the database
    /// header before the engine touches them.
    pub fn open_checked(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let mut header = [0u8; 16];

        let mut file = File::open(path)?;
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(DbError::NotADatabase(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        if !is_sqlite_header(&header) {
            return Err(DbError::NotADatabase(path.to_path_buf()));
        }

        Self::open(path)
    }

    /// Closes the handle, logging a failed close.
    pub fn close(self) -> DbResult<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| {
            let err = connection_error(&path, &e);
            log::error!("[CLOSE] {}", err);
            err
        })
    }

    /// A constructed connection always holds an open handle.
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the database path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.last_error.borrow().clone()
    }

    pub fn statement(&self) -> Statement<'_> {
        Statement::new(self)
    }

    /// Prepares `sql` and runs its first step; a row or completion both
    /// count as success.
    pub fn execute_query(&self, sql: &str) -> DbResult<()> {
        let mut stmt = self.statement();
        stmt.prepare(sql)?;
        let mut cursor = stmt.query()?;
        cursor.step()?;
        Ok(())
    }

    /// Runs a statement without parameters to completion and returns the
    /// number of changed rows.
    pub fn execute(&self, sql: &str) -> DbResult<usize> {
        let mut stmt = self.statement();
        stmt.prepare(sql)?;
        stmt.execute()
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub fn changes(&self) -> u64 {
        self.conn.changes() as u64
    }

    pub(crate) fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Records an engine failure for `sql` and converts it.
    pub(crate) fn fail(&self, sql: &str, e: &rusqlite::Error) -> DbError {
        let engine = engine_error(e);
        log::error!("[QUERY] {}: {}", sql, engine);
        *self.last_error.borrow_mut() = Some(engine.clone());
        DbError::query(sql, engine)
    }
}

pub(crate) fn engine_error(e: &rusqlite::Error) -> EngineError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) => {
            let message = msg.clone().unwrap_or_else(|| err.to_string());
            EngineError::new(err.extended_code & 0xff, err.extended_code, message)
        }
        _ => EngineError::internal(e.to_string()),
    }
}

fn connection_error(path: &Path, e: &rusqlite::Error) -> DbError {
    let engine = engine_error(e);
    log::error!("[OPEN] {}: {}", path.display(), engine);

    if engine.code == SQLITE_NOTADB {
        return DbError::NotADatabase(path.to_path_buf());
    }

    DbError::ConnectionFailed {
        path: path.to_path_buf(),
        source: engine,
    }
}
