use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by the SQLite engine itself.
///
/// Carries the primary result code, the extended result code and the
/// message returned by `sqlite3_errmsg` at the time of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: i32,
    pub extended_code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, extended_code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            extended_code,
            message: message.into(),
        }
    }

    /// Error raised by the wrapper rather than the engine (e.g. a type
    /// conversion that failed on the Rust side).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(-1, -1, message)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not a SQLite database: {}", .0.display())]
    NotADatabase(PathBuf),

    #[error("Connection failed: {}: {source}", .path.display())]
    ConnectionFailed { path: PathBuf, source: EngineError },

    #[error("Query failed: {sql}: {source}")]
    QueryFailed { sql: String, source: EngineError },

    #[error("Row {rowid} not found in {table}")]
    RowNotFound { table: String, rowid: i64 },

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub fn query(sql: impl Into<String>, source: EngineError) -> Self {
        Self::QueryFailed {
            sql: sql.into(),
            source,
        }
    }

    /// The SQL text that failed, when the failure came from a statement.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// The engine's `(code, message)` pair, when the engine was involved.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            Self::ConnectionFailed { source, .. } | Self::QueryFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
