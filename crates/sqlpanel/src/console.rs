use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use sqlpanel_core::{DbResult, PanelPosition, ScanContext};
use tempfile::NamedTempFile;

use crate::navigation::{Navigator, SqlOutcome};

/// Largest script read back from an edit buffer.
pub const MAX_SCRIPT_BYTES: u64 = 1024 * 1024;

const UTF8_BOM: &str = "\u{feff}";

/// SQL console state: the last text that was run or edited.
#[derive(Debug, Default)]
pub struct Console {
    last_sql: String,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sql(&self) -> &str {
        &self.last_sql
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.last_sql = sql.into();
    }

    /// Remembers `sql` and runs it against the navigator.
    pub fn run(
        &mut self,
        nav: &mut Navigator,
        sql: &str,
        position: PanelPosition,
        ctx: &mut ScanContext<'_>,
    ) -> DbResult<SqlOutcome> {
        self.last_sql = sql.to_string();
        nav.run_sql(sql, position, ctx)
    }

    /// Writes the last SQL to a temporary `.sql` file for an external
    /// editor.
    pub fn edit_buffer(&self) -> DbResult<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("sqlpanel-")
            .suffix(".sql")
            .tempfile()?;
        file.write_all(self.last_sql.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Reads an edited buffer back and keeps it as the last SQL.
    ///
    /// At most [`MAX_SCRIPT_BYTES`] are read; a UTF-8 BOM and carriage
    /// returns are dropped.
    pub fn read_back(&mut self, path: &Path) -> DbResult<&str> {
        let mut bytes = Vec::new();
        File::open(path)?
            .take(MAX_SCRIPT_BYTES)
            .read_to_end(&mut bytes)?;

        let decoded = String::from_utf8_lossy(&bytes);
        let text = decoded.strip_prefix(UTF8_BOM).unwrap_or(&decoded);
        self.last_sql = text.replace('\r', "");

        log::debug!("[QUERY] Read {} bytes of SQL from {}", bytes.len(), path.display());
        Ok(&self.last_sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_buffer_round_trips_through_file() {
        let mut console = Console::new();
        console.set_sql("select 1;\n");

        let buffer = console.edit_buffer().expect("buffer");
        assert!(buffer.path().extension().is_some_and(|ext| ext == "sql"));

        std::fs::write(buffer.path(), "\u{feff}select 2;\r\nselect 3;\r\n").expect("write");
        assert_eq!(console.read_back(buffer.path()).expect("read"), "select 2;\nselect 3;\n");
        assert_eq!(console.last_sql(), "select 2;\nselect 3;\n");
    }

    #[test]
    fn oversized_buffer_is_cut() {
        let mut console = Console::new();
        let buffer = console.edit_buffer().expect("buffer");

        let big = "x".repeat(MAX_SCRIPT_BYTES as usize + 10);
        std::fs::write(buffer.path(), big).expect("write");

        let text = console.read_back(buffer.path()).expect("read");
        assert_eq!(text.len(), MAX_SCRIPT_BYTES as usize);
    }

    #[test]
    fn missing_buffer_is_an_io_error() {
        let mut console = Console::new();
        let err = console
            .read_back(Path::new("/nonexistent/sqlpanel.sql"))
            .unwrap_err();
        assert!(matches!(err, sqlpanel_core::DbError::IoError(_)));
    }
}
