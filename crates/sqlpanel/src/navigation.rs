use std::io::{BufWriter, Write};
use std::path::Path;

use sqlpanel_core::sql_dialect::{is_select, quote_identifier, split_script};
use sqlpanel_core::{
    Column, ColumnType, DbError, DbResult, DialogHost, EntryKind, ErrorCategory, ErrorReport, Listing,
    ObjectKind, PanelEntry, PanelPosition, ScanContext, Value,
};
use sqlpanel_driver_sqlite::{Connection, Step};
use sqlpanel_export::{
    ExportFormat, ExportSource, ExportSummary, default_destination, export, export_to_file,
    prompt_export_options,
};
use tempfile::NamedTempFile;

/// What the active panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelFrame {
    Root,
    TableRows { object: String, columns: Vec<Column> },
    QueryRows { sql: String, columns: Vec<Column> },
}

static ROOT_FRAME: PanelFrame = PanelFrame::Root;

struct PushedFrame {
    frame: PanelFrame,
    saved: PanelPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryChange {
    Entered,
    /// Popped a frame; carries the position saved when it was pushed.
    Returned(PanelPosition),
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOutcome {
    /// A SELECT was validated and its rows are now the active frame.
    QueryOpened,
    /// Script fragments run in order.
    Executed { statements: usize },
    /// The scan context was cancelled between fragments.
    Cancelled { statements: usize },
}

/// Projects one database onto a stack of panel frames.
///
/// The root frame is implicit, so the stack is never empty.
pub struct Navigator {
    conn: Connection,
    stack: Vec<PushedFrame>,
}

impl Navigator {
    pub fn new(conn: Connection) -> Self {
        log::info!("[NAV] Browsing {}", conn.name());
        Self {
            conn,
            stack: Vec::new(),
        }
    }

    /// Opens `path` after checking the file header.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(Connection::open_checked(path)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub fn frame(&self) -> &PanelFrame {
        self.stack
            .last()
            .map(|pushed| &pushed.frame)
            .unwrap_or(&ROOT_FRAME)
    }

    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// Object whose rows are listed, if any.
    pub fn current_object(&self) -> Option<&str> {
        match self.frame() {
            PanelFrame::TableRows { object, .. } => Some(object),
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        let name = self.conn.name();
        match self.frame() {
            PanelFrame::Root => name,
            PanelFrame::TableRows { object, .. } => format!("{} [{}]", name, object),
            PanelFrame::QueryRows { sql, .. } => format!("{} [{}]", name, sql),
        }
    }

    /// Enters the rows of a table (or the schema table) from the root.
    ///
    /// Returns `false` for views, indexes, unknown names, objects without
    /// columns and when not at the root.
    pub fn descend(&mut self, name: &str, position: PanelPosition) -> DbResult<bool> {
        if !self.is_root() {
            return Ok(false);
        }

        let kind = self.conn.object_kind(name);
        if !kind.can_descend() {
            log::debug!("[NAV] {} ({}) has no rows to enter", name, kind.label());
            return Ok(false);
        }

        let columns = self.conn.column_description(name)?;
        if columns.is_empty() {
            return Ok(false);
        }

        log::debug!("[NAV] Entering {}", name);
        self.stack.push(PushedFrame {
            frame: PanelFrame::TableRows {
                object: name.to_string(),
                columns,
            },
            saved: position,
        });
        Ok(true)
    }

    /// Pops the active frame. `None` at the root.
    pub fn up(&mut self) -> Option<PanelPosition> {
        let pushed = self.stack.pop()?;
        log::debug!("[NAV] Leaving to depth {}", self.depth());
        Some(pushed.saved)
    }

    /// `..`, `/` and `\` go up one frame; anything else is a descend.
    pub fn set_directory(&mut self, dir: &str, position: PanelPosition) -> DbResult<DirectoryChange> {
        match dir {
            ".." | "/" | "\\" => Ok(self
                .up()
                .map(DirectoryChange::Returned)
                .unwrap_or(DirectoryChange::Unchanged)),
            name => Ok(if self.descend(name, position)? {
                DirectoryChange::Entered
            } else {
                DirectoryChange::Unchanged
            }),
        }
    }

    /// Runs console text.
    ///
    /// A SELECT is validated by its first step and pushed as a query frame.
    /// Anything else is split into `;\n` fragments executed in order; the
    /// first failing fragment ends the script and earlier ones stay applied.
    pub fn run_sql(
        &mut self,
        sql: &str,
        position: PanelPosition,
        ctx: &mut ScanContext<'_>,
    ) -> DbResult<SqlOutcome> {
        if is_select(sql) {
            let columns = self.query_columns(sql)?;
            log::info!("[QUERY] Opened query with {} columns", columns.len());
            self.stack.push(PushedFrame {
                frame: PanelFrame::QueryRows {
                    sql: sql.trim().to_string(),
                    columns,
                },
                saved: position,
            });
            return Ok(SqlOutcome::QueryOpened);
        }

        let fragments = split_script(sql);
        let total = fragments.len() as u64;
        let mut statements = 0;

        for fragment in fragments {
            self.conn.execute_query(fragment)?;
            statements += 1;

            if ctx.tick(statements as u64, Some(total)) {
                log::info!("[QUERY] Script cancelled after {} statements", statements);
                ctx.finish();
                return Ok(SqlOutcome::Cancelled { statements });
            }
        }

        ctx.finish();
        log::info!("[QUERY] Executed {} statements", statements);
        Ok(SqlOutcome::Executed { statements })
    }

    fn query_columns(&self, sql: &str) -> DbResult<Vec<Column>> {
        let mut stmt = self.conn.statement();
        stmt.prepare(sql)?;
        let names = stmt.column_names();

        let mut cursor = stmt.query()?;
        cursor.step()?;

        Ok(names
            .into_iter()
            .map(|name| Column::new(name, ColumnType::Text))
            .collect())
    }

    /// Materializes the active frame.
    pub fn list(&self, ctx: &mut ScanContext<'_>) -> DbResult<Listing> {
        match self.frame() {
            PanelFrame::Root => self.list_objects(),
            PanelFrame::TableRows { object, columns } => {
                let sql = format!("SELECT rowid, * FROM {}", quote_identifier(object));
                let total = self.conn.row_count(object).ok();
                self.list_rows(&sql, columns, true, total, ctx)
            }
            PanelFrame::QueryRows { sql, columns } => self.list_rows(sql, columns, false, None, ctx),
        }
    }

    fn list_objects(&self) -> DbResult<Listing> {
        let objects = self.conn.list_objects()?;

        Ok(Listing {
            headers: vec!["Name".into(), "Type".into(), "Rows".into()],
            entries: objects.iter().map(PanelEntry::object).collect(),
            complete: true,
        })
    }

    fn list_rows(
        &self,
        sql: &str,
        columns: &[Column],
        leading_rowid: bool,
        total: Option<u64>,
        ctx: &mut ScanContext<'_>,
    ) -> DbResult<Listing> {
        let mut listing = Listing {
            headers: columns.iter().map(|c| c.name.clone()).collect(),
            entries: vec![PanelEntry::parent()],
            complete: true,
        };

        let mut stmt = self.conn.statement();
        stmt.prepare(sql)?;
        let mut cursor = stmt.query()?;

        let mut processed = 0u64;
        while let Step::Row(row) = cursor.step()? {
            processed += 1;
            let values = row.values();

            let entry = if leading_rowid {
                let rowid = values.first().map(Value::as_i64).unwrap_or_default();
                let cells = values.iter().skip(1).map(Value::to_cell_text).collect();
                PanelEntry::row(rowid.to_string(), rowid.max(0) as u64, cells)
            } else {
                let cells = values.iter().map(Value::to_cell_text).collect();
                PanelEntry::row(processed.to_string(), processed, cells)
            };
            listing.entries.push(entry);

            if ctx.tick(processed, total) {
                log::info!("[NAV] Listing cancelled after {} rows", processed);
                listing.complete = false;
                break;
            }
        }

        ctx.finish();
        Ok(listing)
    }

    /// Drops objects (root) or deletes rows (table frame).
    ///
    /// Returns the number of dropped objects or deleted rows. Query frames
    /// and the `..` entry are never deleted.
    pub fn delete(&self, entries: &[PanelEntry]) -> DbResult<usize> {
        match self.frame() {
            PanelFrame::Root => {
                let mut dropped = 0;
                for entry in entries {
                    let Some(keyword) = entry.object_kind().and_then(ObjectKind::drop_keyword) else {
                        log::debug!("[NAV] Skipping {} on delete", entry.name);
                        continue;
                    };

                    let sql = format!("DROP {} {}", keyword, quote_identifier(&entry.name));
                    self.conn.execute(&sql)?;
                    log::info!("[SCHEMA] Dropped {} {}", keyword.to_lowercase(), entry.name);
                    dropped += 1;
                }
                Ok(dropped)
            }
            PanelFrame::TableRows { object, .. } => {
                let rowids: Vec<String> = entries
                    .iter()
                    .filter(|e| e.kind == EntryKind::Row)
                    .filter_map(|e| e.name.parse::<i64>().ok())
                    .map(|rowid| rowid.to_string())
                    .collect();

                if rowids.is_empty() {
                    return Ok(0);
                }

                let sql = format!(
                    "DELETE FROM {} WHERE rowid IN ({})",
                    quote_identifier(object),
                    rowids.join(",")
                );
                let deleted = self.conn.execute(&sql)?;
                log::info!("[QUERY] Deleted {} rows from {}", deleted, object);
                Ok(deleted)
            }
            PanelFrame::QueryRows { .. } => Ok(0),
        }
    }

    /// Writes a quick view of `name` to a temporary file.
    ///
    /// Tables and views become a text table; other objects their
    /// creation SQL. The file is removed when the handle is dropped.
    pub fn view_object(&self, name: &str, ctx: &mut ScanContext<'_>) -> DbResult<NamedTempFile> {
        if self.conn.object_kind(name).is_directory() {
            let mut file = temp_file(".txt")?;
            {
                let mut writer = BufWriter::new(file.as_file_mut());
                export(
                    &self.conn,
                    &ExportSource::Object(name.to_string()),
                    ExportFormat::Text,
                    &mut writer,
                    ctx,
                )?;
                writer.flush()?;
            }
            return Ok(file);
        }

        let sql = self.conn.creation_sql(name)?.unwrap_or_default();
        let mut file = temp_file(".sql")?;
        file.write_all(sql.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// What an export started on `name` (or on the frame itself) covers.
    pub fn export_source(&self, name: Option<&str>) -> Option<ExportSource> {
        match self.frame() {
            PanelFrame::Root => {
                let name = name?;
                self.conn
                    .object_kind(name)
                    .is_directory()
                    .then(|| ExportSource::Object(name.to_string()))
            }
            PanelFrame::TableRows { object, .. } => Some(ExportSource::Object(object.clone())),
            PanelFrame::QueryRows { sql, .. } => Some(ExportSource::Query(sql.clone())),
        }
    }

    /// Asks the host for destination and format, then exports.
    ///
    /// `Ok(None)` when the dialog was cancelled.
    pub fn export_with_dialog(
        &self,
        host: &mut dyn DialogHost,
        source: &ExportSource,
        dest_dir: &Path,
        format: ExportFormat,
        ctx: &mut ScanContext<'_>,
    ) -> DbResult<Option<ExportSummary>> {
        let stem = source.object_name().unwrap_or("query");
        let destination = default_destination(dest_dir, stem);

        let Some(options) = prompt_export_options(host, source.label(), &destination, format) else {
            log::debug!("[EXPORT] Export of {} cancelled", source.label());
            return Ok(None);
        };

        let summary = export_to_file(&self.conn, source, options.format, &options.path, ctx)?;
        Ok(Some(summary))
    }

    pub fn report(&self, category: ErrorCategory, error: &DbError) -> ErrorReport {
        ErrorReport::from_error(category, self.conn.name(), error)
    }
}

fn temp_file(suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("sqlpanel-")
        .suffix(suffix)
        .tempfile()
}
