mod csv;
mod options;
mod text;

use sqlpanel_core::sql_dialect::quote_identifier;
use sqlpanel_core::{Column, ColumnType, DbError, DefaultExportFormat, ScanContext, Value};
use sqlpanel_driver_sqlite::{Connection, Step};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub use crate::csv::CsvExporter;
pub use options::{
    CSV_ITEM, DESTINATION_ITEM, EXPORT_BUTTON, ExportOptions, TEXT_ITEM, default_destination,
    export_dialog, prompt_export_options, read_export_dialog,
};
pub use text::{DEFAULT_WIDTH, MAX_TEXT_WIDTH, TextExporter, probe_widths};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ExportError> for DbError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Db(e) => e,
            ExportError::Io(e) => DbError::IoError(e),
            ExportError::Csv(e) => DbError::IoError(std::io::Error::other(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Text,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Text => "Text",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

impl From<DefaultExportFormat> for ExportFormat {
    fn from(format: DefaultExportFormat) -> Self {
        match format {
            DefaultExportFormat::Csv => Self::Csv,
            DefaultExportFormat::Text => Self::Text,
        }
    }
}

/// What to export: a whole table or view, or the rows of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSource {
    Object(String),
    Query(String),
}

impl ExportSource {
    pub fn label(&self) -> &str {
        match self {
            Self::Object(name) => name,
            Self::Query(sql) => sql,
        }
    }

    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) => Some(name),
            Self::Query(_) => None,
        }
    }

    /// Statement producing the exported rows.
    pub fn select_sql(&self) -> String {
        match self {
            Self::Object(name) => format!("SELECT * FROM {}", quote_identifier(name)),
            Self::Query(sql) => sql.trim().trim_end_matches(';').trim_end().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub rows_written: u64,

    /// The scan stopped early on request; rows written so far stay.
    pub cancelled: bool,
}

pub trait Exporter {
    fn export(
        &self,
        conn: &Connection,
        source: &ExportSource,
        writer: &mut dyn Write,
        ctx: &mut ScanContext<'_>,
    ) -> Result<ExportSummary, ExportError>;
}

pub fn export(
    conn: &Connection,
    source: &ExportSource,
    format: ExportFormat,
    writer: &mut dyn Write,
    ctx: &mut ScanContext<'_>,
) -> Result<ExportSummary, ExportError> {
    let summary = match format {
        ExportFormat::Csv => CsvExporter.export(conn, source, writer, ctx)?,
        ExportFormat::Text => TextExporter.export(conn, source, writer, ctx)?,
    };

    log::info!(
        "[EXPORT] {} rows of {} as {}{}",
        summary.rows_written,
        source.label(),
        format.name(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    Ok(summary)
}

/// Exports into a newly created (or truncated) file.
pub fn export_to_file(
    conn: &Connection,
    source: &ExportSource,
    format: ExportFormat,
    path: &Path,
    ctx: &mut ScanContext<'_>,
) -> Result<ExportSummary, ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let summary = export(conn, source, format, &mut writer, ctx)?;
    writer.flush()?;

    Ok(summary)
}

/// Columns of the exported rows.
///
/// Objects use their declared columns; queries (and objects the catalog
/// cannot describe) use the statement's result names, typed as text.
pub fn source_columns(conn: &Connection, source: &ExportSource) -> Result<Vec<Column>, ExportError> {
    if let Some(name) = source.object_name() {
        let columns = conn.column_description(name)?;
        if !columns.is_empty() {
            return Ok(columns);
        }
    }

    let mut stmt = conn.statement();
    stmt.prepare(&source.select_sql())?;

    Ok(stmt
        .column_names()
        .into_iter()
        .map(|name| Column::new(name, ColumnType::Text))
        .collect())
}

/// Runs the source statement and hands every row to `on_row`, polling for
/// cancellation after each completed progress interval.
pub(crate) fn stream_rows<F>(
    conn: &Connection,
    source: &ExportSource,
    ctx: &mut ScanContext<'_>,
    mut on_row: F,
) -> Result<ExportSummary, ExportError>
where
    F: FnMut(&[Value]) -> Result<(), ExportError>,
{
    let total = source.object_name().and_then(|name| conn.row_count(name).ok());

    let mut stmt = conn.statement();
    stmt.prepare(&source.select_sql())?;
    let mut cursor = stmt.query()?;

    let mut summary = ExportSummary::default();
    while let Step::Row(row) = cursor.step()? {
        on_row(&row.values())?;
        summary.rows_written += 1;

        if ctx.tick(summary.rows_written, total) {
            log::info!(
                "[EXPORT] Cancelled after {} rows of {}",
                summary.rows_written,
                source.label()
            );
            summary.cancelled = true;
            break;
        }
    }

    ctx.finish();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_source_selects_quoted_name() {
        let source = ExportSource::Object("order items".into());
        assert_eq!(source.select_sql(), "SELECT * FROM \"order items\"");
        assert_eq!(source.object_name(), Some("order items"));
    }

    #[test]
    fn query_source_drops_trailing_semicolon() {
        let source = ExportSource::Query("  select * from t;  \n".into());
        assert_eq!(source.select_sql(), "select * from t");
        assert_eq!(source.object_name(), None);
    }

    #[test]
    fn format_names_and_extensions() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Text.name(), "Text");
        assert_eq!(ExportFormat::from(DefaultExportFormat::Text), ExportFormat::Text);
    }
}
