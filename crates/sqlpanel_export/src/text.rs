use crate::{ExportError, ExportSource, ExportSummary, Exporter, source_columns, stream_rows};
use sqlpanel_core::sql_dialect::quote_identifier;
use sqlpanel_core::{Column, MAX_BLOB_PREVIEW, ScanContext, Value, truncate_chars};
use sqlpanel_driver_sqlite::{Connection, Step};
use std::io::Write;

/// Column width used for every column when the width probe fails.
pub const DEFAULT_WIDTH: usize = 20;

/// Upper bound of a rendered column.
pub const MAX_TEXT_WIDTH: usize = 1024;

const COLUMN_SEPARATOR: &str = "│";
const HEADER_LINE: &str = "─";
const HEADER_CROSS: &str = "┼";

/// Fixed-width table with box-drawing column separators.
pub struct TextExporter;

impl Exporter for TextExporter {
    fn export(
        &self,
        conn: &Connection,
        source: &ExportSource,
        writer: &mut dyn Write,
        ctx: &mut ScanContext<'_>,
    ) -> Result<ExportSummary, ExportError> {
        let columns = source_columns(conn, source)?;
        let widths = probe_widths(conn, source, &columns);

        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        writer.write_all(render_line(&names, &widths).as_bytes())?;
        writer.write_all(render_separator(&widths).as_bytes())?;

        stream_rows(conn, source, ctx, |values| {
            let cells: Vec<String> = values.iter().map(Value::to_cell_text).collect();
            writer.write_all(render_line(&cells, &widths).as_bytes())?;
            Ok(())
        })
    }
}

/// Display width per column: the longest stored value (one aggregate query
/// over the source), at least the column name, at most
/// [`MAX_TEXT_WIDTH`]. Blobs count as their rendered preview. A failed
/// probe yields [`DEFAULT_WIDTH`] everywhere.
pub fn probe_widths(conn: &Connection, source: &ExportSource, columns: &[Column]) -> Vec<usize> {
    let measured = measure_lengths(conn, source, columns).unwrap_or_else(|e| {
        log::warn!("[EXPORT] Width probe failed for {}: {}", source.label(), e);
        vec![Some(DEFAULT_WIDTH); columns.len()]
    });

    columns
        .iter()
        .zip(measured)
        .map(|(column, longest)| {
            longest
                .unwrap_or(0)
                .max(column.name.chars().count())
                .min(MAX_TEXT_WIDTH)
        })
        .collect()
}

fn measure_lengths(
    conn: &Connection,
    source: &ExportSource,
    columns: &[Column],
) -> Result<Vec<Option<usize>>, ExportError> {
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let aggregates: Vec<String> = columns
        .iter()
        .map(|c| format!("max({})", rendered_length(&quote_identifier(&c.name))))
        .collect();
    // the newline keeps a trailing `--` comment from swallowing the paren
    let sql = format!(
        "SELECT {} FROM ({}\n)",
        aggregates.join(", "),
        source.select_sql()
    );

    let mut stmt = conn.statement();
    stmt.prepare(&sql)?;
    let mut cursor = stmt.query()?;

    match cursor.step()? {
        Step::Row(row) => Ok((0..columns.len())
            .map(|i| match row.value(i) {
                Value::Null => None,
                other => Some(other.as_i64().max(0) as usize),
            })
            .collect()),
        Step::Done => Ok(vec![None; columns.len()]),
    }
}

/// SQL length of a cell as rendered: `[<len>]:0x<hex>[...]` for blobs, the
/// character count otherwise.
fn rendered_length(column: &str) -> String {
    format!(
        "CASE typeof({c}) WHEN 'blob' THEN length(length({c})) + 4 + 2 * min(length({c}), {max}) \
         + (length({c}) > {max}) * 3 ELSE length({c}) END",
        c = column,
        max = MAX_BLOB_PREVIEW
    )
}

/// Pads cell `index` of `count`: the first gets a trailing space, middle
/// cells one space on each side, the last a leading space.
fn render_cell(text: &str, index: usize, count: usize, width: usize) -> String {
    let text = truncate_chars(text, width);
    let lead = if index > 0 { " " } else { "" };
    let total = cell_width(index, count, width);
    format!("{:<total$}", format!("{lead}{text}"))
}

fn cell_width(index: usize, count: usize, width: usize) -> usize {
    let middle = index > 0 && index + 1 < count;
    width + if middle { 2 } else { 1 }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let count = widths.len();
    let rendered: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            render_cell(text, i, count, width)
        })
        .collect();

    let mut line = rendered.join(COLUMN_SEPARATOR);
    line.push('\n');
    line
}

fn render_separator(widths: &[usize]) -> String {
    let count = widths.len();
    let segments: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| HEADER_LINE.repeat(cell_width(i, count, width)))
        .collect();

    let mut line = segments.join(HEADER_CROSS);
    line.push('\n');
    line
}
