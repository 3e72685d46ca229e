use crate::{ExportError, ExportSource, ExportSummary, Exporter, source_columns, stream_rows};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use sqlpanel_core::{ScanContext, Value};
use sqlpanel_driver_sqlite::Connection;
use std::io::Write;

const DELIMITER: u8 = b';';

/// `;`-separated values with a header row of column names.
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(
        &self,
        conn: &Connection,
        source: &ExportSource,
        writer: &mut dyn Write,
        ctx: &mut ScanContext<'_>,
    ) -> Result<ExportSummary, ExportError> {
        let columns = source_columns(conn, source)?;

        // Quoting is decided per field below.
        let mut csv_writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);

        csv_writer.write_record(columns.iter().map(|c| quote_field(&c.name)))?;

        let summary = stream_rows(conn, source, ctx, |values| {
            csv_writer.write_record(values.iter().map(value_to_csv_field))?;
            Ok(())
        })?;

        csv_writer.flush()?;
        Ok(summary)
    }
}

fn value_to_csv_field(value: &Value) -> String {
    match value {
        Value::Bytes(_) => value.to_cell_text(),
        _ => quote_field(&value.to_cell_text()),
    }
}

/// Wraps a field containing the delimiter in double quotes, doubling any
/// quote inside it.
fn quote_field(text: &str) -> String {
    if text.contains(DELIMITER as char) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_with_delimiter_is_quoted() {
        assert_eq!(quote_field("a;b\"c"), "\"a;b\"\"c\"");
    }

    #[test]
    fn quotes_without_delimiter_are_kept_raw() {
        assert_eq!(quote_field("say \"hi\""), "say \"hi\"");
    }

    #[test]
    fn blob_preview_is_never_quoted() {
        let value = Value::Bytes(vec![0x3B; 2]);
        assert_eq!(value_to_csv_field(&value), "[2]:0x3b3b");
    }

    #[test]
    fn null_is_empty_field() {
        assert_eq!(value_to_csv_field(&Value::Null), "");
    }
}
