mod app_config;
pub mod dialog;
mod error;
mod panel;
mod report;
mod schema;
pub mod sql_dialect;
mod task;
mod value;

pub use app_config::{AppConfig, AppConfigStore, DefaultExportFormat};
pub use dialog::{Dialog, DialogHost, DialogItem, DialogResponse, ItemFlags, ItemKind, ItemState};
pub use error::{DbError, DbResult, EngineError};
pub use panel::{EntryKind, Listing, PARENT_ENTRY, PanelEntry, PanelPosition};
pub use report::{ErrorCategory, ErrorReport, REPORT_TITLE};
pub use schema::{
    Column, ColumnType, DbObject, LEGACY_MASTER_TABLE, MASTER_TABLE, ObjectKind, is_master_name,
};
pub use task::{CancelToken, DEFAULT_PROGRESS_INTERVAL, NoProgress, ProgressSink, ScanContext};
pub use value::{
    MAX_BLOB_PREVIEW, StorageClass, Value, blob_preview, parse_leading_f64, parse_leading_i64,
};

/// Truncates `s` to at most `max_chars` characters, replacing the cut tail
/// with `...`. Counts characters, not bytes, so multi-byte text is never
/// split mid-character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn long_text_keeps_budget_minus_three() {
        assert_eq!(truncate_chars("abcdefghij", 6), "abc...");
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundary() {
        assert_eq!(truncate_chars("ééééé", 4), "é...");
    }
}
