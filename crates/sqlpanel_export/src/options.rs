use crate::ExportFormat;
use sqlpanel_core::{Dialog, DialogHost, DialogItem, DialogResponse, ItemFlags, truncate_chars};
use std::path::{Path, PathBuf};

const DIALOG_WIDTH: usize = 70;
const DIALOG_HEIGHT: usize = 11;
const LABEL_BUDGET: usize = 48;

pub const DESTINATION_ITEM: usize = 2;
pub const CSV_ITEM: usize = 4;
pub const TEXT_ITEM: usize = 5;
pub const EXPORT_BUTTON: usize = 7;

/// Destination and format picked in the export dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub path: PathBuf,
    pub format: ExportFormat,
}

/// `<dir>/<object>.txt`
pub fn default_destination(dir: &Path, object: &str) -> PathBuf {
    dir.join(format!("{}.txt", object))
}

pub fn export_dialog(source_label: &str, destination: &Path, format: ExportFormat) -> Dialog {
    let mut dialog = Dialog::new(DIALOG_WIDTH, DIALOG_HEIGHT);
    let right = DIALOG_WIDTH - 6;

    dialog.push(DialogItem::double_box(
        "Export",
        3,
        1,
        DIALOG_WIDTH - 4,
        DIALOG_HEIGHT - 2,
    ));
    dialog.push(DialogItem::label(
        format!("Export {} to:", truncate_chars(source_label, LABEL_BUDGET)),
        5,
        right,
        2,
    ));
    dialog.push(
        DialogItem::edit(destination.display().to_string(), 5, right, 3)
            .with_flags(ItemFlags::FOCUS),
    );
    dialog.push(DialogItem::separator(4));

    let (csv_flags, text_flags) = match format {
        ExportFormat::Csv => (ItemFlags::CHECKED, ItemFlags::empty()),
        ExportFormat::Text => (ItemFlags::empty(), ItemFlags::CHECKED),
    };
    dialog.push(
        DialogItem::radio(ExportFormat::Csv.name(), 5, 5)
            .with_flags(ItemFlags::GROUP_START | csv_flags),
    );
    dialog.push(DialogItem::radio(ExportFormat::Text.name(), 5, 6).with_flags(text_flags));
    dialog.push(DialogItem::separator(7));
    dialog.push(DialogItem::button("Export", 8).with_flags(ItemFlags::DEFAULT_BUTTON));
    dialog.push(DialogItem::button("Cancel", 8));

    dialog
}

/// `None` unless the dialog was closed with Export and a destination.
pub fn read_export_dialog(response: &DialogResponse) -> Option<ExportOptions> {
    if response.button != EXPORT_BUTTON {
        return None;
    }

    let path = response.item(DESTINATION_ITEM)?.text.trim();
    if path.is_empty() {
        return None;
    }

    let format = match response.item(TEXT_ITEM) {
        Some(state) if state.checked => ExportFormat::Text,
        _ => ExportFormat::Csv,
    };

    Some(ExportOptions {
        path: PathBuf::from(path),
        format,
    })
}

pub fn prompt_export_options(
    host: &mut dyn DialogHost,
    source_label: &str,
    destination: &Path,
    format: ExportFormat,
) -> Option<ExportOptions> {
    let dialog = export_dialog(source_label, destination, format);
    let response = host.run(&dialog)?;
    read_export_dialog(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlpanel_core::ItemKind;

    #[test]
    fn item_indexes_match_layout() {
        let dialog = export_dialog("users", Path::new("/tmp/users.txt"), ExportFormat::Csv);

        assert_eq!(dialog.items[DESTINATION_ITEM].kind, ItemKind::Edit);
        assert_eq!(dialog.items[DESTINATION_ITEM].text, "/tmp/users.txt");
        assert_eq!(dialog.items[CSV_ITEM].text, "CSV");
        assert!(dialog.items[CSV_ITEM].flags.contains(ItemFlags::CHECKED));
        assert_eq!(dialog.items[TEXT_ITEM].text, "Text");
        assert_eq!(dialog.button_index("Export"), Some(EXPORT_BUTTON));
    }

    #[test]
    fn untouched_dialog_returns_defaults() {
        let dialog = export_dialog("users", Path::new("/tmp/users.txt"), ExportFormat::Text);
        let response = dialog.untouched_response(EXPORT_BUTTON);

        let options = read_export_dialog(&response).expect("options");
        assert_eq!(options.path, PathBuf::from("/tmp/users.txt"));
        assert_eq!(options.format, ExportFormat::Text);
    }

    #[test]
    fn cancel_or_blank_destination_yields_nothing() {
        let dialog = export_dialog("users", Path::new("  "), ExportFormat::Csv);

        assert!(read_export_dialog(&dialog.untouched_response(EXPORT_BUTTON)).is_none());
        assert!(read_export_dialog(&dialog.untouched_response(EXPORT_BUTTON + 1)).is_none());
    }

    #[test]
    fn default_destination_uses_object_name() {
        assert_eq!(
            default_destination(Path::new("/data"), "users"),
            PathBuf::from("/data/users.txt")
        );
    }
}
