pub mod console;
pub mod editor;
pub mod navigation;
pub mod shell;
pub mod terminal;

pub use console::{Console, MAX_SCRIPT_BYTES};
pub use editor::{EditField, EditorLayout, RowEditor};
pub use navigation::{DirectoryChange, Navigator, PanelFrame, SqlOutcome};
