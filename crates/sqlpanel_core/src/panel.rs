use serde::{Deserialize, Serialize};

use crate::schema::{DbObject, ObjectKind};

/// Name of the entry that leads back to the parent frame.
pub const PARENT_ENTRY: &str = "..";

/// Scroll state of a panel, saved when a frame is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PanelPosition {
    pub top_row: usize,
    pub current_row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Parent,
    Object(ObjectKind),
    Row,
}

/// One line shown by the panel host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEntry {
    pub name: String,
    pub is_directory: bool,

    /// Row count for objects, rowid for table rows, ordinal for query rows.
    pub size: u64,

    pub kind: EntryKind,

    /// Custom column texts in display order.
    pub columns: Vec<String>,
}

impl PanelEntry {
    pub fn parent() -> Self {
        Self {
            name: PARENT_ENTRY.to_string(),
            is_directory: true,
            size: 0,
            kind: EntryKind::Parent,
            columns: Vec::new(),
        }
    }

    /// Root entry: name, kind label and row count.
    pub fn object(object: &DbObject) -> Self {
        Self {
            name: object.name.clone(),
            is_directory: object.kind.is_directory(),
            size: object.row_count,
            kind: EntryKind::Object(object.kind),
            columns: vec![
                object.name.clone(),
                object.kind.label().to_string(),
                object.row_count.to_string(),
            ],
        }
    }

    pub fn row(name: impl Into<String>, size: u64, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            size,
            kind: EntryKind::Row,
            columns,
        }
    }

    pub fn is_parent(&self) -> bool {
        self.kind == EntryKind::Parent
    }

    pub fn object_kind(&self) -> Option<ObjectKind> {
        match self.kind {
            EntryKind::Object(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Entries of the active frame plus column headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub headers: Vec<String>,
    pub entries: Vec<PanelEntry>,

    /// `false` when the scan was cancelled and only a prefix is listed.
    pub complete: bool,
}

impl Listing {
    /// Entries other than the `..` parent.
    pub fn items(&self) -> impl Iterator<Item = &PanelEntry> {
        self.entries.iter().filter(|e| !e.is_parent())
    }
}
