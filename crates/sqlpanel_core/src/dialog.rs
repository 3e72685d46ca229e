//! Toolkit-independent dialog model.
//!
//! Dialogs are described as a list of positioned widgets. A host renders
//! them, lets the user interact and hands back a [`DialogResponse`] with the
//! pressed button and the final state of every widget, in item order.

use bitflags::bitflags;

use crate::report::ErrorReport;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u32 {
        const READ_ONLY = 1 << 0;
        const FOCUS = 1 << 1;
        const DEFAULT_BUTTON = 1 << 2;
        /// Buttons on the same row are centered as a group.
        const CENTER_GROUP = 1 << 3;
        const SEPARATOR = 1 << 4;
        const CHECKED = 1 << 5;
        /// First radio button of a mutually exclusive group.
        const GROUP_START = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    DoubleBox,
    Text,
    Edit,
    Button,
    RadioButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogItem {
    pub kind: ItemKind,
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
    pub text: String,
    pub flags: ItemFlags,
}

impl DialogItem {
    fn new(kind: ItemKind, x1: usize, y1: usize, x2: usize, y2: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            x1,
            y1,
            x2,
            y2,
            text: text.into(),
            flags: ItemFlags::empty(),
        }
    }

    pub fn double_box(title: impl Into<String>, x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self::new(ItemKind::DoubleBox, x1, y1, x2, y2, title)
    }

    pub fn label(text: impl Into<String>, x1: usize, x2: usize, y: usize) -> Self {
        Self::new(ItemKind::Text, x1, y, x2, y, text)
    }

    /// Horizontal line across the dialog at row `y`.
    pub fn separator(y: usize) -> Self {
        Self::new(ItemKind::Text, 0, y, 0, y, "").with_flags(ItemFlags::SEPARATOR)
    }

    pub fn edit(text: impl Into<String>, x1: usize, x2: usize, y: usize) -> Self {
        Self::new(ItemKind::Edit, x1, y, x2, y, text)
    }

    pub fn button(text: impl Into<String>, y: usize) -> Self {
        Self::new(ItemKind::Button, 0, y, 0, y, text).with_flags(ItemFlags::CENTER_GROUP)
    }

    pub fn radio(text: impl Into<String>, x1: usize, y: usize) -> Self {
        Self::new(ItemKind::RadioButton, x1, y, x1, y, text)
    }

    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(ItemFlags::READ_ONLY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub width: usize,
    pub height: usize,
    pub items: Vec<DialogItem>,
}

impl Dialog {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            items: Vec::new(),
        }
    }

    /// Appends an item and returns its index.
    pub fn push(&mut self, item: DialogItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn button_index(&self, label: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.kind == ItemKind::Button && item.text == label)
    }

    /// Response that presses `button` without touching any widget.
    pub fn untouched_response(&self, button: usize) -> DialogResponse {
        DialogResponse {
            button,
            items: self
                .items
                .iter()
                .map(|item| ItemState {
                    changed: false,
                    text: item.text.clone(),
                    checked: item.flags.contains(ItemFlags::CHECKED),
                })
                .collect(),
        }
    }
}

/// Final state of one widget after the dialog closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemState {
    pub changed: bool,
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogResponse {
    /// Index (into `Dialog::items`) of the button that closed the dialog.
    pub button: usize,
    pub items: Vec<ItemState>,
}

impl DialogResponse {
    pub fn item(&self, index: usize) -> Option<&ItemState> {
        self.items.get(index)
    }
}

/// Boundary to whatever toolkit shows dialogs and messages.
pub trait DialogHost {
    /// Shows the dialog modally. `None` when it was dismissed without a
    /// button.
    fn run(&mut self, dialog: &Dialog) -> Option<DialogResponse>;

    fn message(&mut self, report: &ErrorReport);

    fn confirm(&mut self, title: &str, question: &str) -> bool;
}
