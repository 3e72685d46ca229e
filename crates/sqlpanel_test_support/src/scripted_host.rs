use sqlpanel_core::{Dialog, DialogHost, DialogResponse, ErrorReport, ItemFlags, ItemKind};

/// Dialog host that answers every dialog from a fixed script and records
/// what it was shown.
///
/// Edits are matched by the text of the label preceding an edit box, or by
/// item index.
#[derive(Default)]
pub struct ScriptedHost {
    button: Option<String>,
    edits: Vec<(String, String)>,
    edits_at: Vec<(usize, String)>,
    choice: Option<String>,
    confirm_answer: bool,

    pub dialogs: Vec<Dialog>,
    pub messages: Vec<ErrorReport>,
    pub confirmations: Vec<String>,
}

impl ScriptedHost {
    /// Closes every dialog with the button labelled `button`.
    pub fn pressing(button: impl Into<String>) -> Self {
        Self {
            button: Some(button.into()),
            confirm_answer: true,
            ..Default::default()
        }
    }

    /// Dismisses every dialog without pressing a button.
    pub fn dismissing() -> Self {
        Self {
            confirm_answer: true,
            ..Default::default()
        }
    }

    pub fn with_edit(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.edits.push((label.into(), text.into()));
        self
    }

    pub fn with_edit_at(mut self, index: usize, text: impl Into<String>) -> Self {
        self.edits_at.push((index, text.into()));
        self
    }

    /// Selects the radio button labelled `label`.
    pub fn with_choice(mut self, label: impl Into<String>) -> Self {
        self.choice = Some(label.into());
        self
    }

    pub fn with_confirm(mut self, answer: bool) -> Self {
        self.confirm_answer = answer;
        self
    }

    pub fn last_dialog(&self) -> Option<&Dialog> {
        self.dialogs.last()
    }
}

impl DialogHost for ScriptedHost {
    fn run(&mut self, dialog: &Dialog) -> Option<DialogResponse> {
        self.dialogs.push(dialog.clone());

        let button = dialog.button_index(self.button.as_deref()?)?;
        let mut response = dialog.untouched_response(button);
        let mut last_label = "";

        for (index, item) in dialog.items.iter().enumerate() {
            match item.kind {
                ItemKind::Text if !item.flags.contains(ItemFlags::SEPARATOR) && item.text != ":" => {
                    last_label = item.text.as_str();
                }
                ItemKind::Edit if !item.is_read_only() => {
                    let scripted = self
                        .edits_at
                        .iter()
                        .find(|(i, _)| *i == index)
                        .map(|(_, text)| text.clone())
                        .or_else(|| {
                            self.edits
                                .iter()
                                .find(|(label, _)| label == last_label)
                                .map(|(_, text)| text.clone())
                        });

                    if let Some(text) = scripted {
                        let state = &mut response.items[index];
                        state.changed = state.text != text;
                        state.text = text;
                    }
                }
                ItemKind::RadioButton => {
                    if let Some(choice) = &self.choice {
                        let state = &mut response.items[index];
                        let checked = &item.text == choice;
                        state.changed = state.checked != checked;
                        state.checked = checked;
                    }
                }
                _ => {}
            }
        }

        Some(response)
    }

    fn message(&mut self, report: &ErrorReport) {
        self.messages.push(report.clone());
    }

    fn confirm(&mut self, _title: &str, question: &str) -> bool {
        self.confirmations.push(question.to_string());
        self.confirm_answer
    }
}
