use std::io::{BufRead, Write};

use sqlpanel_core::{
    Dialog, DialogHost, DialogResponse, ErrorReport, ItemFlags, ItemKind, ProgressSink,
};

/// Edit answer that clears the field; an empty answer keeps the value.
pub const CLEAR_ANSWER: &str = "''";

/// Line-oriented dialog host: every edit box becomes a prompt, radio groups
/// a choice, and buttons a final question.
pub struct TerminalHost<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Next input line without its terminator. `None` at end of input.
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                log::warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    pub fn prompt(&mut self, text: &str) -> Option<String> {
        self.write_raw(text);
        if let Err(e) = self.output.flush() {
            log::warn!("Failed to flush output: {}", e);
        }
        self.read_line()
    }

    pub fn say(&mut self, line: &str) {
        if let Err(e) = writeln!(self.output, "{}", line) {
            log::warn!("Failed to write output: {}", e);
        }
    }

    fn write_raw(&mut self, text: &str) {
        if let Err(e) = write!(self.output, "{}", text) {
            log::warn!("Failed to write output: {}", e);
        }
    }
}

impl<R: BufRead, W: Write> DialogHost for TerminalHost<R, W> {
    fn run(&mut self, dialog: &Dialog) -> Option<DialogResponse> {
        let buttons: Vec<usize> = dialog
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.kind == ItemKind::Button)
            .map(|(i, _)| i)
            .collect();
        let default_button = buttons
            .iter()
            .copied()
            .find(|&i| dialog.items[i].flags.contains(ItemFlags::DEFAULT_BUTTON))
            .or_else(|| buttons.first().copied())?;

        let mut response = dialog.untouched_response(default_button);
        let mut label: Option<&str> = None;
        let mut radios = Vec::new();

        for (index, item) in dialog.items.iter().enumerate() {
            match item.kind {
                ItemKind::DoubleBox => self.say(&format!("== {} ==", item.text)),
                ItemKind::Text if item.flags.contains(ItemFlags::SEPARATOR) => {}
                ItemKind::Text if item.text == ":" => {}
                ItemKind::Text => {
                    if let Some(pending) = label.replace(item.text.as_str()) {
                        self.say(pending);
                    }
                }
                ItemKind::Edit => {
                    let name = label.take().unwrap_or("value");
                    if item.is_read_only() {
                        self.say(&format!("{}: {} (read-only)", name, item.text));
                        continue;
                    }

                    let answer = self.prompt(&format!("{} [{}]: ", name, item.text))?;
                    let answer = match answer.as_str() {
                        "" => continue,
                        CLEAR_ANSWER => String::new(),
                        _ => answer,
                    };
                    let state = &mut response.items[index];
                    state.changed = answer != item.text;
                    state.text = answer;
                }
                ItemKind::RadioButton => radios.push(index),
                ItemKind::Button => {}
            }
        }
        if let Some(pending) = label {
            self.say(pending);
        }

        if !radios.is_empty() {
            let names: Vec<&str> = radios.iter().map(|&i| dialog.items[i].text.as_str()).collect();
            let current = radios
                .iter()
                .find(|&&i| response.items[i].checked)
                .map(|&i| dialog.items[i].text.as_str())
                .unwrap_or("");

            let answer = self.prompt(&format!("{} [{}]: ", names.join("/"), current))?;
            let chosen = radios
                .iter()
                .copied()
                .find(|&i| dialog.items[i].text.eq_ignore_ascii_case(answer.trim()));
            if let Some(chosen) = chosen {
                for &i in &radios {
                    let state = &mut response.items[i];
                    let checked = i == chosen;
                    state.changed = state.checked != checked;
                    state.checked = checked;
                }
            }
        }

        let names: Vec<&str> = buttons.iter().map(|&i| dialog.items[i].text.as_str()).collect();
        let answer = self.prompt(&format!(
            "{} [{}]: ",
            names.join("/"),
            dialog.items[default_button].text
        ))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Some(response);
        }

        response.button = buttons
            .iter()
            .copied()
            .find(|&i| dialog.items[i].text.eq_ignore_ascii_case(answer))?;
        Some(response)
    }

    fn message(&mut self, report: &ErrorReport) {
        self.say(&format!("!! {}", report.title));
        for line in report.lines() {
            self.say(&format!("   {}", line));
        }
    }

    fn confirm(&mut self, title: &str, question: &str) -> bool {
        self.prompt(&format!("{}: {} [y/N]: ", title, question))
            .is_some_and(|answer| answer.trim().to_ascii_lowercase().starts_with('y'))
    }
}

/// Progress sink that reports through the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&mut self, processed: u64, total: Option<u64>) {
        match total {
            Some(total) => log::debug!("[NAV] {}/{} rows", processed, total),
            None => log::debug!("[NAV] {} rows", processed),
        }
    }
}
