use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use sqlpanel_core::{
    AppConfig, CancelToken, DbError, DialogHost, EntryKind, ErrorCategory, Listing, PanelEntry,
    PanelPosition, ScanContext,
};
use sqlpanel_driver_sqlite::format_pragma_line;

use crate::console::Console;
use crate::editor::RowEditor;
use crate::navigation::{DirectoryChange, Navigator, PanelFrame, SqlOutcome};
use crate::terminal::LogProgress;

const HELP: &str = "\
ls                   list the current panel
cd <name>|..         enter a table or go back
sql [text]           run SQL (repeats the last SQL when empty)
editor               edit the last SQL in $EDITOR and run it
edit <rowid>         edit a row of the current table
insert               insert a row into the current table
rm <name>...         drop objects or delete rows
export [name]        export an object or the current rows
view <name>          show an object as text or its creation SQL
create-sql <name>    print the creation SQL of an object
pragma               print database pragmas
pwd                  print the panel title
quit                 leave

In edit prompts an empty answer keeps the value and '' clears it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellControl {
    Continue,
    Quit,
}

/// Line commands over a navigator.
pub struct Shell {
    nav: Navigator,
    console: Console,
    config: AppConfig,
    cancel: CancelToken,
    position: PanelPosition,
    export_dir: PathBuf,
}

impl Shell {
    pub fn new(nav: Navigator, config: AppConfig) -> Self {
        let export_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            nav,
            console: Console::new(),
            config,
            cancel: CancelToken::new(),
            position: PanelPosition::default(),
            export_dir,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn into_navigator(self) -> Navigator {
        self.nav
    }

    /// Runs one command line. Database failures go to `host` as reports;
    /// only output failures are returned.
    pub fn execute(
        &mut self,
        line: &str,
        host: &mut dyn DialogHost,
        out: &mut dyn Write,
    ) -> io::Result<ShellControl> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => {}
            "quit" | "exit" => return Ok(ShellControl::Quit),
            "help" => writeln!(out, "{}", HELP)?,
            "pwd" => writeln!(out, "{}", self.nav.title())?,
            "ls" => self.list(host, out)?,
            "cd" => self.change_directory(rest, host, out)?,
            "sql" => {
                let sql = if rest.is_empty() {
                    self.console.last_sql().to_string()
                } else {
                    rest.to_string()
                };
                self.run_sql(&sql, host, out)?;
            }
            "editor" => self.edit_sql(host, out)?,
            "edit" => match rest.parse::<i64>() {
                Ok(rowid) => self.edit_row(rowid, host, out)?,
                Err(_) => writeln!(out, "usage: edit <rowid>")?,
            },
            "insert" => self.insert_row(host, out)?,
            "rm" => self.delete(rest, host, out)?,
            "export" => self.export(rest, host, out)?,
            "view" => self.view(rest, host, out)?,
            "create-sql" => match self.nav.connection().creation_sql(rest) {
                Ok(Some(sql)) => writeln!(out, "{}", sql)?,
                Ok(None) => writeln!(out, "{} has no creation SQL", rest)?,
                Err(e) => self.fail(host, ErrorCategory::Read, &e),
            },
            "pragma" => {
                for (name, value) in self.nav.connection().pragma_values() {
                    writeln!(out, "{}", format_pragma_line(&name, &value))?;
                }
            }
            other => writeln!(out, "Unknown command: {} (try help)", other)?,
        }

        Ok(ShellControl::Continue)
    }

    fn fail(&self, host: &mut dyn DialogHost, category: ErrorCategory, error: &DbError) {
        host.message(&self.nav.report(category, error));
    }

    fn scan_listing(&self) -> Result<Listing, DbError> {
        let cancel = self.cancel.clone();
        let mut progress = LogProgress;
        let mut ctx =
            ScanContext::new(&cancel, &mut progress).with_interval(self.config.progress_interval);
        self.nav.list(&mut ctx)
    }

    fn list(&mut self, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let listing = match self.scan_listing() {
            Ok(listing) => listing,
            Err(e) => {
                self.fail(host, ErrorCategory::Read, &e);
                return Ok(());
            }
        };

        let key = match self.nav.frame() {
            PanelFrame::Root => None,
            PanelFrame::TableRows { .. } => Some("rowid"),
            PanelFrame::QueryRows { .. } => Some("#"),
        };

        writeln!(out, "{}", self.nav.title())?;
        let mut headers: Vec<&str> = key.into_iter().collect();
        headers.extend(listing.headers.iter().map(String::as_str));
        writeln!(out, "{}", headers.join(" | "))?;

        for entry in &listing.entries {
            writeln!(out, "{}", render_entry(entry))?;
        }
        if !listing.complete {
            writeln!(out, "(listing cancelled)")?;
        }
        Ok(())
    }

    fn change_directory(
        &mut self,
        dir: &str,
        host: &mut dyn DialogHost,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        match self.nav.set_directory(dir, self.position) {
            Ok(DirectoryChange::Entered) => {
                self.position = PanelPosition::default();
                writeln!(out, "{}", self.nav.title())
            }
            Ok(DirectoryChange::Returned(position)) => {
                self.position = position;
                writeln!(out, "{}", self.nav.title())
            }
            Ok(DirectoryChange::Unchanged) => writeln!(out, "Cannot enter {}", dir),
            Err(e) => {
                self.fail(host, ErrorCategory::Read, &e);
                Ok(())
            }
        }
    }

    fn run_sql(&mut self, sql: &str, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        if sql.trim().is_empty() {
            return writeln!(out, "No SQL to run");
        }

        let cancel = self.cancel.clone();
        let mut progress = LogProgress;
        let mut ctx =
            ScanContext::new(&cancel, &mut progress).with_interval(self.config.progress_interval);

        match self.console.run(&mut self.nav, sql, self.position, &mut ctx) {
            Ok(SqlOutcome::QueryOpened) => {
                self.position = PanelPosition::default();
                writeln!(out, "{}", self.nav.title())
            }
            Ok(SqlOutcome::Executed { statements }) => {
                writeln!(out, "{} statement(s) executed", statements)
            }
            Ok(SqlOutcome::Cancelled { statements }) => {
                writeln!(out, "Cancelled after {} statement(s)", statements)
            }
            Err(e) => {
                self.fail(host, ErrorCategory::Sql, &e);
                Ok(())
            }
        }
    }

    fn edit_sql(&mut self, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let buffer = match self.console.edit_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                self.fail(host, ErrorCategory::WriteFile, &e);
                return Ok(());
            }
        };

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
        let status = Command::new(&editor).arg(buffer.path()).status()?;
        if !status.success() {
            return writeln!(out, "{} exited with {}", editor, status);
        }

        let sql = match self.console.read_back(buffer.path()) {
            Ok(sql) => sql.to_string(),
            Err(e) => {
                self.fail(host, ErrorCategory::ReadFile, &e);
                return Ok(());
            }
        };
        self.run_sql(&sql, host, out)
    }

    fn editor(&self) -> Option<RowEditor<'_>> {
        let table = self.nav.current_object()?;
        Some(RowEditor::new(self.nav.connection(), table).with_layout((&self.config).into()))
    }

    fn edit_row(&mut self, rowid: i64, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let Some(editor) = self.editor() else {
            return writeln!(out, "edit works inside a table");
        };

        match editor.edit(host, rowid) {
            Ok(true) => writeln!(out, "Row {} saved", rowid),
            Ok(false) => writeln!(out, "Nothing changed"),
            Err(e) => {
                self.fail(host, ErrorCategory::Sql, &e);
                Ok(())
            }
        }
    }

    fn insert_row(&mut self, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let Some(editor) = self.editor() else {
            return writeln!(out, "insert works inside a table");
        };

        match editor.insert(host) {
            Ok(true) => writeln!(
                out,
                "Row {} inserted",
                self.nav.connection().last_insert_rowid()
            ),
            Ok(false) => writeln!(out, "Nothing inserted"),
            Err(e) => {
                self.fail(host, ErrorCategory::Sql, &e);
                Ok(())
            }
        }
    }

    fn delete(&mut self, names: &str, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let listing = match self.scan_listing() {
            Ok(listing) => listing,
            Err(e) => {
                self.fail(host, ErrorCategory::Read, &e);
                return Ok(());
            }
        };

        let wanted: Vec<&str> = names.split_whitespace().collect();
        let selected: Vec<PanelEntry> = listing
            .items()
            .filter(|entry| wanted.contains(&entry.name.as_str()))
            .cloned()
            .collect();
        if selected.is_empty() {
            return writeln!(out, "Nothing to delete");
        }

        let question = format!("Delete {} item(s) from {}?", selected.len(), self.nav.title());
        if !host.confirm("Delete", &question) {
            return Ok(());
        }

        match self.nav.delete(&selected) {
            Ok(count) => writeln!(out, "{} deleted", count),
            Err(e) => {
                self.fail(host, ErrorCategory::Sql, &e);
                Ok(())
            }
        }
    }

    fn export(&mut self, name: &str, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let name = (!name.is_empty()).then_some(name);
        let Some(source) = self.nav.export_source(name) else {
            return writeln!(out, "Nothing to export");
        };

        let cancel = self.cancel.clone();
        let mut progress = LogProgress;
        let mut ctx =
            ScanContext::new(&cancel, &mut progress).with_interval(self.config.progress_interval);

        let format = self.config.default_export_format.into();
        match self
            .nav
            .export_with_dialog(host, &source, &self.export_dir, format, &mut ctx)
        {
            Ok(Some(summary)) if summary.cancelled => {
                writeln!(out, "Export cancelled after {} rows", summary.rows_written)
            }
            Ok(Some(summary)) => writeln!(out, "{} rows exported", summary.rows_written),
            Ok(None) => Ok(()),
            Err(e) => {
                self.fail(host, ErrorCategory::WriteFile, &e);
                Ok(())
            }
        }
    }

    fn view(&mut self, name: &str, host: &mut dyn DialogHost, out: &mut dyn Write) -> io::Result<()> {
        let cancel = self.cancel.clone();
        let mut progress = LogProgress;
        let mut ctx =
            ScanContext::new(&cancel, &mut progress).with_interval(self.config.progress_interval);

        match self.nav.view_object(name, &mut ctx) {
            Ok(file) => write!(out, "{}", read_view(file.path())?),
            Err(e) => {
                self.fail(host, ErrorCategory::WriteFile, &e);
                Ok(())
            }
        }
    }
}

fn read_view(path: &Path) -> io::Result<String> {
    let mut text = fs::read_to_string(path)?;
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

fn render_entry(entry: &PanelEntry) -> String {
    match entry.kind {
        EntryKind::Parent => entry.name.clone(),
        EntryKind::Row => {
            let mut cells = vec![entry.name.as_str()];
            cells.extend(entry.columns.iter().map(String::as_str));
            cells.join(" | ")
        }
        EntryKind::Object(_) => entry.columns.join(" | "),
    }
}
