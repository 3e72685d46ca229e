use std::fmt;

use crate::error::{DbError, EngineError};

/// Title shown on every message box.
pub const REPORT_TITLE: &str = "SQLite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Open,
    Read,
    Sql,
    ReadFile,
    WriteFile,
}

impl ErrorCategory {
    pub fn message(self) -> &'static str {
        match self {
            ErrorCategory::Open => "Unable to open database",
            ErrorCategory::Read => "Unable to read data",
            ErrorCategory::Sql => "SQL query failed",
            ErrorCategory::ReadFile => "Unable to read file",
            ErrorCategory::WriteFile => "Unable to write file",
        }
    }
}

/// User-visible failure, rendered by the dialog host as message lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub title: String,
    pub category: ErrorCategory,

    /// Display name of the database the failure happened on.
    pub database: String,

    /// Failing SQL text or file path.
    pub subject: Option<String>,

    pub engine: Option<EngineError>,

    /// Free-form detail for failures the engine did not report.
    pub detail: Option<String>,
}

impl ErrorReport {
    pub fn new(category: ErrorCategory, database: impl Into<String>) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            category,
            database: database.into(),
            subject: None,
            engine: None,
            detail: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_engine(mut self, engine: EngineError) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds a report from a propagated error, picking up the failing SQL
    /// and the engine pair when present.
    pub fn from_error(category: ErrorCategory, database: impl Into<String>, error: &DbError) -> Self {
        let mut report = Self::new(category, database);

        if let Some(sql) = error.sql() {
            report.subject = Some(sql.to_string());
        }

        match error.engine() {
            Some(engine) => report.engine = Some(engine.clone()),
            None => report.detail = Some(error.to_string()),
        }

        report
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.category.message().to_string(), self.database.clone()];

        if let Some(subject) = &self.subject {
            lines.push(subject.clone());
        }

        if let Some(engine) = &self.engine {
            lines.push(format!("Error: {}", engine));
        }

        if let Some(detail) = &self.detail {
            lines.push(detail.clone());
        }

        lines
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.lines().join("\n"))
    }
}
