use serde::{Deserialize, Serialize};

/// Name of the schema catalog table.
pub const MASTER_TABLE: &str = "sqlite_schema";

/// Legacy alias of [`MASTER_TABLE`], still accepted by the engine.
pub const LEGACY_MASTER_TABLE: &str = "sqlite_master";

/// Kind of a database object as listed in the schema catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Unknown,
    /// The schema catalog itself.
    Master,
    Table,
    View,
    Index,
}

impl ObjectKind {
    /// Maps the catalog's `type` column. Triggers and anything else are
    /// `Unknown`.
    pub fn from_catalog_type(type_name: &str) -> Self {
        if type_name.eq_ignore_ascii_case("table") {
            Self::Table
        } else if type_name.eq_ignore_ascii_case("view") {
            Self::View
        } else if type_name.eq_ignore_ascii_case("index") {
            Self::Index
        } else {
            Self::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Master => "master",
            Self::Table => "table",
            Self::View => "view",
            Self::Index => "index",
        }
    }

    /// Shown as a directory by the panel host.
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Master | Self::Table | Self::View)
    }

    /// Navigation only enters the catalog and plain tables.
    pub fn can_descend(self) -> bool {
        matches!(self, Self::Master | Self::Table)
    }

    pub fn has_row_count(self) -> bool {
        self.is_directory()
    }

    /// Keyword used by `DROP <keyword> <name>`; `None` for objects that
    /// cannot be dropped from the panel.
    pub fn drop_keyword(self) -> Option<&'static str> {
        match self {
            Self::Table => Some("TABLE"),
            Self::View => Some("VIEW"),
            Self::Index => Some("INDEX"),
            Self::Master | Self::Unknown => None,
        }
    }
}

pub fn is_master_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(MASTER_TABLE) || name.eq_ignore_ascii_case(LEGACY_MASTER_TABLE)
}

/// A named schema entity with its row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbObject {
    pub name: String,
    pub kind: ObjectKind,

    /// `count(*)` for tables, views and the catalog; `0` for indexes and
    /// for objects whose count failed.
    pub row_count: u64,
}

impl DbObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            row_count: 0,
        }
    }

    pub fn master() -> Self {
        Self::new(MASTER_TABLE, ObjectKind::Master)
    }
}

/// Semantic column type inferred from the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Blob,
    Text,
    Unknown,
}

const INTEGER_PREFIXES: &[&str] = &[
    "INT",
    "TINYINT",
    "SMALLINT",
    "MEDIUMINT",
    "BIGINT",
    "NUMERIC",
    "DECIMAL",
    "BOOLEAN",
];
const FLOAT_PREFIXES: &[&str] = &["REAL", "DOUBLE", "FLOAT"];

impl ColumnType {
    /// Classifies a declared type string by case-insensitive prefix.
    ///
    /// The result depends only on the declaration, never on the affinity of
    /// values actually stored in the column.
    pub fn from_declared(declared: Option<&str>) -> Self {
        let declared = match declared {
            Some(d) if !d.is_empty() => d,
            _ => return Self::Unknown,
        };

        if INTEGER_PREFIXES
            .iter()
            .any(|p| starts_with_ignore_case(declared, p))
        {
            Self::Integer
        } else if starts_with_ignore_case(declared, "BLOB") {
            Self::Blob
        } else if FLOAT_PREFIXES
            .iter()
            .any(|p| starts_with_ignore_case(declared, p))
        {
            Self::Float
        } else {
            Self::Text
        }
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_declarations() {
        for decl in ["INTEGER", "integer", "Int4", "BIGINT", "tinyint", "NUMERIC(10,2)", "boolean"] {
            assert_eq!(ColumnType::from_declared(Some(decl)), ColumnType::Integer, "{decl}");
        }
    }

    #[test]
    fn float_and_blob_declarations() {
        assert_eq!(ColumnType::from_declared(Some("REAL")), ColumnType::Float);
        assert_eq!(ColumnType::from_declared(Some("double precision")), ColumnType::Float);
        assert_eq!(ColumnType::from_declared(Some("Float8")), ColumnType::Float);
        assert_eq!(ColumnType::from_declared(Some("blob")), ColumnType::Blob);
    }

    #[test]
    fn everything_else_declared_is_text() {
        assert_eq!(ColumnType::from_declared(Some("varchar(10)")), ColumnType::Text);
        assert_eq!(ColumnType::from_declared(Some("DATETIME")), ColumnType::Text);
    }

    #[test]
    fn missing_declaration_is_unknown() {
        assert_eq!(ColumnType::from_declared(Some("")), ColumnType::Unknown);
        assert_eq!(ColumnType::from_declared(None), ColumnType::Unknown);
    }

    #[test]
    fn catalog_types_map_case_insensitively() {
        assert_eq!(ObjectKind::from_catalog_type("TABLE"), ObjectKind::Table);
        assert_eq!(ObjectKind::from_catalog_type("view"), ObjectKind::View);
        assert_eq!(ObjectKind::from_catalog_type("Index"), ObjectKind::Index);
        assert_eq!(ObjectKind::from_catalog_type("trigger"), ObjectKind::Unknown);
    }

    #[test]
    fn only_master_and_tables_descend() {
        assert!(ObjectKind::Master.can_descend());
        assert!(ObjectKind::Table.can_descend());
        assert!(!ObjectKind::View.can_descend());
        assert!(!ObjectKind::Index.can_descend());
        assert!(ObjectKind::View.is_directory());
        assert!(!ObjectKind::Index.is_directory());
    }

    #[test]
    fn master_names_are_recognized() {
        assert!(is_master_name("sqlite_schema"));
        assert!(is_master_name("SQLITE_MASTER"));
        assert!(!is_master_name("sqlite_sequence"));
    }
}
