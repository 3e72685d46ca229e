mod catalog;
mod connection;
mod hooks;
mod statement;

pub use catalog::{PRAGMA_NAMES, format_pragma_line};
pub use connection::{Connection, SQLITE_HEADER, is_sqlite_header};
pub use hooks::tokenizer_names;
pub use statement::{Cursor, RowRef, Statement, Step};
