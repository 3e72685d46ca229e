//! Connection-scoped engine hooks installed once at open time.
//!
//! Databases created by other applications may reference collations and
//! full-text tokenizers that are not available here. A fallback collation
//! treats any unknown name as "all strings equal", and a no-op FTS3
//! tokenizer is registered under every custom tokenizer name found in the
//! schema, so such tables can still be listed and read.

use std::cmp::Ordering;
use std::os::raw::{c_char, c_int};
use std::ptr;

use rusqlite::config::DbConfig;
use rusqlite::ffi;

/// Tokenizers shipped with the engine; these are never replaced.
const BUILTIN_TOKENIZERS: &[&str] = &["simple", "porter", "unicode61", "icu"];

pub(crate) fn install(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.collation_needed(register_fallback_collation)?;
    install_tokenizers(conn)
}

fn register_fallback_collation(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<()> {
    log::debug!("[HOOKS] Registering fallback collation {}", name);
    conn.create_collation(name, |_, _| Ordering::Equal)
}

fn install_tokenizers(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    let names = {
        let mut stmt = conn.prepare(
            "SELECT sql FROM sqlite_schema WHERE type = 'table' AND sql IS NOT NULL",
        )?;
        let sqls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut names = Vec::new();
        for sql in &sqls {
            for name in tokenizer_names(sql) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    };

    if names.is_empty() {
        return Ok(());
    }

    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FTS3_TOKENIZER, true)?;

    let module: *const TokenizerModule = &NOOP_TOKENIZER;
    let pointer = (module as usize).to_ne_bytes();

    for name in names {
        log::debug!("[HOOKS] Registering no-op tokenizer {}", name);
        conn.query_row(
            "SELECT fts3_tokenizer(?1, ?2)",
            rusqlite::params![name, &pointer[..]],
            |_| Ok(()),
        )?;
    }

    Ok(())
}

/// Custom tokenizer names referenced by a `CREATE VIRTUAL TABLE ... USING
/// fts3/fts4 (...)` statement. Built-in tokenizers are not reported.
pub fn tokenizer_names(create_sql: &str) -> Vec<String> {
    let lower = create_sql.to_ascii_lowercase();
    if !lower.contains("fts3") && !lower.contains("fts4") {
        return Vec::new();
    }

    let mut names = Vec::new();
    let mut search_from = 0;

    while let Some(found) = lower[search_from..].find("tokenize") {
        let start = search_from + found + "tokenize".len();
        search_from = start;

        let rest = &create_sql[start..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '=');
        if trimmed.len() == rest.len() {
            // "tokenizer" or "tokenize_x": not the option keyword
            continue;
        }

        let name: String = trimmed
            .chars()
            .take_while(|c| !matches!(c, ',' | ')') && !c.is_whitespace())
            .collect();
        let name = name.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string();

        if name.is_empty()
            || BUILTIN_TOKENIZERS
                .iter()
                .any(|b| b.eq_ignore_ascii_case(&name))
        {
            continue;
        }

        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}

// Layout of sqlite3_tokenizer_module (version 0) from fts3_tokenizer.h.
#[repr(C)]
#[allow(dead_code)]
struct TokenizerModule {
    version: c_int,
    create: unsafe extern "C" fn(c_int, *const *const c_char, *mut *mut Tokenizer) -> c_int,
    destroy: unsafe extern "C" fn(*mut Tokenizer) -> c_int,
    open: unsafe extern "C" fn(
        *mut Tokenizer,
        *const c_char,
        c_int,
        *mut *mut TokenizerCursor,
    ) -> c_int,
    close: unsafe extern "C" fn(*mut TokenizerCursor) -> c_int,
    next: unsafe extern "C" fn(
        *mut TokenizerCursor,
        *mut *const c_char,
        *mut c_int,
        *mut c_int,
        *mut c_int,
        *mut c_int,
    ) -> c_int,
}

// The engine fills in the base pointers after create/open.
#[repr(C)]
#[allow(dead_code)]
struct Tokenizer {
    module: *const TokenizerModule,
}

#[repr(C)]
#[allow(dead_code)]
struct TokenizerCursor {
    tokenizer: *mut Tokenizer,
}

static NOOP_TOKENIZER: TokenizerModule = TokenizerModule {
    version: 0,
    create: noop_create,
    destroy: noop_destroy,
    open: noop_open,
    close: noop_close,
    next: noop_next,
};

unsafe extern "C" fn noop_create(
    _argc: c_int,
    _argv: *const *const c_char,
    out: *mut *mut Tokenizer,
) -> c_int {
    let tokenizer = Box::new(Tokenizer {
        module: ptr::null(),
    });
    unsafe {
        *out = Box::into_raw(tokenizer);
    }
    ffi::SQLITE_OK
}

unsafe extern "C" fn noop_destroy(tokenizer: *mut Tokenizer) -> c_int {
    if !tokenizer.is_null() {
        drop(unsafe { Box::from_raw(tokenizer) });
    }
    ffi::SQLITE_OK
}

unsafe extern "C" fn noop_open(
    _tokenizer: *mut Tokenizer,
    _input: *const c_char,
    _bytes: c_int,
    out: *mut *mut TokenizerCursor,
) -> c_int {
    let cursor = Box::new(TokenizerCursor {
        tokenizer: ptr::null_mut(),
    });
    unsafe {
        *out = Box::into_raw(cursor);
    }
    ffi::SQLITE_OK
}

unsafe extern "C" fn noop_close(cursor: *mut TokenizerCursor) -> c_int {
    if !cursor.is_null() {
        drop(unsafe { Box::from_raw(cursor) });
    }
    ffi::SQLITE_OK
}

unsafe extern "C" fn noop_next(
    _cursor: *mut TokenizerCursor,
    _token: *mut *const c_char,
    _bytes: *mut c_int,
    _start: *mut c_int,
    _end: *mut c_int,
    _position: *mut c_int,
) -> c_int {
    ffi::SQLITE_DONE
}
