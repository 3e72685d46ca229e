use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const USERS_ROWS: u64 = 3;
pub const EVENTS_ROWS: u64 = 250;

const SAMPLE_SCHEMA: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    score REAL,
    avatar BLOB,
    note VARCHAR(40)
);
INSERT INTO users (id, name, score, avatar, note) VALUES
    (1, 'alice', 4.5, X'DEADBEEF', 'first'),
    (2, 'bob', 1.0, NULL, 'a;b"c'),
    (3, 'carol', 0.5, NULL, NULL);

CREATE TABLE events (id INTEGER PRIMARY KEY, label TEXT);
WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 250)
INSERT INTO events (id, label) SELECT n, 'event ' || n FROM seq;

CREATE VIEW high_scores AS SELECT id, name, score FROM users WHERE score > 1;
CREATE INDEX idx_users_name ON users(name);
"#;

/// Database file inside a temporary directory; both are removed on drop.
pub struct SampleDatabase {
    dir: TempDir,
    path: PathBuf,
}

impl SampleDatabase {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Runs extra setup SQL through a separate connection.
    pub fn execute_batch(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.path).expect("open fixture database");
        conn.execute_batch(sql).expect("run fixture sql");
    }
}

/// Database with:
///
/// * `users(id, name, score, avatar, note)`: 3 rows, one blob, one note
///   containing `;` and `"`
/// * `events(id, label)`: 250 rows
/// * view `high_scores`, index `idx_users_name`
pub fn sample_database() -> SampleDatabase {
    database_with("sample.db", SAMPLE_SCHEMA)
}

/// Valid database file without any user objects.
pub fn empty_database() -> SampleDatabase {
    database_with("empty.db", "PRAGMA user_version = 1;")
}

pub fn database_with(file_name: &str, sql: &str) -> SampleDatabase {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(file_name);

    let conn = rusqlite::Connection::open(&path).expect("create fixture database");
    conn.execute_batch(sql).expect("populate fixture database");
    drop(conn);

    SampleDatabase { dir, path }
}
