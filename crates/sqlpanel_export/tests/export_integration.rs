use sqlpanel_core::{CancelToken, NoProgress, ProgressSink, ScanContext};
use sqlpanel_driver_sqlite::Connection;
use sqlpanel_export::{ExportError, ExportFormat, ExportSource, export, export_to_file, probe_widths, source_columns};
use sqlpanel_test_support::fixtures::{self, EVENTS_ROWS};

fn export_string(
    conn: &Connection,
    source: &ExportSource,
    format: ExportFormat,
) -> Result<String, ExportError> {
    let cancel = CancelToken::new();
    let mut progress = NoProgress;
    let mut ctx = ScanContext::new(&cancel, &mut progress);

    let mut buf = Vec::new();
    export(conn, source, format, &mut buf, &mut ctx)?;
    Ok(String::from_utf8(buf).expect("utf-8 output"))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn csv_export_of_table() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;

    let out = export_string(&conn, &ExportSource::Object("users".into()), ExportFormat::Csv)?;

    assert_eq!(
        out,
        "id;name;score;avatar;note\n\
         1;alice;4.5;[4]:0xdeadbeef;first\n\
         2;bob;1.0;;\"a;b\"\"c\"\n\
         3;carol;0.5;;\n"
    );
    Ok(())
}

#[test]
fn csv_replaces_control_characters() -> Result<(), ExportError> {
    let db = fixtures::database_with(
        "ctl.db",
        "CREATE TABLE notes (id INTEGER, body TEXT);
         INSERT INTO notes VALUES (1, 'two' || char(10) || 'lines' || char(9) || 'tab');",
    );
    let conn = Connection::open(db.path())?;

    let out = export_string(&conn, &ExportSource::Object("notes".into()), ExportFormat::Csv)?;

    assert_eq!(out, "id;body\n1;two lines tab\n");
    Ok(())
}

#[test]
fn csv_export_of_query() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;

    let source = ExportSource::Query("SELECT name, score * 2 AS doubled FROM users WHERE id <= 2;".into());
    let out = export_string(&conn, &source, ExportFormat::Csv)?;

    assert_eq!(out, "name;doubled\nalice;9.0\nbob;2.0\n");
    Ok(())
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[test]
fn text_width_is_longest_of_value_and_name() -> Result<(), ExportError> {
    let db = fixtures::database_with(
        "widths.db",
        "CREATE TABLE t (abc TEXT, z TEXT);
         INSERT INTO t VALUES ('xy', 'longer');",
    );
    let conn = Connection::open(db.path())?;
    let source = ExportSource::Object("t".into());

    let columns = source_columns(&conn, &source)?;
    assert_eq!(probe_widths(&conn, &source, &columns), vec![3, 6]);

    let out = export_string(&conn, &source, ExportFormat::Text)?;
    assert_eq!(
        out,
        "abc │ z     \n\
         ────┼───────\n\
         xy  │ longer\n"
    );
    Ok(())
}

#[test]
fn empty_table_widths_fall_back_to_names() -> Result<(), ExportError> {
    let db = fixtures::database_with("empty_t.db", "CREATE TABLE t (name TEXT, n INTEGER);");
    let conn = Connection::open(db.path())?;
    let source = ExportSource::Object("t".into());

    let columns = source_columns(&conn, &source)?;
    assert_eq!(probe_widths(&conn, &source, &columns), vec![4, 1]);
    Ok(())
}

#[test]
fn text_export_of_view_has_header_and_separator() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;

    let out = export_string(&conn, &ExportSource::Object("high_scores".into()), ExportFormat::Text)?;
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id │ name  │ score"));
    assert!(lines[1].contains('┼'));
    assert!(lines[2].starts_with("1  │ alice │ 4.5"));
    Ok(())
}

#[test]
fn query_ending_in_comment_is_still_measured() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let source = ExportSource::Query("select name from users -- all".into());

    let columns = source_columns(&conn, &source)?;
    assert_eq!(probe_widths(&conn, &source, &columns), vec![5]);
    Ok(())
}

#[test]
fn blob_columns_fit_their_preview() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let source = ExportSource::Object("users".into());

    let columns = source_columns(&conn, &source)?;
    assert_eq!(probe_widths(&conn, &source, &columns), vec![2, 5, 5, 14, 5]);

    let out = export_string(&conn, &source, ExportFormat::Text)?;
    assert!(out.contains(" [4]:0xdeadbeef "));
    Ok(())
}

// ---------------------------------------------------------------------------
// Reals
// ---------------------------------------------------------------------------

fn reals_database() -> fixtures::SampleDatabase {
    fixtures::database_with(
        "reals.db",
        "CREATE TABLE m (v REAL);
         INSERT INTO m VALUES (0.1 + 0.2), (1e20);",
    )
}

#[test]
fn csv_reals_match_engine_text() -> Result<(), ExportError> {
    let db = reals_database();
    let conn = Connection::open(db.path())?;

    let out = export_string(&conn, &ExportSource::Object("m".into()), ExportFormat::Csv)?;
    assert_eq!(out, "v\n0.3\n1.0e+20\n");

    let engine = export_string(
        &conn,
        &ExportSource::Query("SELECT CAST(v AS TEXT) AS v FROM m".into()),
        ExportFormat::Csv,
    )?;
    assert_eq!(out, engine);
    Ok(())
}

#[test]
fn text_reals_fit_probed_width() -> Result<(), ExportError> {
    let db = reals_database();
    let conn = Connection::open(db.path())?;
    let source = ExportSource::Object("m".into());

    let columns = source_columns(&conn, &source)?;
    assert_eq!(probe_widths(&conn, &source, &columns), vec![7]);

    let out = export_string(&conn, &source, ExportFormat::Text)?;
    assert_eq!(
        out,
        "v       \n\
         ────────\n\
         0.3     \n\
         1.0e+20 \n"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress and cancellation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CancelAt {
    token: CancelToken,
    at: u64,
    seen: Vec<(u64, Option<u64>)>,
}

impl ProgressSink for CancelAt {
    fn update(&mut self, processed: u64, total: Option<u64>) {
        self.seen.push((processed, total));
        if processed >= self.at {
            self.token.cancel();
        }
    }
}

#[test]
fn cancellation_stops_at_poll_boundary() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;

    let token = CancelToken::new();
    let mut sink = CancelAt {
        token: token.clone(),
        at: 100,
        ..Default::default()
    };
    let mut ctx = ScanContext::new(&token, &mut sink);

    let mut buf = Vec::new();
    let summary = export(
        &conn,
        &ExportSource::Object("events".into()),
        ExportFormat::Csv,
        &mut buf,
        &mut ctx,
    )?;

    assert!(summary.cancelled);
    assert_eq!(summary.rows_written, 100);

    let out = String::from_utf8(buf).expect("utf-8");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 101);
    assert_eq!(lines[0], "id;label");
    assert_eq!(lines[100], "100;event 100");

    assert_eq!(sink.seen, vec![(100, Some(EVENTS_ROWS))]);
    Ok(())
}

#[test]
fn full_scan_reports_every_interval() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;

    let token = CancelToken::new();
    let mut sink = CancelAt {
        at: u64::MAX,
        ..Default::default()
    };
    let mut ctx = ScanContext::new(&token, &mut sink).with_interval(50);

    let mut buf = Vec::new();
    let summary = export(
        &conn,
        &ExportSource::Object("events".into()),
        ExportFormat::Text,
        &mut buf,
        &mut ctx,
    )?;

    assert!(!summary.cancelled);
    assert_eq!(summary.rows_written, EVENTS_ROWS);
    let processed: Vec<u64> = sink.seen.iter().map(|(p, _)| *p).collect();
    assert_eq!(processed, vec![50, 100, 150, 200, 250]);
    Ok(())
}

// ---------------------------------------------------------------------------
// Files and failures
// ---------------------------------------------------------------------------

#[test]
fn export_to_file_writes_destination() -> Result<(), ExportError> {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path())?;
    let target = db.dir().join("users.csv");

    let cancel = CancelToken::new();
    let mut progress = NoProgress;
    let mut ctx = ScanContext::new(&cancel, &mut progress);

    let summary = export_to_file(
        &conn,
        &ExportSource::Object("users".into()),
        ExportFormat::Csv,
        &target,
        &mut ctx,
    )?;

    assert_eq!(summary.rows_written, 3);
    let written = std::fs::read_to_string(&target)?;
    assert!(written.starts_with("id;name;score;avatar;note\n"));
    assert!(!written.starts_with('\u{feff}'));
    Ok(())
}

#[test]
fn invalid_query_fails_with_engine_error() {
    let db = fixtures::sample_database();
    let conn = Connection::open(db.path()).expect("open");

    let err = export_string(
        &conn,
        &ExportSource::Query("SELECT nope FROM users".into()),
        ExportFormat::Csv,
    )
    .unwrap_err();

    match err {
        ExportError::Db(db_err) => assert!(db_err.engine().is_some()),
        other => panic!("unexpected error: {other}"),
    }
}
