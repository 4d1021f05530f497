//! `SQLite` Database Engine Implementation
//!
//! This module implements the [`SqlEngine`] trait for `SQLite` databases.
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver); the whole open/execute/fetch
//!   body runs on a `spawn_blocking` worker so the async caller is never
//!   stalled
//! - Named parameters bound through `SQLite`'s native `:name` mechanism
//! - Row-set vs affected-count decided by the prepared statement's
//!   column count, not by inspecting the SQL text
//! - BLOB data is Base64-encoded for JSON safety
//! - A statement timeout maps onto `busy_timeout`; a plain `SQLITE_BUSY`
//!   or `SQLITE_LOCKED` classifies as `OperationalError`

use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{Connection, ErrorCode, OpenFlags, Row, ToSql};

use crate::engine::{NamedParams, SqlEngine, StatementOutcome};
use crate::error::{QueryError, Result};
use crate::request::{ExecuteOptions, ParamValue};
use crate::target::ConnectionTarget;

/// `SQLite` database engine implementation
pub struct SqliteEngine;

/// Which stage of execution an error came from; drives classification
/// because `SQLite` reuses generic result codes across stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Open,
    Prepare,
    Execute,
}

impl SqlEngine for SqliteEngine {
    async fn run(
        target: &ConnectionTarget,
        statement: &str,
        params: Option<&NamedParams>,
        opts: &ExecuteOptions,
    ) -> Result<StatementOutcome> {
        let file = target
            .file
            .clone()
            .ok_or_else(|| QueryError::connection("sqlite target has no file path"))?;
        let statement = statement.to_string();
        let params = params.cloned();
        let busy_timeout = opts.statement_timeout;

        // rusqlite is blocking; keep the driver work off the async runtime
        let outcome = tokio::task::spawn_blocking(move || {
            let path = file
                .to_str()
                .ok_or_else(|| QueryError::connection("sqlite file path is not valid UTF-8"))?;
            let conn = open_connection(path)?;

            if let Some(timeout) = busy_timeout {
                conn.busy_timeout(timeout)
                    .map_err(|e| classify_sqlite_error(&e, Stage::Open))?;
            }

            execute_statement(&conn, &statement, params.as_ref())
        })
        .await
        .map_err(|e| QueryError::unknown(format!("sqlite worker failed: {e}")))??;

        Ok(outcome)
    }
}

/// Open a single-use `SQLite` connection
fn open_connection(path: &str) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
    Connection::open_with_flags(path, flags).map_err(|e| classify_sqlite_error(&e, Stage::Open))
}

/// Execute one statement and collect its outcome
fn execute_statement(
    conn: &Connection,
    statement: &str,
    params: Option<&NamedParams>,
) -> Result<StatementOutcome> {
    let mut stmt =
        conn.prepare(statement).map_err(|e| classify_sqlite_error(&e, Stage::Prepare))?;

    let column_names: Vec<String> = stmt.column_names().iter().map(|s| (*s).to_string()).collect();

    // SQLite binds unreferenced placeholders as NULL; an absent binding
    // must fail here instead of silently writing NULLs
    for idx in 1..=stmt.parameter_count() {
        match stmt.parameter_name(idx) {
            Some(name) => {
                let bare = name.trim_start_matches([':', '@', '$']);
                if !params.is_some_and(|p| p.contains_key(bare)) {
                    return Err(QueryError::database(format!(
                        "no value bound for parameter {name}"
                    )));
                }
            }
            None => {
                return Err(QueryError::database(format!(
                    "no value bound for positional parameter {idx}"
                )));
            }
        }
    }

    // Placeholder names carry the ':' prefix at the driver level
    let prefixed: Vec<(String, &ParamValue)> = params
        .map(|p| p.iter().map(|(name, value)| (format!(":{name}"), value)).collect())
        .unwrap_or_default();
    let bindings: Vec<(&str, &dyn ToSql)> =
        prefixed.iter().map(|(name, value)| (name.as_str(), *value as &dyn ToSql)).collect();

    if column_names.is_empty() {
        // Mutating statement (INSERT, UPDATE, DELETE, DDL)
        stmt.execute(bindings.as_slice())
            .map_err(|e| classify_sqlite_error(&e, Stage::Execute))?;
        Ok(StatementOutcome::affected(conn.changes()))
    } else {
        let mut rows = stmt
            .query(bindings.as_slice())
            .map_err(|e| classify_sqlite_error(&e, Stage::Execute))?;

        let mut rows_data = Vec::new();
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(classify_sqlite_error(&e, Stage::Execute)),
            };
            rows_data.push(row_to_json(&column_names, row));
        }

        Ok(StatementOutcome::row_set(column_names, rows_data))
    }
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Self::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            Self::Int(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Self::Float(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Convert a `SQLite` row to transport-safe JSON values.
///
/// Serialization never fails the result: a value the driver cannot hand
/// back cleanly degrades to its textual form.
fn row_to_json(column_names: &[String], row: &Row) -> Vec<serde_json::Value> {
    (0..column_names.len()).map(|idx| sqlite_value_to_json(row, idx)).collect()
}

/// Convert one `SQLite` value to a JSON value
fn sqlite_value_to_json(row: &Row, idx: usize) -> serde_json::Value {
    let value_ref = match row.get_ref(idx) {
        Ok(v) => v,
        // Out-of-range access cannot happen for idx < column_count; degrade anyway
        Err(e) => return serde_json::Value::String(e.to_string()),
    };

    match value_ref {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number), // NaN/Infinity as null
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => {
            // Encode BLOB as Base64 for JSON safety
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(b);
            serde_json::Value::String(encoded)
        }
    }
}

/// Map a `rusqlite` error onto the closed taxonomy.
///
/// Classification uses the primary result code and the stage the error
/// came from; message text is never inspected.
fn classify_sqlite_error(error: &rusqlite::Error, stage: Stage) -> QueryError {
    if stage == Stage::Open {
        return QueryError::connection(error.to_string());
    }

    match error {
        rusqlite::Error::SqliteFailure(ffi_error, _) => match ffi_error.code {
            ErrorCode::ConstraintViolation => QueryError::integrity(error.to_string()),
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::OperationInterrupted
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull => QueryError::operational(error.to_string()),
            ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied => {
                QueryError::connection(error.to_string())
            }
            // SQLITE_ERROR at prepare time is how SQLite reports parse and
            // unknown-object failures
            ErrorCode::Unknown if stage == Stage::Prepare => QueryError::syntax(error.to_string()),
            _ => QueryError::database(error.to_string()),
        },
        _ if stage == Stage::Prepare => QueryError::syntax(error.to_string()),
        _ => QueryError::database(error.to_string()),
    }
}
