//! Database Engine Traits and Core Types
//!
//! Each backend (`PostgreSQL`, `MySQL`, `SQLite`) implements [`SqlEngine`]
//! in its own module.
//!
//! # Stateless Design
//! Every execution opens one connection, runs one statement, and closes
//! the connection before returning. No pool, no cache, no session state.
//!
//! # Engine Isolation
//! Each engine module owns its driver, its value serialization, and its
//! error classification. No shared SQL helpers or cross-engine
//! abstractions; backends are added by adding a module and a dispatch arm.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;
use crate::request::{ExecuteOptions, ParamValue};
use crate::target::ConnectionTarget;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Supported backend dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `PostgreSQL` database
    Postgres,
    /// `MySQL` database (includes `MariaDB`)
    MySQL,
    /// `SQLite` database
    SQLite,
}

impl Dialect {
    /// Resolve the dialect portion of a connection target scheme.
    ///
    /// Returns `None` for unsupported dialects; the orchestrator turns
    /// that into a `ConnectionError` at dispatch time.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" | "sqlite3" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Get the dialect name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw outcome of one statement execution, before it is folded into the
/// transport-level [`crate::QueryResult`].
///
/// `rows` is `Some` exactly when the backend reported a result set for
/// the statement (even an empty one); mutating statements carry only
/// `rows_affected`.
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    /// Ordered projection column names; empty for mutating statements
    pub columns: Vec<String>,

    /// Serialized result rows in projection order
    pub rows: Option<Vec<Vec<Value>>>,

    /// Backend-reported affected-row count for mutating statements
    pub rows_affected: u64,
}

impl StatementOutcome {
    /// Outcome for a row-returning statement
    #[must_use]
    pub fn row_set(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows: Some(rows), rows_affected: 0 }
    }

    /// Outcome for a mutating statement
    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self { columns: Vec::new(), rows: None, rows_affected }
    }
}

/// Named parameter bindings, placeholder name -> scalar value
pub type NamedParams = BTreeMap<String, ParamValue>;

/// Database engine trait
///
/// Each method is stateless: a connection is opened from the target,
/// used for exactly one statement, and released on every exit path
/// (the connection handle never escapes the call).
pub trait SqlEngine {
    /// Execute one statement against a fresh connection.
    ///
    /// This method:
    /// 1. Opens a connection, bounded by `opts.connect_timeout`
    /// 2. Binds `params` through the driver's native mechanism
    /// 3. Executes and detects row-set vs affected-count shape
    /// 4. Serializes row values to transport-safe JSON
    /// 5. Closes the connection and returns the outcome
    ///
    /// Failures come back classified into the closed taxonomy.
    fn run(
        target: &ConnectionTarget,
        statement: &str,
        params: Option<&NamedParams>,
        opts: &ExecuteOptions,
    ) -> impl std::future::Future<Output = Result<StatementOutcome>> + Send;
}
