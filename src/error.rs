//! Error Handling Infrastructure
//!
//! This module defines the closed error taxonomy used throughout sqlrelay.
//! Every backend failure is mapped onto exactly one [`ErrorKind`]; the set
//! is fixed and new backends are supported by adding a mapping function in
//! their engine module, never by widening the taxonomy.
//!
//! # Taxonomy
//! - `ConnectionError`: resolution, authentication, or timeout before any statement was sent
//! - `SyntaxError`: malformed statement, unknown table/column
//! - `IntegrityError`: constraint violation (unique, foreign key, check)
//! - `OperationalError`: transient failure (lock timeout, connection drop mid-statement)
//! - `DatabaseError`: backend-reported failure not otherwise classified
//! - `UnknownError`: anything escaping the backend's own error hierarchy

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed classification of query failures.
///
/// Serialized under the variant name (`"SyntaxError"`, `"IntegrityError"`, ...)
/// so callers can branch on the kind without parsing message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Could not establish or keep a connection before executing
    ConnectionError,
    /// Statement rejected by the backend parser/analyzer
    SyntaxError,
    /// Constraint violation reported by the backend
    IntegrityError,
    /// Transient operational failure; retrying may succeed
    OperationalError,
    /// Backend-reported failure with no more specific classification
    DatabaseError,
    /// Failure outside the backend's error hierarchy (including panics)
    UnknownError,
}

impl ErrorKind {
    /// Get the kind name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionError => "ConnectionError",
            Self::SyntaxError => "SyntaxError",
            Self::IntegrityError => "IntegrityError",
            Self::OperationalError => "OperationalError",
            Self::DatabaseError => "DatabaseError",
            Self::UnknownError => "UnknownError",
        }
    }

    /// Whether a caller may reasonably retry the request unchanged.
    ///
    /// `ConnectionError` covers both transient (unreachable host) and
    /// permanent (bad credentials) conditions; it is reported retryable
    /// because the transient case dominates in practice.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::OperationalError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified query failure.
///
/// The message is expected to be driver-level text; credential scrubbing
/// happens once at the orchestrator boundary before the error is surfaced
/// in a [`crate::QueryResult`].
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct QueryError {
    /// Position in the closed taxonomy
    pub kind: ErrorKind,
    /// Driver-level detail
    pub message: String,
}

impl QueryError {
    /// Create an error with an explicit kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Create a `ConnectionError`
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, message)
    }

    /// Create a `SyntaxError`
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    /// Create an `IntegrityError`
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IntegrityError, message)
    }

    /// Create an `OperationalError`
    pub fn operational(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationalError, message)
    }

    /// Create a `DatabaseError`
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DatabaseError, message)
    }

    /// Create an `UnknownError`
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }
}

/// Result type alias for sqlrelay operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(QueryError::connection("x").kind.as_str(), "ConnectionError");
        assert_eq!(QueryError::syntax("x").kind.as_str(), "SyntaxError");
        assert_eq!(QueryError::integrity("x").kind.as_str(), "IntegrityError");
        assert_eq!(QueryError::operational("x").kind.as_str(), "OperationalError");
        assert_eq!(QueryError::database("x").kind.as_str(), "DatabaseError");
        assert_eq!(QueryError::unknown("x").kind.as_str(), "UnknownError");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&ErrorKind::SyntaxError).unwrap(), r#""SyntaxError""#);
        assert_eq!(
            serde_json::to_string(&ErrorKind::IntegrityError).unwrap(),
            r#""IntegrityError""#
        );
        let parsed: ErrorKind = serde_json::from_str(r#""ConnectionError""#).unwrap();
        assert_eq!(parsed, ErrorKind::ConnectionError);
    }

    #[test]
    fn test_retryable_split() {
        assert!(ErrorKind::ConnectionError.is_retryable());
        assert!(ErrorKind::OperationalError.is_retryable());
        assert!(!ErrorKind::SyntaxError.is_retryable());
        assert!(!ErrorKind::IntegrityError.is_retryable());
        assert!(!ErrorKind::DatabaseError.is_retryable());
        assert!(!ErrorKind::UnknownError.is_retryable());
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = QueryError::integrity("UNIQUE constraint failed: t.id");
        let text = err.to_string();
        assert!(text.contains("IntegrityError"));
        assert!(text.contains("UNIQUE constraint failed"));
    }
}
