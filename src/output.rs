//! Query Result Contract
//!
//! This module defines the single normalized output shape for all
//! executions. Exactly one of {rows present, error present} holds:
//! success never carries error fields, failure never carries rows or
//! columns. All values inside `rows` are transport-safe JSON primitives
//! produced by the engine serializers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, QueryError};

/// Normalized result of one query execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Whether the statement executed successfully
    pub success: bool,

    /// Result rows as column-name -> value objects. Present only for
    /// successful row-returning statements. Projection order is carried
    /// by `columns`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Map<String, Value>>>,

    /// Rows returned (row-returning statements) or affected (mutating
    /// statements). Zero on failure.
    pub row_count: u64,

    /// Ordered column names of the projection. Present only alongside `rows`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Classified failure message, credentials redacted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Position of the failure in the closed taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Connect + execute + fetch span in milliseconds, rounded to two
    /// decimals. Always >= 0, populated on success and failure alike.
    pub execution_time_ms: f64,
}

impl QueryResult {
    /// Successful row-returning execution
    #[must_use]
    pub fn with_rows(
        columns: Vec<String>,
        rows: Vec<Map<String, Value>>,
        execution_time_ms: f64,
    ) -> Self {
        let row_count = rows.len() as u64;
        Self {
            success: true,
            rows: Some(rows),
            row_count,
            columns: Some(columns),
            error_message: None,
            error_kind: None,
            execution_time_ms: round_ms(execution_time_ms),
        }
    }

    /// Successful mutating execution (affected-row count only)
    #[must_use]
    pub fn with_affected(rows_affected: u64, execution_time_ms: f64) -> Self {
        Self {
            success: true,
            rows: None,
            row_count: rows_affected,
            columns: None,
            error_message: None,
            error_kind: None,
            execution_time_ms: round_ms(execution_time_ms),
        }
    }

    /// Classified failure. The message must already be scrubbed of
    /// credentials by the caller.
    #[must_use]
    pub fn from_error(error: &QueryError, execution_time_ms: f64) -> Self {
        Self {
            success: false,
            rows: None,
            row_count: 0,
            columns: None,
            error_message: Some(error.message.clone()),
            error_kind: Some(error.kind),
            execution_time_ms: round_ms(execution_time_ms),
        }
    }

    /// True when the invariant "exactly one of {rows present on success,
    /// error present on failure}" holds for this result.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if self.success {
            self.error_message.is_none()
                && self.error_kind.is_none()
                && self.rows.is_some() == self.columns.is_some()
        } else {
            self.rows.is_none()
                && self.columns.is_none()
                && self.error_message.is_some()
                && self.error_kind.is_some()
        }
    }
}

/// Round to two decimals, matching the wire format
fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_row() -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("test".to_string(), Value::from(1));
        row
    }

    #[test]
    fn test_row_result_shape() {
        let result =
            QueryResult::with_rows(vec!["test".to_string()], vec![sample_row()], 1.234_56);

        assert!(result.success);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns, Some(vec!["test".to_string()]));
        assert_eq!(result.execution_time_ms, 1.23);
        assert!(result.is_well_formed());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""success":true"#));
        assert!(!json.contains("error_message"));
        assert!(!json.contains("error_kind"));
    }

    #[test]
    fn test_affected_result_shape() {
        let result = QueryResult::with_affected(3, 0.5);

        assert!(result.success);
        assert_eq!(result.row_count, 3);
        assert!(result.rows.is_none());
        assert!(result.columns.is_none());
        assert!(result.is_well_formed());

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains(r#""rows""#));
        assert!(!json.contains(r#""columns""#));
    }

    #[test]
    fn test_error_result_shape() {
        let err = QueryError::syntax("near \"FROM\": syntax error");
        let result = QueryResult::from_error(&err, 2.0);

        assert!(!result.success);
        assert_eq!(result.row_count, 0);
        assert_eq!(result.error_kind, Some(ErrorKind::SyntaxError));
        assert!(result.rows.is_none());
        assert!(result.is_well_formed());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""error_kind":"SyntaxError""#));
        assert!(!json.contains(r#""rows""#));
    }

    #[test]
    fn test_round_trip() {
        let result = QueryResult::with_rows(vec!["test".to_string()], vec![sample_row()], 10.0);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: QueryResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.row_count, 1);
        assert!(parsed.is_well_formed());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_ms(1.005), 1.0); // 1.005 is 1.00499.. in f64
        assert_eq!(round_ms(1.999), 2.0);
        assert_eq!(round_ms(0.0), 0.0);
    }
}
