//! Query Request Types
//!
//! A [`QueryRequest`] is consumed exactly once: the external caller builds
//! it, hands it to [`crate::run_query`], and discards it. The connection
//! target inside it carries credentials and is never logged or persisted.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One SQL execution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// URL-form backend identifier and credentials:
    /// `<dialect>[+<driver>]://<user>:<password>@<host>:<port>/<database>`
    /// WARNING: Sensitive data, do not log or include in error messages
    pub connection_target: String,

    /// SQL statement to execute. Named placeholders use `:name` syntax.
    pub statement_text: String,

    /// Optional placeholder name -> scalar value bindings.
    /// Bound through each driver's native mechanism, never interpolated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_parameters: Option<BTreeMap<String, ParamValue>>,
}

impl QueryRequest {
    /// Create a request without parameters
    pub fn new(connection_target: impl Into<String>, statement_text: impl Into<String>) -> Self {
        Self {
            connection_target: connection_target.into(),
            statement_text: statement_text.into(),
            named_parameters: None,
        }
    }

    /// Attach named parameters to the request
    #[must_use]
    pub fn with_parameters(mut self, params: BTreeMap<String, ParamValue>) -> Self {
        self.named_parameters = Some(params);
        self
    }
}

/// Scalar value bound into a statement placeholder.
///
/// Untagged so callers pass plain JSON scalars (`null`, `true`, `1`,
/// `2.5`, `"text"`). Integers are tried before floats, matching how
/// `serde_json` distinguishes `1` from `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Text
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Per-request execution limits.
///
/// Only connection establishment is bounded by default. The statement
/// timeout exists so unbounded execution is an explicit choice rather
/// than a silent one; `None` means the statement runs to completion.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Maximum time to establish a connection before failing with
    /// `ConnectionError`. Default: 10 seconds.
    pub connect_timeout: Duration,

    /// Maximum time for statement execution and fetch. `None` means
    /// unbounded. A breach classifies as `OperationalError`.
    pub statement_timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), statement_timeout: None }
    }
}

impl ExecuteOptions {
    /// Override the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound statement execution time
    #[must_use]
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_param_value_from_json_scalars() {
        let v: ParamValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, ParamValue::Null);

        let v: ParamValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ParamValue::Bool(true));

        let v: ParamValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, ParamValue::Int(42));

        let v: ParamValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, ParamValue::Float(2.5));

        let v: ParamValue = serde_json::from_str(r#""alice""#).unwrap();
        assert_eq!(v, ParamValue::Text("alice".to_string()));
    }

    #[test]
    fn test_request_round_trip() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), ParamValue::Int(1));
        params.insert("name".to_string(), ParamValue::from("alice"));

        let request = QueryRequest::new(
            "sqlite://:memory:",
            "INSERT INTO users (id, name) VALUES (:id, :name)",
        )
        .with_parameters(params);

        let json = serde_json::to_string(&request).unwrap();
        let parsed: QueryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.statement_text, request.statement_text);
        assert_eq!(parsed.named_parameters, request.named_parameters);
    }

    #[test]
    fn test_request_without_parameters_omits_field() {
        let request = QueryRequest::new("sqlite://:memory:", "SELECT 1");
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("named_parameters"));
    }

    #[test]
    fn test_default_options() {
        let opts = ExecuteOptions::default();
        assert_eq!(opts.connect_timeout, Duration::from_secs(10));
        assert!(opts.statement_timeout.is_none());
    }

    #[test]
    fn test_options_builders() {
        let opts = ExecuteOptions::default()
            .with_connect_timeout(Duration::from_secs(2))
            .with_statement_timeout(Duration::from_millis(500));
        assert_eq!(opts.connect_timeout, Duration::from_secs(2));
        assert_eq!(opts.statement_timeout, Some(Duration::from_millis(500)));
    }
}
