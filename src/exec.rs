//! One-shot query orchestration.
//!
//! [`run_query`] is the total entry point: it owns the full lifecycle of a
//! single request (parse target, connect, execute, serialize, release) and
//! always returns a [`QueryResult`], never an error. Driver failures,
//! unsupported dialects, and even panics in engine code all come back as a
//! structured failure result with a classified error kind.

use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::engine::{Dialect, StatementOutcome};
use crate::error::{QueryError, Result};
use crate::output::QueryResult;
use crate::request::{ExecuteOptions, QueryRequest};
use crate::target::{scrub_credentials, ConnectionTarget};

/// Execute one SQL statement against the request's connection target.
///
/// Timing covers the whole connect-execute-release span and is reported in
/// `execution_time_ms` on both success and failure.
pub async fn run_query(request: &QueryRequest, opts: &ExecuteOptions) -> QueryResult {
    let started = Instant::now();

    let target = match ConnectionTarget::parse(&request.connection_target) {
        Ok(target) => target,
        Err(e) => {
            let elapsed = elapsed_ms(started);
            warn!(error_kind = e.kind.as_str(), elapsed_ms = elapsed, "target parse failed");
            return QueryResult::from_error(&e, elapsed);
        }
    };

    let dialect = target.dialect.clone();
    let redacted = target.to_string();
    let raw_target = request.connection_target.clone();
    let scrub_target = target.clone();

    // Engine code runs in its own task so a panic in a driver surfaces as
    // an UnknownError result instead of unwinding through the caller
    let request = request.clone();
    let opts = opts.clone();
    let joined = tokio::spawn(async move { dispatch(&target, &request, &opts).await }).await;

    let elapsed = elapsed_ms(started);
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(join_error) => {
            Err(QueryError::unknown(format!("query worker failed: {join_error}")))
        }
    };

    match outcome {
        Ok(outcome) => {
            debug!(
                dialect = %dialect,
                target = %redacted,
                elapsed_ms = elapsed,
                "statement completed"
            );
            match outcome.rows {
                Some(_) => into_row_result(outcome, elapsed),
                None => QueryResult::with_affected(outcome.rows_affected, elapsed),
            }
        }
        Err(mut e) => {
            e.message = scrub_credentials(&e.message, &raw_target, &scrub_target);
            warn!(
                dialect = %dialect,
                target = %redacted,
                error_kind = e.kind.as_str(),
                elapsed_ms = elapsed,
                "statement failed"
            );
            QueryResult::from_error(&e, elapsed)
        }
    }
}

/// Zip engine row vectors with the projection to build name-keyed objects
fn into_row_result(outcome: StatementOutcome, elapsed: f64) -> QueryResult {
    let rows = outcome.rows.unwrap_or_default();
    let mapped: Vec<Map<String, Value>> = rows
        .into_iter()
        .map(|row| outcome.columns.iter().cloned().zip(row).collect())
        .collect();
    QueryResult::with_rows(outcome.columns, mapped, elapsed)
}

/// Route the request to the engine for its dialect.
///
/// Dialects the build does not carry (or that no engine exists for) fail
/// here as connection errors; the target string itself parsed fine.
async fn dispatch(
    target: &ConnectionTarget,
    request: &QueryRequest,
    opts: &ExecuteOptions,
) -> Result<StatementOutcome> {
    #[allow(unused_imports)]
    use crate::engine::SqlEngine;

    #[allow(unused_variables)]
    let params = request.named_parameters.as_ref();

    match Dialect::from_scheme(&target.dialect) {
        #[cfg(feature = "sqlite")]
        Some(Dialect::SQLite) => {
            crate::engine::sqlite::SqliteEngine::run(
                target,
                &request.statement_text,
                params,
                opts,
            )
            .await
        }
        #[cfg(feature = "postgres")]
        Some(Dialect::Postgres) => {
            crate::engine::postgres::PostgresEngine::run(
                target,
                &request.statement_text,
                params,
                opts,
            )
            .await
        }
        #[cfg(feature = "mysql")]
        Some(Dialect::MySQL) => {
            crate::engine::mysql::MySqlEngine::run(
                target,
                &request.statement_text,
                params,
                opts,
            )
            .await
        }
        #[allow(unreachable_patterns)]
        Some(dialect) => Err(QueryError::connection(format!(
            "support for {dialect} is not compiled into this build"
        ))),
        None => Err(QueryError::connection(format!(
            "unsupported database dialect: {}",
            target.dialect
        ))),
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
