//! Error types for NL2SQL operations

use thiserror::Error;

/// DDL parsing errors. Fatal for the request that supplied the schema:
/// nothing downstream can validate SQL against a schema that did not parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaParseError {
    #[error("Schema text contains no CREATE TABLE statements")]
    Empty,

    #[error("Expected CREATE TABLE at line {line}, column {column}, found {found}")]
    NotCreateTable {
        line: usize,
        column: usize,
        found: String,
    },

    #[error("Malformed DDL at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Duplicate table '{name}'")]
    DuplicateTable { name: String },

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error(
        "Unresolved foreign key {source_table}.{source_column} -> \
         {target_table}.{target_column}: {reason}"
    )]
    UnresolvedForeignKey {
        source_table: String,
        source_column: String,
        target_table: String,
        target_column: String,
        reason: String,
    },
}

/// External LLM capability errors (generation, fix, judge).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No LLM provider configured")]
    ProviderNotConfigured,

    #[error("Invalid API key for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Request to {provider} timed out after {elapsed_ms}ms")]
    Timeout { provider: String, elapsed_ms: u64 },
}

/// Which side of an execution comparison a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QuerySide {
    Gold,
    Predicted,
}

impl std::fmt::Display for QuerySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuerySide::Gold => write!(f, "gold"),
            QuerySide::Predicted => write!(f, "predicted"),
        }
    }
}

/// Execution evaluator errors. Local to one evaluation; recorded as a
/// non-match outcome, never propagated as fatal to the benchmark run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("Database not found: {db_id}")]
    DatabaseNotFound { db_id: String },

    #[error("Failed to open database: {message}")]
    Open { message: String },

    #[error("{side} query failed: {message}")]
    Query { side: QuerySide, message: String },

    #[error("{side} query timed out after {timeout_ms}ms")]
    Timeout { side: QuerySide, timeout_ms: u64 },

    #[error("Refusing to execute non-query statement ({statement_kind})")]
    WriteRejected { statement_kind: String },
}

/// Benchmark harness errors.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Dataset file not found: {path}")]
    DatasetNotFound { path: String },

    #[error("Malformed dataset: {message}")]
    MalformedDataset { message: String },

    #[error("Pipeline not set")]
    PipelineNotSet,

    #[error("Benchmark run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for NL2SQL operations.
#[derive(Debug, Error)]
pub enum Nl2SqlError {
    #[error(transparent)]
    Schema(#[from] SchemaParseError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Bench(#[from] BenchError),
}

/// Result alias for NL2SQL operations.
pub type Nl2SqlResult<T> = Result<T, Nl2SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parse_error_display() {
        let err = SchemaParseError::UnresolvedForeignKey {
            source_table: "orders".to_string(),
            source_column: "customer_id".to_string(),
            target_table: "customers".to_string(),
            target_column: "id".to_string(),
            reason: "table 'customers' not declared".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders.customer_id"));
        assert!(msg.contains("not declared"));
    }

    #[test]
    fn test_exec_error_names_the_failing_side() {
        let err = ExecError::Timeout {
            side: QuerySide::Predicted,
            timeout_ms: 5000,
        };
        assert_eq!(err.to_string(), "predicted query timed out after 5000ms");
    }

    #[test]
    fn test_top_level_error_converts_from_domain_errors() {
        let err: Nl2SqlError = SchemaParseError::Empty.into();
        assert!(matches!(err, Nl2SqlError::Schema(_)));
        let err: Nl2SqlError = LlmError::ProviderNotConfigured.into();
        assert!(matches!(err, Nl2SqlError::Llm(_)));
    }
}
