//! Execution-accuracy evaluation against SQLite databases
//!
//! Both queries run read-only with a hard timeout. A gold-query failure is
//! a dataset problem and reported as its own outcome; a predicted-query
//! failure counts against the model.

use nl2sql_core::{ExecError, ExecutionConfig, QuerySide};
use nl2sql_sql::lexer::tokenize;
use nl2sql_sql::TokenKind;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;

/// One cell of a query result, reduced to the types SQLite can store.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Rows returned by one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub column_count: usize,
    pub rows: Vec<Vec<Cell>>,
}

/// Outcome of comparing gold and predicted execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// The gold query itself failed; the sample cannot be scored.
    GoldFailed { error: ExecError },
    /// Gold ran but the prediction failed; scored as a non-match.
    PredictedFailed { error: ExecError },
    /// Both ran; `matched` says whether the result sets are equivalent.
    Compared {
        matched: bool,
        message: String,
        gold: ResultSet,
        predicted: ResultSet,
    },
}

impl ExecOutcome {
    /// `None` when the sample could not be scored at all.
    pub fn match_flag(&self) -> Option<bool> {
        match self {
            ExecOutcome::GoldFailed { .. } => None,
            ExecOutcome::PredictedFailed { .. } => Some(false),
            ExecOutcome::Compared { matched, .. } => Some(*matched),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ExecOutcome::GoldFailed { error } => error.to_string(),
            ExecOutcome::PredictedFailed { error } => error.to_string(),
            ExecOutcome::Compared { message, .. } => message.clone(),
        }
    }
}

/// Runs gold and predicted SQL against a Spider database and compares rows.
#[derive(Debug, Clone)]
pub struct ExecutionEvaluator {
    databases_dir: PathBuf,
    config: ExecutionConfig,
}

impl ExecutionEvaluator {
    pub fn new(databases_dir: impl Into<PathBuf>, config: ExecutionConfig) -> Self {
        Self {
            databases_dir: databases_dir.into(),
            config,
        }
    }

    /// Resolve `<dir>/<db_id>/<db_id>.sqlite`, falling back to the
    /// alternate `database.sqlite` naming some Spider mirrors use.
    pub fn database_path(&self, db_id: &str) -> Result<PathBuf, ExecError> {
        let primary = self.databases_dir.join(db_id).join(format!("{}.sqlite", db_id));
        if primary.exists() {
            return Ok(primary);
        }
        let alternate = self.databases_dir.join(db_id).join("database.sqlite");
        if alternate.exists() {
            return Ok(alternate);
        }
        Err(ExecError::DatabaseNotFound {
            db_id: db_id.to_string(),
        })
    }

    /// Execute both queries and compare their result sets.
    pub async fn evaluate(&self, gold_sql: &str, predicted_sql: &str, db_id: &str) -> ExecOutcome {
        let db_path = match self.database_path(db_id) {
            Ok(path) => path,
            Err(error) => return ExecOutcome::GoldFailed { error },
        };

        let gold = match self.run_query(&db_path, gold_sql, QuerySide::Gold).await {
            Ok(rows) => rows,
            Err(error) => return ExecOutcome::GoldFailed { error },
        };

        let predicted = match self
            .run_query(&db_path, predicted_sql, QuerySide::Predicted)
            .await
        {
            Ok(rows) => rows,
            Err(error) => return ExecOutcome::PredictedFailed { error },
        };

        let ordered = has_top_level_order_by(gold_sql);
        let (matched, message) = compare_result_sets(&gold, &predicted, ordered);
        ExecOutcome::Compared {
            matched,
            message,
            gold,
            predicted,
        }
    }

    async fn run_query(
        &self,
        db_path: &Path,
        sql: &str,
        side: QuerySide,
    ) -> Result<ResultSet, ExecError> {
        reject_non_query(sql)?;

        let timeout = self.config.timeout;
        let db_path = db_path.to_path_buf();
        let sql = sql.to_string();

        // The blocking task hands back an interrupt handle before running
        // the query so a timeout can abort it mid-statement.
        let (handle_tx, handle_rx) = oneshot::channel();
        let join = tokio::task::spawn_blocking(move || -> Result<ResultSet, ExecError> {
            let conn = Connection::open_with_flags(
                &db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| ExecError::Open {
                message: e.to_string(),
            })?;

            let _ = handle_tx.send(conn.get_interrupt_handle());
            fetch_all(&conn, &sql, side)
        });

        let interrupt = handle_rx.await.ok();

        match tokio::time::timeout(timeout, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExecError::Query {
                side,
                message: format!("worker failed: {}", join_err),
            }),
            Err(_) => {
                if let Some(handle) = interrupt {
                    handle.interrupt();
                }
                Err(ExecError::Timeout {
                    side,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

fn fetch_all(conn: &Connection, sql: &str, side: QuerySide) -> Result<ResultSet, ExecError> {
    let query_err = |e: rusqlite::Error| ExecError::Query {
        side,
        message: e.to_string(),
    };

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    let column_count = stmt.column_count();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([]).map_err(query_err)?;
    while let Some(row) = cursor.next().map_err(query_err)? {
        let mut cells = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let cell = match row.get_ref(i).map_err(query_err)? {
                ValueRef::Null => Cell::Null,
                ValueRef::Integer(v) => Cell::Int(v),
                ValueRef::Real(v) => Cell::Real(v),
                ValueRef::Text(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
                ValueRef::Blob(v) => Cell::Blob(v.to_vec()),
            };
            cells.push(cell);
        }
        rows.push(cells);
    }

    Ok(ResultSet { column_count, rows })
}

/// Only SELECT and WITH statements may run; anything else is refused
/// before it reaches the database.
fn reject_non_query(sql: &str) -> Result<(), ExecError> {
    let tokens = tokenize(sql);
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Select) | Some(TokenKind::With) => Ok(()),
        Some(TokenKind::Eof) | None => Err(ExecError::WriteRejected {
            statement_kind: "empty statement".to_string(),
        }),
        Some(other) => Err(ExecError::WriteRejected {
            statement_kind: other.describe(),
        }),
    }
}

/// True when the statement has an ORDER BY outside any parentheses, in
/// which case row order is part of the answer.
fn has_top_level_order_by(sql: &str) -> bool {
    let tokens = tokenize(sql);
    let mut depth = 0usize;
    for window in tokens.windows(2) {
        match &window[0].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Order if depth == 0 => {
                if matches!(window[1].kind, TokenKind::By) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

// ============================================================================
// RESULT COMPARISON
// ============================================================================

const FLOAT_TOLERANCE: f64 = 1e-6;

fn cells_equal(a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Null, Cell::Null) => true,
        (Cell::Int(x), Cell::Int(y)) => x == y,
        (Cell::Text(x), Cell::Text(y)) => x == y,
        (Cell::Blob(x), Cell::Blob(y)) => x == y,
        // SQLite freely returns 1 or 1.0 depending on the expression.
        (Cell::Int(x), Cell::Real(y)) | (Cell::Real(y), Cell::Int(x)) => {
            floats_equal(*x as f64, *y)
        }
        (Cell::Real(x), Cell::Real(y)) => floats_equal(*x, *y),
        _ => false,
    }
}

fn floats_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= FLOAT_TOLERANCE * scale
}

/// Canonical sort key for multiset comparison. Numbers format identically
/// whether they arrived as INTEGER or REAL.
fn row_sort_key(row: &[Cell]) -> String {
    let mut key = String::new();
    for cell in row {
        match cell {
            Cell::Null => key.push_str("\u{0}null"),
            Cell::Int(v) => key.push_str(&format!("\u{0}n{:.6}", *v as f64)),
            Cell::Real(v) => key.push_str(&format!("\u{0}n{:.6}", v)),
            Cell::Text(v) => {
                key.push_str("\u{0}t");
                key.push_str(v);
            }
            Cell::Blob(v) => key.push_str(&format!("\u{0}b{:?}", v)),
        }
    }
    key
}

fn compare_result_sets(gold: &ResultSet, predicted: &ResultSet, ordered: bool) -> (bool, String) {
    if gold.column_count != predicted.column_count {
        return (
            false,
            format!(
                "Column counts differ (gold: {}, predicted: {})",
                gold.column_count, predicted.column_count
            ),
        );
    }
    if gold.rows.len() != predicted.rows.len() {
        return (
            false,
            format!(
                "Results differ (gold: {} rows, predicted: {} rows)",
                gold.rows.len(),
                predicted.rows.len()
            ),
        );
    }

    let (gold_rows, predicted_rows) = if ordered {
        (gold.rows.clone(), predicted.rows.clone())
    } else {
        let mut g = gold.rows.clone();
        let mut p = predicted.rows.clone();
        g.sort_by_key(|row| row_sort_key(row));
        p.sort_by_key(|row| row_sort_key(row));
        (g, p)
    };

    for (g, p) in gold_rows.iter().zip(predicted_rows.iter()) {
        let row_matches = g.len() == p.len()
            && g.iter().zip(p.iter()).all(|(a, b)| cells_equal(a, b));
        if !row_matches {
            return (false, "Results differ (row contents)".to_string());
        }
    }

    (true, "Results match".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: Vec<Vec<Cell>>) -> ResultSet {
        let column_count = data.first().map(Vec::len).unwrap_or(0);
        ResultSet {
            column_count,
            rows: data,
        }
    }

    #[test]
    fn test_unordered_comparison_ignores_row_order() {
        let gold = rows(vec![
            vec![Cell::Int(1), Cell::Text("a".to_string())],
            vec![Cell::Int(2), Cell::Text("b".to_string())],
        ]);
        let predicted = rows(vec![
            vec![Cell::Int(2), Cell::Text("b".to_string())],
            vec![Cell::Int(1), Cell::Text("a".to_string())],
        ]);
        assert!(compare_result_sets(&gold, &predicted, false).0);
        assert!(!compare_result_sets(&gold, &predicted, true).0);
    }

    #[test]
    fn test_swapped_output_columns_do_not_match() {
        let gold = rows(vec![vec![Cell::Int(1), Cell::Text("a".to_string())]]);
        let predicted = rows(vec![vec![Cell::Text("a".to_string()), Cell::Int(1)]]);
        assert!(!compare_result_sets(&gold, &predicted, false).0);
    }

    #[test]
    fn test_integer_and_real_compare_numerically() {
        let gold = rows(vec![vec![Cell::Int(3)]]);
        let predicted = rows(vec![vec![Cell::Real(3.0)]]);
        assert!(compare_result_sets(&gold, &predicted, false).0);
    }

    #[test]
    fn test_float_tolerance_is_relative() {
        assert!(cells_equal(
            &Cell::Real(1_000_000.0),
            &Cell::Real(1_000_000.5)
        ));
        assert!(!cells_equal(&Cell::Real(1.0), &Cell::Real(1.5)));
    }

    #[test]
    fn test_null_only_equals_null() {
        assert!(cells_equal(&Cell::Null, &Cell::Null));
        assert!(!cells_equal(&Cell::Null, &Cell::Int(0)));
        assert!(!cells_equal(&Cell::Null, &Cell::Text(String::new())));
    }

    #[test]
    fn test_strings_compare_case_sensitively() {
        assert!(!cells_equal(
            &Cell::Text("Alice".to_string()),
            &Cell::Text("alice".to_string())
        ));
    }

    #[test]
    fn test_column_count_mismatch_is_reported() {
        let gold = rows(vec![vec![Cell::Int(1), Cell::Int(2)]]);
        let predicted = rows(vec![vec![Cell::Int(1)]]);
        let (matched, message) = compare_result_sets(&gold, &predicted, false);
        assert!(!matched);
        assert!(message.contains("Column counts differ"));
    }

    #[test]
    fn test_order_by_inside_subquery_is_not_top_level() {
        assert!(has_top_level_order_by("SELECT a FROM t ORDER BY a"));
        assert!(!has_top_level_order_by(
            "SELECT a FROM (SELECT a FROM t ORDER BY a LIMIT 3)"
        ));
    }

    #[test]
    fn test_write_statements_are_rejected() {
        assert!(matches!(
            reject_non_query("DELETE FROM t"),
            Err(ExecError::WriteRejected { .. })
        ));
        assert!(matches!(
            reject_non_query("DROP TABLE t"),
            Err(ExecError::WriteRejected { .. })
        ));
        assert!(reject_non_query("SELECT 1").is_ok());
        assert!(reject_non_query("WITH x AS (SELECT 1) SELECT * FROM x").is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_against_a_real_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("pets");
        std::fs::create_dir_all(&db_dir).unwrap();
        let conn = Connection::open(db_dir.join("pets.sqlite")).unwrap();
        conn.execute_batch(
            "CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT, weight REAL);
             INSERT INTO pets VALUES (1, 'Rex', 12.5), (2, 'Mio', 4.0);",
        )
        .unwrap();
        drop(conn);

        let evaluator = ExecutionEvaluator::new(dir.path(), ExecutionConfig::default());

        let outcome = evaluator
            .evaluate(
                "SELECT name FROM pets ORDER BY weight",
                "SELECT name FROM pets ORDER BY weight ASC",
                "pets",
            )
            .await;
        assert_eq!(outcome.match_flag(), Some(true));

        let outcome = evaluator
            .evaluate("SELECT name FROM pets", "SELECT nam FROM pets", "pets")
            .await;
        assert_eq!(outcome.match_flag(), Some(false));
        assert!(matches!(outcome, ExecOutcome::PredictedFailed { .. }));

        let outcome = evaluator
            .evaluate("SELECT broken FROM pets", "SELECT name FROM pets", "pets")
            .await;
        assert_eq!(outcome.match_flag(), None);
    }

    #[tokio::test]
    async fn test_missing_database_is_gold_failure() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = ExecutionEvaluator::new(dir.path(), ExecutionConfig::default());
        let outcome = evaluator.evaluate("SELECT 1", "SELECT 1", "ghost").await;
        assert!(matches!(
            outcome,
            ExecOutcome::GoldFailed {
                error: ExecError::DatabaseNotFound { .. }
            }
        ));
    }
}
