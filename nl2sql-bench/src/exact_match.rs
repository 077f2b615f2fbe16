//! Exact-match evaluation over normalized SQL text

/// True when gold and predicted SQL normalize to the same string.
/// Semantically equivalent but textually different queries do not match;
/// execution and judge evaluation cover those.
pub fn evaluate_exact_match(gold_sql: &str, predicted_sql: &str) -> bool {
    nl2sql_sql::exact_match(gold_sql, predicted_sql)
}
