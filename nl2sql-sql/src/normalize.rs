//! SQL string normalization for exact-match comparison
//!
//! Canonicalizes case, whitespace, quotes, and trailing punctuation only.
//! Clause elements are never reordered: column order and join order can be
//! semantically significant, and this normalizer cannot prove otherwise.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)--.*$").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static OPERATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([=<>!]+)\s*").unwrap());
static COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());
static LPAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\s*").unwrap());
static RPAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\)\s*").unwrap());

/// Normalize SQL for string-level equivalence comparison. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(sql: &str) -> String {
    if sql.trim().is_empty() {
        return String::new();
    }

    let sql = sql.to_lowercase();
    let sql = LINE_COMMENT.replace_all(&sql, "");
    let sql = BLOCK_COMMENT.replace_all(&sql, "");
    let sql = WHITESPACE.replace_all(&sql, " ");
    let sql = sql
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    let sql = sql.replace('"', "'");
    let sql = COMMA.replace_all(&sql, ", ");
    let sql = LPAREN.replace_all(&sql, " (");
    let sql = RPAREN.replace_all(&sql, ") ");
    // Operator spacing runs last: the comma/paren rules strip whitespace
    // next to their punctuation, and would otherwise undo it.
    let sql = OPERATOR.replace_all(&sql, " $1 ");

    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether two SQL strings are equivalent after normalization.
pub fn exact_match(gold: &str, predicted: &str) -> bool {
    normalize(gold) == normalize(predicted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(normalize("SELECT  a FROM T"), normalize("select a from t"));
    }

    #[test]
    fn test_comments_stripped() {
        assert_eq!(
            normalize("SELECT a -- pick a\nFROM t /* the table */"),
            "select a from t"
        );
    }

    #[test]
    fn test_trailing_semicolons_stripped() {
        assert_eq!(normalize("select a from t;;"), "select a from t");
    }

    #[test]
    fn test_operator_spacing() {
        assert_eq!(
            normalize("select a from t where a>=1 and b<2"),
            "select a from t where a >= 1 and b < 2"
        );
    }

    #[test]
    fn test_comma_and_paren_spacing() {
        assert_eq!(
            normalize("select count( * ) , sum(x)from t"),
            normalize("SELECT COUNT(*), SUM(x) FROM t")
        );
    }

    #[test]
    fn test_double_quotes_fold_to_single() {
        assert_eq!(
            normalize(r#"select a from t where b = "x""#),
            "select a from t where b = 'x'"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "SELECT  a, b FROM t WHERE a >= 1;",
            "select count(*) from \"t\" -- c",
            "  SELECT x FROM (SELECT y FROM u) z  ",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for: {input}");
        }
    }

    #[test]
    fn test_column_order_is_preserved() {
        assert_ne!(
            normalize("SELECT a, b FROM t"),
            normalize("SELECT b, a FROM t")
        );
    }

    #[test]
    fn test_exact_match() {
        assert!(exact_match(
            "SELECT name FROM customers;",
            "select   name\nfrom customers"
        ));
        assert!(!exact_match("SELECT a FROM t", "SELECT b FROM t"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
