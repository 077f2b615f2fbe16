//! Token-level syntax validation
//!
//! Confirms statement shape only: balanced parentheses, clause keywords in
//! valid relative order, single terminated statement. Semantics are the
//! schema validator's job. Input is never mutated.

use crate::lexer::{tokenize, Token, TokenKind};
use nl2sql_core::ValidationOutcome;

/// Rank of a top-level clause keyword within one SELECT block. Clauses must
/// appear in strictly increasing rank order.
fn clause_rank(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Select => Some(0),
        TokenKind::From => Some(1),
        TokenKind::Where => Some(2),
        TokenKind::Group => Some(3),
        TokenKind::Having => Some(4),
        TokenKind::Order => Some(5),
        TokenKind::Limit => Some(6),
        TokenKind::Offset => Some(7),
        _ => None,
    }
}

fn syntax_error(detail: impl Into<String>, token: &Token) -> ValidationOutcome {
    ValidationOutcome::Syntax {
        detail: detail.into(),
        line: token.span.line,
        column: token.span.column,
    }
}

/// Validate that a SQL string is a grammatically plausible single query.
pub fn validate_syntax(sql: &str) -> ValidationOutcome {
    let tokens = tokenize(sql);

    if tokens.len() == 1 {
        return syntax_error("empty statement", &tokens[0]);
    }

    // Lexer errors surface first, with their position.
    if let Some(token) = tokens.iter().find(|t| matches!(t.kind, TokenKind::Error(_))) {
        if let TokenKind::Error(msg) = &token.kind {
            return syntax_error(msg.clone(), token);
        }
    }

    // Only queries are accepted; the generator is never asked for anything
    // else, so any other statement kind is a defect worth repairing.
    match &tokens[0].kind {
        TokenKind::Select | TokenKind::With => {}
        other => {
            return syntax_error(
                format!("statement must begin with SELECT or WITH, found {}", other),
                &tokens[0],
            );
        }
    }

    let mut depth: usize = 0;
    let mut open_parens: Vec<&Token> = Vec::new();
    // Clause-order state per paren depth; index = depth.
    let mut ranks: Vec<u8> = vec![0];
    let mut last_meaningful: &Token = &tokens[0];
    let mut terminated = false;

    for (i, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Eof => break,
            TokenKind::Semicolon => {
                terminated = true;
                continue;
            }
            _ if terminated => {
                return syntax_error("multiple statements; expected a single query", token);
            }
            TokenKind::LParen => {
                depth += 1;
                open_parens.push(token);
                if ranks.len() <= depth {
                    ranks.push(0);
                }
                ranks[depth] = 0;
            }
            TokenKind::RParen => {
                if depth == 0 {
                    return syntax_error("unbalanced ')'", token);
                }
                depth -= 1;
                open_parens.pop();
            }
            TokenKind::Union | TokenKind::Intersect | TokenKind::Except => {
                // A new SELECT block starts after a set operator.
                ranks[depth] = 0;
            }
            TokenKind::Comma => {
                // A comma must introduce another list element, not a clause.
                let next = tokens.get(i + 1).map(|t| &t.kind);
                let dangling_comma = match next {
                    Some(TokenKind::RParen)
                    | Some(TokenKind::Semicolon)
                    | Some(TokenKind::Eof)
                    | None => true,
                    Some(kind) => clause_rank(kind).map_or(false, |r| r > 0),
                };
                if dangling_comma {
                    return syntax_error("incomplete statement, trailing ','", token);
                }
            }
            kind => {
                if let Some(rank) = clause_rank(kind) {
                    // GROUP/ORDER are clause starts only when followed by BY;
                    // e.g. a column named `order` lexes as a keyword but is
                    // not a clause here.
                    let is_clause = match kind {
                        TokenKind::Group | TokenKind::Order => {
                            matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::By))
                        }
                        _ => true,
                    };
                    if is_clause {
                        let current = ranks[depth];
                        if rank > 0 && rank <= current {
                            return syntax_error(
                                format!("misplaced {} clause", kind),
                                token,
                            );
                        }
                        ranks[depth] = rank.max(current);
                    }
                }
            }
        }
        last_meaningful = token;
    }

    if depth > 0 {
        let open = open_parens.last().copied().unwrap_or(&tokens[0]);
        return syntax_error("unclosed '('", open);
    }

    // A statement may not end on a dangling operator, comma, or clause
    // keyword that requires a continuation.
    let dangling = matches!(
        last_meaningful.kind,
        TokenKind::Comma
            | TokenKind::Dot
            | TokenKind::Select
            | TokenKind::From
            | TokenKind::Where
            | TokenKind::Group
            | TokenKind::Having
            | TokenKind::Order
            | TokenKind::By
            | TokenKind::Limit
            | TokenKind::Offset
            | TokenKind::On
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Not
            | TokenKind::In
            | TokenKind::Join
            | TokenKind::As
            | TokenKind::Union
            | TokenKind::Intersect
            | TokenKind::Except
    ) || last_meaningful.kind.is_operator() && last_meaningful.kind != TokenKind::Star;
    if dangling {
        return syntax_error(
            format!("incomplete statement, trailing {}", last_meaningful.kind),
            last_meaningful,
        );
    }

    ValidationOutcome::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(sql: &str) {
        let outcome = validate_syntax(sql);
        assert_eq!(outcome, ValidationOutcome::Valid, "expected valid: {sql}");
    }

    fn assert_syntax_error(sql: &str, needle: &str) {
        match validate_syntax(sql) {
            ValidationOutcome::Syntax { detail, .. } => {
                assert!(
                    detail.contains(needle),
                    "expected '{needle}' in diagnostic '{detail}' for: {sql}"
                );
            }
            other => panic!("expected syntax error for {sql}, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_select_is_valid() {
        assert_valid("SELECT name FROM customers WHERE id = 1");
        assert_valid("select * from t;");
    }

    #[test]
    fn test_full_clause_ladder_is_valid() {
        assert_valid(
            "SELECT c.name, SUM(o.total) FROM customers c \
             JOIN orders o ON o.customer_id = c.id \
             WHERE o.total > 0 GROUP BY c.name HAVING SUM(o.total) > 1000 \
             ORDER BY 2 DESC LIMIT 10",
        );
    }

    #[test]
    fn test_subqueries_have_their_own_clause_order() {
        assert_valid(
            "SELECT name FROM customers WHERE id IN \
             (SELECT customer_id FROM orders WHERE total > 100)",
        );
    }

    #[test]
    fn test_union_starts_a_new_block() {
        assert_valid("SELECT a FROM t WHERE a > 1 UNION SELECT b FROM u WHERE b > 2");
    }

    #[test]
    fn test_with_query_is_valid() {
        assert_valid(
            "WITH big AS (SELECT customer_id FROM orders GROUP BY customer_id) \
             SELECT * FROM big",
        );
    }

    #[test]
    fn test_empty_statement() {
        assert_syntax_error("", "empty statement");
        assert_syntax_error("   -- just a comment", "empty statement");
    }

    #[test]
    fn test_non_query_statement() {
        assert_syntax_error("DROP TABLE customers", "must begin with SELECT");
        assert_syntax_error("INSERT INTO t VALUES (1)", "must begin with SELECT");
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_syntax_error("SELECT a FROM t WHERE (a > 1", "unclosed '('");
        assert_syntax_error("SELECT a) FROM t", "unbalanced ')'");
    }

    #[test]
    fn test_misordered_clauses() {
        assert_syntax_error("SELECT a FROM t GROUP BY a WHERE a > 1", "misplaced WHERE");
        assert_syntax_error("SELECT a FROM t ORDER BY a GROUP BY a", "misplaced GROUP");
        assert_syntax_error("SELECT a FROM t WHERE a = 1 FROM u", "misplaced FROM");
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert_syntax_error("SELECT 1; SELECT 2", "multiple statements");
        // A trailing semicolon alone is fine.
        assert_valid("SELECT 1;");
        assert_valid("SELECT 1;;");
    }

    #[test]
    fn test_trailing_garbage() {
        assert_syntax_error("SELECT a FROM t WHERE", "trailing");
        assert_syntax_error("SELECT a, FROM t", "trailing");
        assert_syntax_error("SELECT a FROM t WHERE a =", "trailing");
    }

    #[test]
    fn test_lexer_error_surfaces_with_position() {
        match validate_syntax("SELECT 'unterminated FROM t") {
            ValidationOutcome::Syntax { detail, line, .. } => {
                assert!(detail.contains("Unterminated"));
                assert_eq!(line, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_column_named_order_is_not_a_clause() {
        // `order` without BY is an identifier position, not a clause start.
        assert_valid("SELECT \"order\" FROM t");
    }
}
