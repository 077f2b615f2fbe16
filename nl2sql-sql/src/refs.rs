//! Table and column reference extraction
//!
//! Walks the token stream and collects every FROM/JOIN target (with alias)
//! and every qualified or unqualified column reference. Function names,
//! keywords, literals, `*`, and SELECT-list output aliases are not column
//! references. Resolution is flat: subquery FROM targets join the same pool
//! (conservative; see the schema validator for how unresolved refs are
//! reported rather than guessed).

use crate::lexer::{tokenize, Token, TokenKind};
use nl2sql_core::ColumnRef;
use serde::{Deserialize, Serialize};

/// A FROM/JOIN target. `name` is `None` for a derived table (subquery),
/// whose columns cannot be checked against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: Option<String>,
    pub alias: Option<String>,
}

/// Everything a SQL statement references.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlReferences {
    pub tables: Vec<TableRef>,
    pub columns: Vec<ColumnRef>,
    /// SELECT-list output aliases; usable in ORDER BY without being schema
    /// columns.
    pub output_aliases: Vec<String>,
    /// WITH-clause binding names; resolvable as tables but not schema
    /// tables.
    pub cte_names: Vec<String>,
}

/// Clause context, tracked per paren depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    SelectList,
    From,
    Other,
}

/// Extract all table and column references from a SQL statement.
/// Assumes the statement already passed syntax validation.
pub fn extract_references(sql: &str) -> SqlReferences {
    let tokens = tokenize(sql);
    let mut refs = SqlReferences::default();
    let mut ctx_stack: Vec<Ctx> = vec![Ctx::Other];
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match &token.kind {
            TokenKind::Eof => break,
            TokenKind::Select => {
                *ctx_stack.last_mut().expect("stack never empty") = Ctx::SelectList;
                i += 1;
            }
            TokenKind::From | TokenKind::Join => {
                *ctx_stack.last_mut().expect("stack never empty") = Ctx::From;
                i += 1;
            }
            TokenKind::On
            | TokenKind::Where
            | TokenKind::Having
            | TokenKind::Using
            | TokenKind::When
            | TokenKind::Then => {
                *ctx_stack.last_mut().expect("stack never empty") = Ctx::Other;
                i += 1;
            }
            TokenKind::Group | TokenKind::Order
                if matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::By)) =>
            {
                *ctx_stack.last_mut().expect("stack never empty") = Ctx::Other;
                i += 2;
            }
            TokenKind::LParen => {
                let inherited = *ctx_stack.last().expect("stack never empty");
                ctx_stack.push(inherited);
                i += 1;
            }
            TokenKind::RParen => {
                if ctx_stack.len() > 1 {
                    ctx_stack.pop();
                }
                i += 1;
                // A subquery closing back into FROM context is a derived
                // table; scan its optional alias.
                if *ctx_stack.last().expect("stack never empty") == Ctx::From {
                    if let Some(alias) = scan_alias(&tokens, &mut i) {
                        refs.tables.push(TableRef {
                            name: None,
                            alias: Some(alias),
                        });
                    }
                }
            }
            TokenKind::Identifier(name) => {
                let ctx = *ctx_stack.last().expect("stack never empty");
                if ctx == Ctx::From {
                    i = parse_table_ref(&tokens, i, name.clone(), &mut refs);
                } else {
                    i = parse_value_ref(&tokens, i, name.clone(), ctx, &mut refs);
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    refs
}

/// Scan `[AS] identifier` at `*i`, advancing past it when present.
fn scan_alias(tokens: &[Token], i: &mut usize) -> Option<String> {
    let mut j = *i;
    if matches!(tokens.get(j).map(|t| &t.kind), Some(TokenKind::As)) {
        j += 1;
    }
    if let Some(TokenKind::Identifier(alias)) = tokens.get(j).map(|t| &t.kind) {
        let alias = alias.clone();
        *i = j + 1;
        Some(alias)
    } else {
        None
    }
}

/// Parse a table reference starting at the identifier at `i`; returns the
/// index after the reference (and its alias, if any).
fn parse_table_ref(tokens: &[Token], i: usize, name: String, refs: &mut SqlReferences) -> usize {
    let mut j = i + 1;
    let mut table_name = name;

    // schema-qualified `db.table`; the last component is the table.
    while matches!(tokens.get(j).map(|t| &t.kind), Some(TokenKind::Dot)) {
        if let Some(TokenKind::Identifier(part)) = tokens.get(j + 1).map(|t| &t.kind) {
            table_name = part.clone();
            j += 2;
        } else {
            break;
        }
    }

    let mut end = j;
    let alias = scan_alias(tokens, &mut end);
    refs.tables.push(TableRef {
        name: Some(table_name),
        alias,
    });
    end
}

/// Parse an identifier in a value position: a function name, an output
/// alias, or a column reference (qualified or not).
fn parse_value_ref(
    tokens: &[Token],
    i: usize,
    name: String,
    ctx: Ctx,
    refs: &mut SqlReferences,
) -> usize {
    let next = tokens.get(i + 1).map(|t| &t.kind);

    // Function call: `name(...)`.
    if matches!(next, Some(TokenKind::LParen)) {
        return i + 1;
    }

    // WITH binding: `name AS (subquery)` defines a CTE, it references
    // nothing.
    if matches!(next, Some(TokenKind::As))
        && matches!(tokens.get(i + 2).map(|t| &t.kind), Some(TokenKind::LParen))
    {
        refs.cte_names.push(name);
        return i + 2;
    }

    // Qualified reference: `t.c` or `t.*`.
    if matches!(next, Some(TokenKind::Dot)) {
        match tokens.get(i + 2).map(|t| &t.kind) {
            Some(TokenKind::Identifier(column)) => {
                refs.columns.push(ColumnRef {
                    table: Some(name),
                    column: column.clone(),
                });
                return i + 3;
            }
            Some(TokenKind::Star) => {
                refs.columns.push(ColumnRef {
                    table: Some(name),
                    column: "*".to_string(),
                });
                return i + 3;
            }
            _ => return i + 1,
        }
    }

    // Output alias: `expr AS name` or `expr name` in the SELECT list.
    if ctx == Ctx::SelectList {
        let prev = i.checked_sub(1).and_then(|p| tokens.get(p)).map(|t| &t.kind);
        let aliases_previous = matches!(
            prev,
            Some(TokenKind::As)
                | Some(TokenKind::Identifier(_))
                | Some(TokenKind::Number(_))
                | Some(TokenKind::String(_))
                | Some(TokenKind::RParen)
                | Some(TokenKind::Star)
                | Some(TokenKind::End)
                | Some(TokenKind::Null)
        );
        if aliases_previous {
            refs.output_aliases.push(name);
            return i + 1;
        }
    } else if matches!(
        i.checked_sub(1).and_then(|p| tokens.get(p)).map(|t| &t.kind),
        Some(TokenKind::As)
    ) {
        // AS outside the SELECT list (e.g. a WITH binding) is a name
        // definition, not a column reference.
        return i + 1;
    }

    refs.columns.push(ColumnRef {
        table: None,
        column: name,
    });
    i + 1
}
