//! Schema validation of SQL references
//!
//! Resolves aliases to tables and checks every reference against the parsed
//! schema. Ambiguous unqualified columns are flagged distinctly from
//! not-found ones; the repairs differ (qualify vs. rename).

use crate::refs::extract_references;
use nl2sql_core::{Schema, UnresolvedRef, ValidationOutcome};
use std::collections::HashMap;

/// What an alias or table name resolves to.
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    /// A declared schema table.
    Table(&'a nl2sql_core::Table),
    /// A derived table or CTE; columns unknown, so uncheckable references
    /// against it are skipped rather than guessed wrong.
    Opaque,
}

/// Validate that every table and column referenced by `sql` exists in
/// `schema`. Returns `Valid` or `Schema` listing every failed reference.
pub fn validate_schema(sql: &str, schema: &Schema) -> ValidationOutcome {
    let refs = extract_references(sql);
    let mut unresolved: Vec<UnresolvedRef> = Vec::new();

    // Build the resolution scope: alias -> target, plus unaliased tables
    // under their own names.
    let mut scope: HashMap<String, Resolved> = HashMap::new();
    let mut in_scope_tables: Vec<&nl2sql_core::Table> = Vec::new();

    for cte in &refs.cte_names {
        scope.insert(cte.to_lowercase(), Resolved::Opaque);
    }

    for table_ref in &refs.tables {
        let resolved = match &table_ref.name {
            Some(name) => {
                if refs
                    .cte_names
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(name))
                {
                    Resolved::Opaque
                } else {
                    match schema.table(name) {
                        Some(table) => {
                            if !in_scope_tables.iter().any(|t| std::ptr::eq(*t, table)) {
                                in_scope_tables.push(table);
                            }
                            Resolved::Table(table)
                        }
                        None => {
                            let unknown = UnresolvedRef::Table { name: name.clone() };
                            if !unresolved.contains(&unknown) {
                                unresolved.push(unknown);
                            }
                            continue;
                        }
                    }
                }
            }
            None => Resolved::Opaque,
        };

        if let Some(alias) = &table_ref.alias {
            scope.insert(alias.to_lowercase(), resolved);
        }
        if let Some(name) = &table_ref.name {
            scope.entry(name.to_lowercase()).or_insert(resolved);
        }
    }

    for column_ref in &refs.columns {
        let failure = match &column_ref.table {
            Some(qualifier) => {
                match scope.get(&qualifier.to_lowercase()) {
                    Some(Resolved::Opaque) => None,
                    Some(Resolved::Table(table)) => {
                        if column_ref.column == "*" || table.has_column(&column_ref.column) {
                            None
                        } else {
                            Some(UnresolvedRef::Column {
                                table: Some(table.name.clone()),
                                column: column_ref.column.clone(),
                            })
                        }
                    }
                    // Qualifier names a table never brought into scope;
                    // check it against the schema directly so the
                    // diagnostic points at the right fix.
                    None => match schema.table(qualifier) {
                        Some(table) => {
                            if column_ref.column == "*" || table.has_column(&column_ref.column) {
                                None
                            } else {
                                Some(UnresolvedRef::Column {
                                    table: Some(table.name.clone()),
                                    column: column_ref.column.clone(),
                                })
                            }
                        }
                        None => Some(UnresolvedRef::Table {
                            name: qualifier.clone(),
                        }),
                    },
                }
            }
            None => {
                if refs
                    .output_aliases
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(&column_ref.column))
                {
                    None
                } else {
                    let candidates: Vec<String> = in_scope_tables
                        .iter()
                        .filter(|t| t.has_column(&column_ref.column))
                        .map(|t| t.name.clone())
                        .collect();
                    match candidates.len() {
                        1 => None,
                        0 => {
                            // No match in scope. A derived table or CTE in
                            // scope could still supply it; only flag when
                            // every in-scope source is a known table.
                            let has_opaque = refs.tables.iter().any(|t| t.name.is_none())
                                || !refs.cte_names.is_empty();
                            if has_opaque {
                                None
                            } else {
                                Some(UnresolvedRef::Column {
                                    table: None,
                                    column: column_ref.column.clone(),
                                })
                            }
                        }
                        _ => Some(UnresolvedRef::AmbiguousColumn {
                            column: column_ref.column.clone(),
                            candidates,
                        }),
                    }
                }
            }
        };

        if let Some(failure) = failure {
            if !unresolved.contains(&failure) {
                unresolved.push(failure);
            }
        }
    }

    if unresolved.is_empty() {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Schema { unresolved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::parse_schema;

    fn shop_schema() -> Schema {
        parse_schema(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 customer_id INTEGER,
                 total DECIMAL(10,2),
                 FOREIGN KEY (customer_id) REFERENCES customers(id)
             );",
        )
        .unwrap()
    }

    fn unresolved(outcome: ValidationOutcome) -> Vec<UnresolvedRef> {
        match outcome {
            ValidationOutcome::Schema { unresolved } => unresolved,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolvable_references_pass() {
        let schema = shop_schema();
        let outcome = validate_schema(
            "SELECT c.name, SUM(o.total) FROM customers c \
             JOIN orders o ON o.customer_id = c.id \
             GROUP BY c.name HAVING SUM(o.total) > 1000",
            &schema,
        );
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_unknown_table_is_flagged() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema("SELECT * FROM invoices", &schema));
        assert_eq!(
            refs,
            vec![UnresolvedRef::Table {
                name: "invoices".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_qualified_column_is_flagged() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema(
            "SELECT orders.amount FROM orders",
            &schema,
        ));
        assert_eq!(
            refs,
            vec![UnresolvedRef::Column {
                table: Some("orders".to_string()),
                column: "amount".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_column_through_alias() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema(
            "SELECT o.amount FROM orders o",
            &schema,
        ));
        // Diagnostic names the resolved table, not the alias.
        assert_eq!(
            refs,
            vec![UnresolvedRef::Column {
                table: Some("orders".to_string()),
                column: "amount".to_string()
            }]
        );
    }

    #[test]
    fn test_unqualified_column_in_single_table() {
        let schema = shop_schema();
        let outcome = validate_schema("SELECT total FROM orders WHERE total > 10", &schema);
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_ambiguous_column_is_distinct_from_not_found() {
        let schema = shop_schema();
        // `id` exists in both joined tables.
        let refs = unresolved(validate_schema(
            "SELECT id FROM customers JOIN orders ON orders.customer_id = customers.id",
            &schema,
        ));
        assert_eq!(
            refs,
            vec![UnresolvedRef::AmbiguousColumn {
                column: "id".to_string(),
                candidates: vec!["customers".to_string(), "orders".to_string()]
            }]
        );
    }

    #[test]
    fn test_unqualified_not_found() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema("SELECT amount FROM orders", &schema));
        assert_eq!(
            refs,
            vec![UnresolvedRef::Column {
                table: None,
                column: "amount".to_string()
            }]
        );
    }

    #[test]
    fn test_output_alias_usable_in_order_by() {
        let schema = shop_schema();
        let outcome = validate_schema(
            "SELECT SUM(total) AS spent FROM orders ORDER BY spent DESC",
            &schema,
        );
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_cte_reference_is_not_an_unknown_table() {
        let schema = shop_schema();
        let outcome = validate_schema(
            "WITH big AS (SELECT customer_id FROM orders WHERE total > 100) \
             SELECT * FROM big",
            &schema,
        );
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_derived_table_columns_are_not_guessed() {
        let schema = shop_schema();
        let outcome = validate_schema(
            "SELECT x.anything FROM (SELECT total FROM orders) x",
            &schema,
        );
        // `x` is opaque; nothing to check against.
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_every_failure_is_listed() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema(
            "SELECT orders.amount, orders.quantity FROM orders",
            &schema,
        ));
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_duplicate_failures_are_deduplicated() {
        let schema = shop_schema();
        let refs = unresolved(validate_schema(
            "SELECT orders.amount FROM orders WHERE orders.amount > 1",
            &schema,
        ));
        assert_eq!(refs.len(), 1);
    }
}
