//! Structured schema model parsed from `CREATE TABLE` DDL

use serde::{Deserialize, Serialize};

/// A column declared in a `CREATE TABLE` statement.
///
/// The declared type is kept as free-form text (`DECIMAL(10,2)`, `TEXT`, ...);
/// nothing downstream needs a typed representation of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
}

/// A resolved foreign-key edge between two declared columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

/// A table: ordered columns plus its outgoing foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Look up a column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether this table declares a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// The full parsed schema: an ordered sequence of tables.
///
/// Invariant (enforced by the DDL parser): table names are unique
/// case-insensitively, and column names are unique within each table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    /// Look up a table by name, case-insensitively.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Whether the schema declares a table with the given name.
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// All foreign keys across all tables, in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.tables.iter().flat_map(|t| t.foreign_keys.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema {
            tables: vec![
                Table {
                    name: "Customers".to_string(),
                    columns: vec![Column {
                        name: "Id".to_string(),
                        sql_type: "INTEGER".to_string(),
                        is_primary_key: true,
                        is_nullable: false,
                    }],
                    foreign_keys: vec![],
                },
                Table {
                    name: "orders".to_string(),
                    columns: vec![
                        Column {
                            name: "id".to_string(),
                            sql_type: "INTEGER".to_string(),
                            is_primary_key: true,
                            is_nullable: false,
                        },
                        Column {
                            name: "customer_id".to_string(),
                            sql_type: "INTEGER".to_string(),
                            is_primary_key: false,
                            is_nullable: true,
                        },
                    ],
                    foreign_keys: vec![ForeignKey {
                        source_table: "orders".to_string(),
                        source_column: "customer_id".to_string(),
                        target_table: "Customers".to_string(),
                        target_column: "Id".to_string(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        let schema = sample_schema();
        assert!(schema.has_table("customers"));
        assert!(schema.has_table("CUSTOMERS"));
        assert!(!schema.has_table("invoices"));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let schema = sample_schema();
        let customers = schema.table("customers").unwrap();
        assert!(customers.has_column("ID"));
        assert!(!customers.has_column("name"));
    }

    #[test]
    fn test_foreign_keys_iterate_all_tables() {
        let schema = sample_schema();
        let fks: Vec<_> = schema.foreign_keys().collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].target_table, "Customers");
    }
}
