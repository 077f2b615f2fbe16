//! Deterministic schema rendering for LLM prompt context
//!
//! The rendered block is consumed verbatim as prompt text, so it must be
//! whitespace-stable: equal schemas render byte-identically.

use nl2sql_core::Schema;

/// Render a schema as a deterministic, whitespace-stable text block:
/// per-table column listings with key markers, per-table foreign keys, and
/// a flattened relationship summary at the end.
pub fn render_schema(schema: &Schema) -> String {
    let mut out = String::new();

    for table in &schema.tables {
        out.push_str("Table: ");
        out.push_str(&table.name);
        out.push('\n');

        for column in &table.columns {
            out.push_str("  - ");
            out.push_str(&column.name);
            if !column.sql_type.is_empty() {
                out.push(' ');
                out.push_str(&column.sql_type);
            }
            if column.is_primary_key {
                out.push_str(" [PK]");
            }
            if !column.is_nullable && !column.is_primary_key {
                out.push_str(" [NOT NULL]");
            }
            out.push('\n');
        }

        if !table.foreign_keys.is_empty() {
            out.push_str("  Foreign keys:\n");
            for fk in &table.foreign_keys {
                out.push_str("    ");
                out.push_str(&fk.source_column);
                out.push_str(" -> ");
                out.push_str(&fk.target_table);
                out.push('.');
                out.push_str(&fk.target_column);
                out.push('\n');
            }
        }

        out.push('\n');
    }

    let relationships: Vec<String> = schema
        .foreign_keys()
        .map(|fk| {
            format!(
                "  {}.{} -> {}.{}",
                fk.source_table, fk.source_column, fk.target_table, fk.target_column
            )
        })
        .collect();

    if relationships.is_empty() {
        out.push_str("Relationships: none\n");
    } else {
        out.push_str("Relationships:\n");
        out.push_str(&relationships.join("\n"));
        out.push('\n');
    }

    out
}
