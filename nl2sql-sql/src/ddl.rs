//! `CREATE TABLE` schema parser
//!
//! Two-pass: pass 1 collects every table and column definition, pass 2
//! resolves foreign keys against the completed table set so forward
//! references across statements succeed regardless of declaration order.

use crate::lexer::{tokenize, Token, TokenKind};
use nl2sql_core::{Column, ForeignKey, Schema, SchemaParseError, Table};

/// A foreign key recorded during pass 1, before targets are known to exist.
#[derive(Debug, Clone)]
struct PendingForeignKey {
    source_table: String,
    source_columns: Vec<String>,
    target_table: String,
    /// Empty when the DDL wrote `REFERENCES t` without naming columns;
    /// resolution falls back to the target's primary key.
    target_columns: Vec<String>,
}

/// Parse DDL text into a [`Schema`].
///
/// Tolerates trailing semicolons, arbitrary statement order, comments,
/// mixed-case keywords, and both inline and out-of-line key clauses. Fails
/// when a statement is not a recognizable `CREATE TABLE` or when a foreign
/// key never resolves; unresolved references are reported, not dropped.
pub fn parse_schema(ddl: &str) -> Result<Schema, SchemaParseError> {
    let tokens = tokenize(ddl);
    let mut parser = DdlParser {
        source: ddl,
        tokens,
        pos: 0,
    };

    // Pass 1: collect table definitions and pending foreign keys.
    let mut tables: Vec<Table> = Vec::new();
    let mut pending: Vec<PendingForeignKey> = Vec::new();

    loop {
        while parser.check(&TokenKind::Semicolon) {
            parser.advance();
        }
        if parser.is_at_end() {
            break;
        }

        let (table, fks) = parser.parse_create_table()?;
        if tables
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&table.name))
        {
            return Err(SchemaParseError::DuplicateTable { name: table.name });
        }
        tables.push(table);
        pending.extend(fks);
    }

    if tables.is_empty() {
        return Err(SchemaParseError::Empty);
    }

    // Pass 2: resolve foreign keys now that every table is known.
    for fk in pending {
        let resolved = resolve_foreign_key(&tables, &fk)?;
        let source = tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(&fk.source_table))
            .expect("source table collected in pass 1");
        source.foreign_keys.extend(resolved);
    }

    Ok(Schema { tables })
}

fn resolve_foreign_key(
    tables: &[Table],
    fk: &PendingForeignKey,
) -> Result<Vec<ForeignKey>, SchemaParseError> {
    let unresolved = |source_column: &str, target_column: &str, reason: String| {
        SchemaParseError::UnresolvedForeignKey {
            source_table: fk.source_table.clone(),
            source_column: source_column.to_string(),
            target_table: fk.target_table.clone(),
            target_column: target_column.to_string(),
            reason,
        }
    };

    let target = tables
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(&fk.target_table))
        .ok_or_else(|| {
            unresolved(
                &fk.source_columns[0],
                fk.target_columns.first().map(String::as_str).unwrap_or("?"),
                format!("table '{}' not declared", fk.target_table),
            )
        })?;

    let source = tables
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(&fk.source_table))
        .expect("source table collected in pass 1");

    // `REFERENCES t` with no column list points at the target's primary key.
    let target_columns: Vec<String> = if fk.target_columns.is_empty() {
        let pks: Vec<String> = target
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        if pks.len() != fk.source_columns.len() {
            return Err(unresolved(
                &fk.source_columns[0],
                "?",
                format!(
                    "'{}' has no matching primary key to reference",
                    fk.target_table
                ),
            ));
        }
        pks
    } else {
        fk.target_columns.clone()
    };

    if target_columns.len() != fk.source_columns.len() {
        return Err(unresolved(
            &fk.source_columns[0],
            target_columns.first().map(String::as_str).unwrap_or("?"),
            "column count mismatch between key and reference".to_string(),
        ));
    }

    let mut resolved = Vec::new();
    for (src, tgt) in fk.source_columns.iter().zip(target_columns.iter()) {
        if !source.has_column(src) {
            return Err(unresolved(
                src,
                tgt,
                format!("column '{}' not declared in '{}'", src, fk.source_table),
            ));
        }
        if !target.has_column(tgt) {
            return Err(unresolved(
                src,
                tgt,
                format!("column '{}' not declared in '{}'", tgt, fk.target_table),
            ));
        }
        resolved.push(ForeignKey {
            source_table: source.name.clone(),
            source_column: src.clone(),
            target_table: target.name.clone(),
            target_column: tgt.clone(),
        });
    }

    Ok(resolved)
}

struct DdlParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> DdlParser<'a> {
    fn parse_create_table(&mut self) -> Result<(Table, Vec<PendingForeignKey>), SchemaParseError> {
        if !self.check(&TokenKind::Create) {
            let token = self.current();
            return Err(SchemaParseError::NotCreateTable {
                line: token.span.line,
                column: token.span.column,
                found: token.kind.describe(),
            });
        }
        self.advance();
        self.expect(TokenKind::Table, "expected TABLE after CREATE")?;

        // Optional IF NOT EXISTS.
        if self.check(&TokenKind::If) {
            self.advance();
            self.expect(TokenKind::Not, "expected NOT after IF")?;
            self.expect(TokenKind::Exists, "expected EXISTS after IF NOT")?;
        }

        let table_name = self.expect_name("expected table name")?;
        self.expect(TokenKind::LParen, "expected '(' after table name")?;

        let mut columns: Vec<Column> = Vec::new();
        let mut fks: Vec<PendingForeignKey> = Vec::new();
        let mut out_of_line_pks: Vec<String> = Vec::new();

        loop {
            match self.current().kind.clone() {
                TokenKind::Primary => {
                    self.advance();
                    self.expect(TokenKind::Key, "expected KEY after PRIMARY")?;
                    self.expect(TokenKind::LParen, "expected '(' after PRIMARY KEY")?;
                    out_of_line_pks.extend(self.parse_name_list()?);
                    self.expect(TokenKind::RParen, "expected ')' after key columns")?;
                }
                TokenKind::Foreign => {
                    fks.push(self.parse_foreign_key_clause(&table_name)?);
                }
                TokenKind::Constraint => {
                    // CONSTRAINT <name> then a key/check clause.
                    self.advance();
                    self.expect_name("expected constraint name")?;
                    match self.current().kind {
                        TokenKind::Primary => {
                            self.advance();
                            self.expect(TokenKind::Key, "expected KEY after PRIMARY")?;
                            self.expect(TokenKind::LParen, "expected '(' after PRIMARY KEY")?;
                            out_of_line_pks.extend(self.parse_name_list()?);
                            self.expect(TokenKind::RParen, "expected ')' after key columns")?;
                        }
                        TokenKind::Foreign => {
                            fks.push(self.parse_foreign_key_clause(&table_name)?);
                        }
                        TokenKind::Unique | TokenKind::Check => {
                            self.advance();
                            self.skip_parenthesized()?;
                        }
                        _ => {
                            return Err(self.malformed("expected key clause after CONSTRAINT name"))
                        }
                    }
                }
                TokenKind::Unique | TokenKind::Check => {
                    self.advance();
                    self.skip_parenthesized()?;
                }
                _ => {
                    let column = self.parse_column_def(&table_name, &mut fks)?;
                    if columns
                        .iter()
                        .any(|c| c.name.eq_ignore_ascii_case(&column.name))
                    {
                        return Err(SchemaParseError::DuplicateColumn {
                            table: table_name,
                            column: column.name,
                        });
                    }
                    columns.push(column);
                }
            }

            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RParen, "expected ',' or ')' in table body")?;
            break;
        }

        for pk in &out_of_line_pks {
            match columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(pk)) {
                Some(col) => {
                    col.is_primary_key = true;
                    col.is_nullable = false;
                }
                None => {
                    return Err(self.malformed(&format!(
                        "PRIMARY KEY names undeclared column '{}'",
                        pk
                    )))
                }
            }
        }

        if columns.is_empty() {
            return Err(self.malformed("table has no columns"));
        }

        Ok((
            Table {
                name: table_name,
                columns,
                foreign_keys: Vec::new(),
            },
            fks,
        ))
    }

    /// Parse one column definition, including inline constraints. An inline
    /// `REFERENCES t(c)` becomes a pending foreign key like any other.
    fn parse_column_def(
        &mut self,
        table_name: &str,
        fks: &mut Vec<PendingForeignKey>,
    ) -> Result<Column, SchemaParseError> {
        let name = self.expect_name("expected column name")?;

        // The declared type is free-form text up to the first constraint
        // keyword or the end of the definition; sliced from the source so
        // `DECIMAL(10,2)` survives verbatim.
        let type_start = self.current().span.start;
        let mut type_end = type_start;
        let mut depth = 0usize;
        loop {
            match &self.current().kind {
                TokenKind::LParen => {
                    depth += 1;
                    type_end = self.current().span.end;
                    self.advance();
                }
                TokenKind::RParen if depth > 0 => {
                    depth -= 1;
                    type_end = self.current().span.end;
                    self.advance();
                }
                TokenKind::RParen | TokenKind::Comma => break,
                TokenKind::Primary
                | TokenKind::Not
                | TokenKind::Null
                | TokenKind::Unique
                | TokenKind::Default
                | TokenKind::References
                | TokenKind::Check
                | TokenKind::Constraint
                    if depth == 0 =>
                {
                    break
                }
                TokenKind::Eof => return Err(self.malformed("unexpected end of column definition")),
                _ => {
                    type_end = self.current().span.end;
                    self.advance();
                }
            }
        }
        let sql_type = self.source[type_start..type_end].trim().to_string();

        let mut is_primary_key = false;
        let mut is_nullable = true;

        // Inline constraints in any order.
        loop {
            match self.current().kind {
                TokenKind::Primary => {
                    self.advance();
                    self.expect(TokenKind::Key, "expected KEY after PRIMARY")?;
                    is_primary_key = true;
                    is_nullable = false;
                }
                TokenKind::Not => {
                    self.advance();
                    self.expect(TokenKind::Null, "expected NULL after NOT")?;
                    is_nullable = false;
                }
                TokenKind::Null => {
                    self.advance();
                }
                TokenKind::Unique => {
                    self.advance();
                }
                TokenKind::Default => {
                    self.advance();
                    // Default value: a literal (optionally signed), NULL,
                    // or a parenthesized expression.
                    if self.check(&TokenKind::LParen) {
                        self.skip_parenthesized()?;
                    } else {
                        if matches!(self.current().kind, TokenKind::Minus | TokenKind::Plus) {
                            self.advance();
                        }
                        self.advance();
                    }
                }
                TokenKind::Check => {
                    self.advance();
                    self.skip_parenthesized()?;
                }
                TokenKind::References => {
                    self.advance();
                    let target_table = self.expect_name("expected table after REFERENCES")?;
                    let mut target_columns = Vec::new();
                    if self.check(&TokenKind::LParen) {
                        self.advance();
                        target_columns = self.parse_name_list()?;
                        self.expect(TokenKind::RParen, "expected ')' after referenced columns")?;
                    }
                    fks.push(PendingForeignKey {
                        source_table: table_name.to_string(),
                        source_columns: vec![name.clone()],
                        target_table,
                        target_columns,
                    });
                }
                _ => break,
            }
        }

        Ok(Column {
            name,
            sql_type,
            is_primary_key,
            is_nullable,
        })
    }

    /// Parse `FOREIGN KEY (cols) REFERENCES t [(cols)]`. The FOREIGN token
    /// is current when called.
    fn parse_foreign_key_clause(
        &mut self,
        table_name: &str,
    ) -> Result<PendingForeignKey, SchemaParseError> {
        self.advance(); // FOREIGN
        self.expect(TokenKind::Key, "expected KEY after FOREIGN")?;
        self.expect(TokenKind::LParen, "expected '(' after FOREIGN KEY")?;
        let source_columns = self.parse_name_list()?;
        self.expect(TokenKind::RParen, "expected ')' after key columns")?;
        self.expect(TokenKind::References, "expected REFERENCES")?;
        let target_table = self.expect_name("expected table after REFERENCES")?;

        let mut target_columns = Vec::new();
        if self.check(&TokenKind::LParen) {
            self.advance();
            target_columns = self.parse_name_list()?;
            self.expect(TokenKind::RParen, "expected ')' after referenced columns")?;
        }

        Ok(PendingForeignKey {
            source_table: table_name.to_string(),
            source_columns,
            target_table,
            target_columns,
        })
    }

    /// Parse a comma-separated list of names.
    fn parse_name_list(&mut self) -> Result<Vec<String>, SchemaParseError> {
        let mut names = vec![self.expect_name("expected name")?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            names.push(self.expect_name("expected name after ','")?);
        }
        Ok(names)
    }

    /// Skip a balanced parenthesized group if one is present.
    fn skip_parenthesized(&mut self) -> Result<(), SchemaParseError> {
        if !self.check(&TokenKind::LParen) {
            return Ok(());
        }
        self.advance();
        let mut depth = 1usize;
        while depth > 0 {
            match self.current().kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                TokenKind::Eof => return Err(self.malformed("unclosed '(' in constraint")),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), SchemaParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.malformed(message))
        }
    }

    /// Accept an identifier; keywords that commonly double as names in real
    /// dumps (e.g. a column named `key` or `order`) are accepted too when
    /// they appear where a name is required.
    fn expect_name(&mut self, message: &str) -> Result<String, SchemaParseError> {
        let name = match &self.current().kind {
            TokenKind::Identifier(s) => s.clone(),
            TokenKind::Key => "key".to_string(),
            TokenKind::Order => "order".to_string(),
            TokenKind::Group => "group".to_string(),
            TokenKind::Check => "check".to_string(),
            _ => return Err(self.malformed(message)),
        };
        self.advance();
        Ok(name)
    }

    fn malformed(&self, message: &str) -> SchemaParseError {
        let token = self.current();
        SchemaParseError::Malformed {
            line: token.span.line,
            column: token.span.column,
            message: format!("{}, found {}", message, token.kind.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP_DDL: &str = "
        CREATE TABLE customers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER,
            total DECIMAL(10,2),
            FOREIGN KEY (customer_id) REFERENCES customers(id)
        );
    ";

    #[test]
    fn test_parses_multiple_tables() {
        let schema = parse_schema(SHOP_DDL).unwrap();
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(schema.tables[0].name, "customers");
        assert_eq!(schema.tables[1].name, "orders");
    }

    #[test]
    fn test_inline_constraints() {
        let schema = parse_schema(SHOP_DDL).unwrap();
        let customers = schema.table("customers").unwrap();
        let id = customers.column("id").unwrap();
        assert!(id.is_primary_key);
        assert!(!id.is_nullable);
        let name = customers.column("name").unwrap();
        assert!(!name.is_primary_key);
        assert!(!name.is_nullable);
    }

    #[test]
    fn test_signed_numeric_default() {
        let ddl = "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            balance REAL DEFAULT -1,
            bonus REAL DEFAULT +0.5 NOT NULL,
            status TEXT DEFAULT 'open'
        );";
        let schema = parse_schema(ddl).unwrap();
        let accounts = schema.table("accounts").unwrap();
        assert_eq!(accounts.columns.len(), 4);
        assert!(!accounts.column("bonus").unwrap().is_nullable);
    }

    #[test]
    fn test_parenthesized_type_survives_verbatim() {
        let schema = parse_schema(SHOP_DDL).unwrap();
        let total = schema.table("orders").unwrap().column("total").unwrap();
        assert_eq!(total.sql_type, "DECIMAL(10,2)");
    }

    #[test]
    fn test_out_of_line_foreign_key_resolves() {
        let schema = parse_schema(SHOP_DDL).unwrap();
        let orders = schema.table("orders").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        let fk = &orders.foreign_keys[0];
        assert_eq!(fk.source_column, "customer_id");
        assert_eq!(fk.target_table, "customers");
        assert_eq!(fk.target_column, "id");
    }

    #[test]
    fn test_forward_reference_across_statements() {
        // orders declared before customers; pass 2 still resolves the FK.
        let ddl = "
            CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                customer_id INTEGER REFERENCES customers(id)
            );
            CREATE TABLE customers (id INTEGER PRIMARY KEY);
        ";
        let schema = parse_schema(ddl).unwrap();
        assert_eq!(schema.table("orders").unwrap().foreign_keys.len(), 1);
    }

    #[test]
    fn test_unresolved_foreign_key_is_reported() {
        let ddl = "
            CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                customer_id INTEGER,
                FOREIGN KEY (customer_id) REFERENCES customers(id)
            );
        ";
        let err = parse_schema(ddl).unwrap_err();
        match err {
            SchemaParseError::UnresolvedForeignKey { target_table, reason, .. } => {
                assert_eq!(target_table, "customers");
                assert!(reason.contains("not declared"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_target_column_is_reported() {
        let ddl = "
            CREATE TABLE customers (id INTEGER PRIMARY KEY);
            CREATE TABLE orders (
                customer_id INTEGER,
                FOREIGN KEY (customer_id) REFERENCES customers(uuid)
            );
        ";
        let err = parse_schema(ddl).unwrap_err();
        assert!(matches!(err, SchemaParseError::UnresolvedForeignKey { .. }));
        assert!(err.to_string().contains("'uuid' not declared"));
    }

    #[test]
    fn test_out_of_line_primary_key() {
        let ddl = "CREATE TABLE t (a INTEGER, b TEXT, PRIMARY KEY (a, b));";
        let schema = parse_schema(ddl).unwrap();
        let t = schema.table("t").unwrap();
        assert!(t.column("a").unwrap().is_primary_key);
        assert!(t.column("b").unwrap().is_primary_key);
    }

    #[test]
    fn test_references_without_column_list_uses_target_pk() {
        let ddl = "
            CREATE TABLE customers (id INTEGER PRIMARY KEY);
            CREATE TABLE orders (customer_id INTEGER REFERENCES customers);
        ";
        let schema = parse_schema(ddl).unwrap();
        let fk = &schema.table("orders").unwrap().foreign_keys[0];
        assert_eq!(fk.target_column, "id");
    }

    #[test]
    fn test_tolerates_comments_and_mixed_case() {
        let ddl = "
            -- the customer master table
            create table Customers (
                Id integer primary key, /* surrogate */
                Name text not null
            );
        ";
        let schema = parse_schema(ddl).unwrap();
        assert!(schema.has_table("customers"));
    }

    #[test]
    fn test_if_not_exists_and_quoted_names() {
        let ddl = r#"CREATE TABLE IF NOT EXISTS "order items" (id INTEGER PRIMARY KEY);"#;
        let schema = parse_schema(ddl).unwrap();
        assert!(schema.has_table("order items"));
    }

    #[test]
    fn test_non_create_statement_is_fatal() {
        let err = parse_schema("DROP TABLE customers;").unwrap_err();
        assert!(matches!(err, SchemaParseError::NotCreateTable { .. }));
    }

    #[test]
    fn test_duplicate_table_is_fatal() {
        let ddl = "CREATE TABLE t (a INTEGER); CREATE TABLE T (b INTEGER);";
        let err = parse_schema(ddl).unwrap_err();
        assert!(matches!(err, SchemaParseError::DuplicateTable { .. }));
    }

    #[test]
    fn test_duplicate_column_is_fatal() {
        let ddl = "CREATE TABLE t (a INTEGER, A TEXT);";
        let err = parse_schema(ddl).unwrap_err();
        assert!(matches!(err, SchemaParseError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(parse_schema("  ;; "), Err(SchemaParseError::Empty)));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse_schema(SHOP_DDL).unwrap();
        let second = parse_schema(SHOP_DDL).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multi_word_type() {
        let ddl = "CREATE TABLE t (n unsigned big int, ts timestamp default null);";
        let schema = parse_schema(ddl).unwrap();
        let t = schema.table("t").unwrap();
        assert_eq!(t.column("n").unwrap().sql_type, "unsigned big int");
        assert_eq!(t.column("ts").unwrap().sql_type, "timestamp");
    }
}
