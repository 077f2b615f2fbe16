//! NL2SQL SQL - Lexer, Schema Parser, Validators, Normalizer
//!
//! Everything in this crate operates on untrusted SQL text without executing
//! it. The lexer is shared by every stage.
//!
//! Architecture:
//! ```text
//! DDL text ──> SchemaParser ──> Schema ──> render_schema (prompt context)
//!                                  │
//! SQL text ──> Lexer ──> validate_syntax ──> validate_schema (vs Schema)
//!                │
//!                └────> extract_references
//!
//! SQL text ──> normalize (string-level equivalence)
//! ```

pub mod ddl;
pub mod lexer;
pub mod normalize;
pub mod refs;
pub mod render;
pub mod schema_check;
pub mod syntax;

pub use ddl::parse_schema;
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use normalize::{exact_match, normalize};
pub use refs::{extract_references, SqlReferences, TableRef};
pub use render::render_schema;
pub use schema_check::validate_schema;
pub use syntax::validate_syntax;
