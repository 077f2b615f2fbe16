//! Lexer module for SQL text

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
