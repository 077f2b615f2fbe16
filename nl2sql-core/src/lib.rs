//! NL2SQL Core - Data Types
//!
//! Pure data structures with no behavior beyond invariant-preserving
//! constructors and lookups. All other crates depend on this.

pub mod config;
pub mod error;
pub mod schema;
pub mod validation;

pub use config::*;
pub use error::*;
pub use schema::*;
pub use validation::*;
