//! NL2SQL Bench - Spider Benchmark Harness
//!
//! Evaluates a question-to-SQL pipeline against the Spider dev set with
//! three complementary metrics: normalized exact match, execution accuracy
//! against the real SQLite databases, and LLM-judged semantic equivalence.

pub mod exact_match;
pub mod execution;
pub mod judge;
pub mod loader;
pub mod report;
pub mod runner;

pub use exact_match::evaluate_exact_match;
pub use execution::{Cell, ExecOutcome, ExecutionEvaluator, ResultSet};
pub use judge::JudgeEvaluator;
pub use loader::{SpiderDataLoader, SpiderSample};
pub use report::{BenchmarkReport, BenchmarkResult, PersistedReport, ReportSummary};
pub use runner::{BenchmarkRunner, SqlPredictor};
