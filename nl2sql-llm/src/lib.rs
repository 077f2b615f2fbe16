//! NL2SQL LLM - Capability Traits and Providers
//!
//! Provider-agnostic traits for the three external language-model
//! capabilities the pipeline consumes: SQL generation, SQL repair, and
//! semantic-equivalence judgment. Each capability is untrusted text
//! generation; callers must validate everything that comes back.

pub mod extract;
pub mod prompts;
pub mod providers;

pub use extract::{extract_sql, parse_judge_verdict};
pub use providers::{HuggingFaceClient, HuggingFaceProvider};

use async_trait::async_trait;
use nl2sql_core::{JudgeVerdict, LlmError};

/// Trait for SQL generation providers: the reasoning step, the SQL step,
/// and the human-readable answer step.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Produce step-by-step reasoning for how to answer `question` against
    /// the rendered schema.
    async fn plan(&self, question: &str, schema_text: &str) -> Result<String, LlmError>;

    /// Produce a candidate SQL query. The output is raw model text; callers
    /// run it through [`extract_sql`] and the validators.
    async fn generate(
        &self,
        question: &str,
        schema_text: &str,
        reasoning: &str,
    ) -> Result<String, LlmError>;

    /// Produce a short plain-language explanation of the final query.
    async fn explain(
        &self,
        question: &str,
        sql: &str,
        reasoning: &str,
    ) -> Result<String, LlmError>;
}

/// Trait for the SQL repair capability used by the correction loop.
/// The returned text may be non-SQL, unchanged, or differently wrong; the
/// orchestrator re-validates every round.
#[async_trait]
pub trait SqlFixer: Send + Sync {
    async fn fix(
        &self,
        sql: &str,
        diagnostic: &str,
        schema_text: &str,
        question: &str,
    ) -> Result<String, LlmError>;
}

/// Trait for the semantic-equivalence judge. The judge sees the schema so
/// it can reason about joins and column semantics, not just query text.
/// Malformed judge output is mapped to a fail-closed verdict by the
/// implementation, never silently to a match.
#[async_trait]
pub trait SqlJudge: Send + Sync {
    async fn judge(
        &self,
        schema_text: &str,
        question: &str,
        gold_sql: &str,
        predicted_sql: &str,
    ) -> Result<JudgeVerdict, LlmError>;
}
