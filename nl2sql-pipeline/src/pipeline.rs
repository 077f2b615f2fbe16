//! End-to-end question-to-SQL pipeline

use crate::orchestrator::CorrectionOrchestrator;
use nl2sql_core::{CorrectionConfig, GenerationConfig, Nl2SqlError, VerifiedSql};
use nl2sql_llm::{extract_sql, SqlFixer, SqlGenerator};
use nl2sql_sql::{parse_schema, render_schema};
use serde::Serialize;
use std::sync::Arc;

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Best-effort final SQL, valid or not; check `verification`.
    pub sql: String,
    /// The model's step-by-step reasoning.
    pub reasoning: String,
    /// Plain-language explanation of the final query.
    pub answer: String,
    pub verification: VerifiedSql,
}

/// Question-to-SQL pipeline: plan, generate, verify with bounded
/// correction, explain.
pub struct Nl2SqlPipeline {
    generator: Arc<dyn SqlGenerator>,
    fixer: Arc<dyn SqlFixer>,
    generation: GenerationConfig,
    correction: CorrectionConfig,
}

impl Nl2SqlPipeline {
    pub fn new(
        generator: Arc<dyn SqlGenerator>,
        fixer: Arc<dyn SqlFixer>,
        generation: GenerationConfig,
        correction: CorrectionConfig,
    ) -> Self {
        Self {
            generator,
            fixer,
            generation,
            correction,
        }
    }

    /// Run the full pipeline. Schema parse failures are fatal; everything
    /// downstream of a parsed schema degrades to a best-effort result.
    pub async fn run(&self, schema_ddl: &str, question: &str) -> Result<PipelineOutput, Nl2SqlError> {
        let (verification, reasoning, schema_text) =
            self.generate_and_verify(schema_ddl, question).await?;

        let answer = self
            .generator
            .explain(question, &verification.sql, &reasoning)
            .await?;

        tracing::info!(
            valid = verification.is_valid,
            corrections = verification.corrections_made(),
            schema_chars = schema_text.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            sql: verification.sql.clone(),
            reasoning,
            answer,
            verification,
        })
    }

    /// Benchmark entry point: produce the verified SQL without the
    /// explanation step.
    pub async fn generate_sql_only(
        &self,
        schema_ddl: &str,
        question: &str,
    ) -> Result<String, Nl2SqlError> {
        let (verification, _, _) = self.generate_and_verify(schema_ddl, question).await?;
        Ok(verification.sql)
    }

    async fn generate_and_verify(
        &self,
        schema_ddl: &str,
        question: &str,
    ) -> Result<(VerifiedSql, String, String), Nl2SqlError> {
        let schema = parse_schema(schema_ddl)?;
        let schema_text = render_schema(&schema);

        tracing::debug!(model = %self.generation.model, "planning query");
        let reasoning = self.generator.plan(question, &schema_text).await?;

        let raw = self
            .generator
            .generate(question, &schema_text, &reasoning)
            .await?;
        let candidate = extract_sql(&raw);

        let orchestrator = CorrectionOrchestrator::new(schema, self.correction);
        let verification = orchestrator
            .verify(question, &candidate, self.fixer.as_ref())
            .await;

        Ok((verification, reasoning, schema_text))
    }
}

impl std::fmt::Debug for Nl2SqlPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nl2SqlPipeline")
            .field("model", &self.generation.model)
            .field("max_attempts", &self.correction.max_attempts)
            .finish()
    }
}
