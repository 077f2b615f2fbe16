//! Bounded self-correction loop
//!
//! Validates a SQL candidate and, while it fails, asks the fix capability
//! for a repair. The loop is a small explicit state machine; every round is
//! recorded in the audit trail regardless of how it ends.

use nl2sql_core::{CorrectionAttempt, CorrectionConfig, ValidationOutcome, VerifiedSql};
use nl2sql_core::Schema;
use nl2sql_llm::{extract_sql, SqlFixer};
use nl2sql_sql::{render_schema, validate_schema, validate_syntax};

/// States of the correction loop.
///
/// Validating and Correcting alternate; Valid and Exhausted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// A candidate is being checked against syntax and schema.
    Validating,
    /// The last candidate failed and a fix round-trip is running.
    Correcting,
    /// The current candidate passed both validators.
    Valid,
    /// The retry budget ran out with no valid candidate.
    Exhausted,
}

/// Runs the validate-fix-revalidate loop for one schema.
pub struct CorrectionOrchestrator {
    schema: Schema,
    schema_text: String,
    config: CorrectionConfig,
}

impl CorrectionOrchestrator {
    pub fn new(schema: Schema, config: CorrectionConfig) -> Self {
        let schema_text = render_schema(&schema);
        Self {
            schema,
            schema_text,
            config,
        }
    }

    /// Validate `candidate_sql`, repairing through `fixer` up to the
    /// configured number of round-trips. Always returns the best-effort
    /// final candidate with the full trail; exhaustion is not an error.
    pub async fn verify(
        &self,
        question: &str,
        candidate_sql: &str,
        fixer: &dyn SqlFixer,
    ) -> VerifiedSql {
        let mut candidate = candidate_sql.trim().to_string();
        let mut attempts: Vec<CorrectionAttempt> = Vec::new();
        let mut fixes_used = 0usize;
        let mut state = OrchestratorState::Validating;

        loop {
            match state {
                OrchestratorState::Validating => {
                    let outcome = self.validate(&candidate);
                    let attempt_index = attempts.len();
                    tracing::debug!(
                        attempt = attempt_index,
                        valid = outcome.is_valid(),
                        "validated candidate"
                    );
                    attempts.push(CorrectionAttempt {
                        attempt_index,
                        input_sql: candidate.clone(),
                        outcome: outcome.clone(),
                        repaired_sql: None,
                    });

                    if outcome.is_valid() {
                        state = OrchestratorState::Valid;
                    } else if fixes_used < self.config.max_attempts {
                        state = OrchestratorState::Correcting;
                    } else {
                        state = OrchestratorState::Exhausted;
                    }
                }
                OrchestratorState::Correcting => {
                    let diagnostic = render_diagnostic(
                        &attempts.last().expect("at least one attempt").outcome,
                    );
                    fixes_used += 1;
                    tracing::debug!(round = fixes_used, %diagnostic, "requesting repair");

                    match fixer
                        .fix(&candidate, &diagnostic, &self.schema_text, question)
                        .await
                    {
                        Ok(raw) => {
                            let repaired = extract_sql(&raw);
                            attempts.last_mut().expect("just pushed").repaired_sql =
                                Some(repaired.clone());
                            candidate = repaired;
                        }
                        Err(err) => {
                            // A failed round-trip still consumes a retry;
                            // the previous candidate stays in play.
                            tracing::debug!(error = %err, "fix round-trip failed");
                        }
                    }
                    state = OrchestratorState::Validating;
                }
                OrchestratorState::Valid => {
                    return VerifiedSql {
                        sql: candidate,
                        is_valid: true,
                        attempts,
                    };
                }
                OrchestratorState::Exhausted => {
                    tracing::debug!(rounds = fixes_used, "correction budget exhausted");
                    return VerifiedSql {
                        sql: candidate,
                        is_valid: false,
                        attempts,
                    };
                }
            }
        }
    }

    /// Syntax first; schema checking only runs on well-formed statements.
    fn validate(&self, sql: &str) -> ValidationOutcome {
        let outcome = validate_syntax(sql);
        if !outcome.is_valid() {
            return outcome;
        }
        validate_schema(sql, &self.schema)
    }

    pub fn schema_text(&self) -> &str {
        &self.schema_text
    }
}

/// Format a validator outcome for the correction prompt.
pub fn render_diagnostic(outcome: &ValidationOutcome) -> String {
    outcome.diagnostic()
}
