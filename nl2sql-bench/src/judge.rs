//! LLM-as-judge evaluation
//!
//! Wraps a judge capability with the benchmark's scoring rules: exact
//! matches never spend a judge call, and transport failures never count in
//! the model's favor.

use nl2sql_core::JudgeVerdict;
use nl2sql_llm::SqlJudge;
use std::sync::Arc;

pub struct JudgeEvaluator {
    judge: Arc<dyn SqlJudge>,
}

impl JudgeEvaluator {
    pub fn new(judge: Arc<dyn SqlJudge>) -> Self {
        Self { judge }
    }

    /// Produce a verdict for one sample. `exact_match` short-circuits to a
    /// full-score verdict without calling the judge.
    pub async fn evaluate(
        &self,
        schema_text: &str,
        question: &str,
        gold_sql: &str,
        predicted_sql: &str,
        exact_match: bool,
    ) -> JudgeVerdict {
        if exact_match {
            return JudgeVerdict {
                equivalent: true,
                score: 5,
                rationale: "Exact match".to_string(),
            };
        }

        match self
            .judge
            .judge(schema_text, question, gold_sql, predicted_sql)
            .await
        {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(error = %err, "judge call failed");
                JudgeVerdict::fail_closed(format!("judge unavailable: {}", err))
            }
        }
    }
}

impl std::fmt::Debug for JudgeEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeEvaluator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nl2sql_core::LlmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJudge {
        calls: AtomicUsize,
        last_schema: std::sync::Mutex<String>,
        result: Result<JudgeVerdict, LlmError>,
    }

    impl CountingJudge {
        fn new(result: Result<JudgeVerdict, LlmError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_schema: std::sync::Mutex::new(String::new()),
                result,
            }
        }
    }

    #[async_trait]
    impl SqlJudge for CountingJudge {
        async fn judge(
            &self,
            schema_text: &str,
            _question: &str,
            _gold: &str,
            _predicted: &str,
        ) -> Result<JudgeVerdict, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_schema.lock().unwrap() = schema_text.to_string();
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_exact_match_skips_the_judge() {
        let judge = Arc::new(CountingJudge::new(Ok(JudgeVerdict::fail_closed(
            "should not run",
        ))));
        let evaluator = JudgeEvaluator::new(judge.clone());

        let verdict = evaluator
            .evaluate("Table: t", "q", "SELECT 1", "select 1", true)
            .await;
        assert!(verdict.equivalent);
        assert_eq!(verdict.score, 5);
        assert_eq!(verdict.rationale, "Exact match");
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_judge_receives_the_schema() {
        let judge = Arc::new(CountingJudge::new(Ok(JudgeVerdict {
            equivalent: true,
            score: 4,
            rationale: "same rows".to_string(),
        })));
        let evaluator = JudgeEvaluator::new(judge.clone());

        evaluator
            .evaluate(
                "CREATE TABLE t (a INTEGER);",
                "q",
                "SELECT a FROM t",
                "SELECT t.a FROM t",
                false,
            )
            .await;
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *judge.last_schema.lock().unwrap(),
            "CREATE TABLE t (a INTEGER);"
        );
    }

    #[tokio::test]
    async fn test_transport_error_fails_closed() {
        let judge = Arc::new(CountingJudge::new(Err(LlmError::RateLimited {
            provider: "huggingface".to_string(),
        })));
        let evaluator = JudgeEvaluator::new(judge);

        let verdict = evaluator
            .evaluate("Table: t", "q", "SELECT a FROM t", "SELECT b FROM t", false)
            .await;
        assert!(!verdict.equivalent);
        assert_eq!(verdict.score, 1);
        assert!(verdict.rationale.contains("judge unavailable"));
    }
}
