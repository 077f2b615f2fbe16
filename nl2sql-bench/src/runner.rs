//! Benchmark runner
//!
//! Drives the pipeline over a sampled slice of the dev set with bounded
//! concurrency, then aggregates once at the end. A failing sample becomes
//! an error row; only dataset-level problems abort the run.

use crate::exact_match::evaluate_exact_match;
use crate::execution::ExecutionEvaluator;
use crate::judge::JudgeEvaluator;
use crate::loader::{SpiderDataLoader, SpiderSample};
use crate::report::{BenchmarkReport, BenchmarkResult, PersistedReport};
use async_trait::async_trait;
use nl2sql_core::{BenchConfig, BenchError, Nl2SqlError};
use nl2sql_pipeline::Nl2SqlPipeline;
use nl2sql_sql::validate_syntax;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// The system under test: anything that turns a schema and question into
/// SQL. Implemented by the production pipeline.
#[async_trait]
pub trait SqlPredictor: Send + Sync {
    async fn predict(&self, schema_ddl: &str, question: &str) -> Result<String, Nl2SqlError>;
}

#[async_trait]
impl SqlPredictor for Nl2SqlPipeline {
    async fn predict(&self, schema_ddl: &str, question: &str) -> Result<String, Nl2SqlError> {
        self.generate_sql_only(schema_ddl, question).await
    }
}

pub struct BenchmarkRunner {
    loader: SpiderDataLoader,
    pipeline: Option<Arc<dyn SqlPredictor>>,
    judge: Option<Arc<JudgeEvaluator>>,
    execution: Option<Arc<ExecutionEvaluator>>,
    config: BenchConfig,
    cancel: Arc<AtomicBool>,
}

impl BenchmarkRunner {
    pub fn new(loader: SpiderDataLoader, config: BenchConfig) -> Self {
        Self {
            loader,
            pipeline: None,
            judge: None,
            execution: None,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_pipeline(&mut self, pipeline: Arc<dyn SqlPredictor>) -> &mut Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn set_judge(&mut self, judge: JudgeEvaluator) -> &mut Self {
        self.judge = Some(Arc::new(judge));
        self
    }

    pub fn set_execution(&mut self, evaluator: ExecutionEvaluator) -> &mut Self {
        self.execution = Some(Arc::new(evaluator));
        self
    }

    /// Flag observed at sample boundaries; setting it stops the run after
    /// in-flight samples finish.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run the benchmark over `n_samples` drawn with the configured seed.
    pub async fn run(&self) -> Result<BenchmarkReport, BenchError> {
        let pipeline = self.pipeline.clone().ok_or(BenchError::PipelineNotSet)?;

        let samples =
            self.loader
                .samples(self.config.n_samples, self.config.shuffle, self.config.seed);
        tracing::info!(
            samples = samples.len(),
            concurrency = self.config.concurrency,
            judge = self.judge.is_some(),
            execution = self.execution.is_some(),
            "starting benchmark run"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks: JoinSet<BenchmarkResult> = JoinSet::new();

        for sample in samples {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!("cancellation requested, no further samples");
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BenchError::Cancelled)?;

            let schema_ddl = self.loader.schema(&sample.db_id).unwrap_or("").to_string();
            let pipeline = pipeline.clone();
            let judge = self.judge.clone();
            let execution = self.execution.clone();

            tasks.spawn(async move {
                let _permit = permit;
                evaluate_sample(sample, schema_ddl, pipeline, judge, execution).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    if results.len() % 10 == 9 {
                        tracing::info!(completed = results.len() + 1, "benchmark progress");
                    }
                    results.push(result);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "sample task panicked");
                }
            }
        }

        if results.is_empty() && self.cancel.load(Ordering::SeqCst) {
            return Err(BenchError::Cancelled);
        }

        // Completion order depends on scheduling; sort for determinism.
        results.sort_by_key(|r| r.sample_id);
        let report = BenchmarkReport::aggregate(results);

        tracing::info!(
            samples = report.summary.sample_count,
            exact_match_rate = report.summary.exact_match_rate,
            errors = report.summary.error_count,
            "benchmark run complete"
        );

        if let Some(dir) = &self.config.output_dir {
            let path = self.save_report(&report, dir.clone())?;
            tracing::info!(path = %path.display(), "report saved");
        }

        Ok(report)
    }

    fn save_report(&self, report: &BenchmarkReport, dir: PathBuf) -> Result<PathBuf, BenchError> {
        std::fs::create_dir_all(&dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = dir.join(format!("benchmark_{}.json", timestamp));

        let persisted = PersistedReport {
            summary: report.summary.clone(),
            timestamp,
            config: self.config.clone(),
            details: report.results.clone(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&persisted)?)?;
        Ok(path)
    }
}

async fn evaluate_sample(
    sample: SpiderSample,
    schema_ddl: String,
    pipeline: Arc<dyn SqlPredictor>,
    judge: Option<Arc<JudgeEvaluator>>,
    execution: Option<Arc<ExecutionEvaluator>>,
) -> BenchmarkResult {
    let started = Instant::now();

    let predicted_sql = match pipeline.predict(&schema_ddl, &sample.question).await {
        Ok(sql) => sql,
        Err(err) => {
            return BenchmarkResult::error_row(
                sample.sample_id,
                sample.db_id,
                sample.question,
                sample.gold_sql,
                err.to_string(),
                elapsed_ms(started),
            );
        }
    };
    let latency_ms = elapsed_ms(started);

    let exact_match = evaluate_exact_match(&sample.gold_sql, &predicted_sql);
    let syntax_valid = validate_syntax(&predicted_sql).is_valid();

    let mut result = BenchmarkResult {
        sample_id: sample.sample_id,
        db_id: sample.db_id,
        question: sample.question,
        gold_sql: sample.gold_sql,
        predicted_sql,
        exact_match,
        execution_match: None,
        judge_match: None,
        judge_score: None,
        judge_rationale: None,
        syntax_valid,
        error: None,
        latency_ms,
    };

    // Judge runs on exact matches (short-circuited) and on valid SQL only;
    // invalid SQL cannot be semantically equivalent.
    if let Some(judge) = judge {
        if exact_match || syntax_valid {
            let verdict = judge
                .evaluate(
                    &schema_ddl,
                    &result.question,
                    &result.gold_sql,
                    &result.predicted_sql,
                    exact_match,
                )
                .await;
            result.judge_match = Some(verdict.equivalent);
            result.judge_score = Some(verdict.score);
            result.judge_rationale = Some(verdict.rationale);
        }
    }

    if let Some(execution) = execution {
        let outcome = execution
            .evaluate(&result.gold_sql, &result.predicted_sql, &result.db_id)
            .await;
        result.execution_match = outcome.match_flag();
        if result.execution_match.is_none() {
            tracing::debug!(
                sample = result.sample_id,
                message = outcome.message(),
                "sample not executable"
            );
        }
    }

    result
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
