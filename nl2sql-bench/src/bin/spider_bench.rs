//! Spider benchmark entry point
//!
//! Configuration comes from the environment:
//! - `SPIDER_DIR` (required): Spider dataset directory with dev.json/tables.json
//! - `HF_API_KEY` (required): Hugging Face access token
//! - `SPIDER_DATABASES_DIR`: enables execution-accuracy evaluation
//! - `BENCH_SAMPLES`, `BENCH_SEED`, `BENCH_CONCURRENCY`: run shape
//! - `BENCH_JUDGE=1`: enables LLM-judge evaluation
//! - `BENCH_OUTPUT_DIR`: where to save the JSON report

use nl2sql_bench::{BenchmarkRunner, ExecutionEvaluator, JudgeEvaluator, SpiderDataLoader};
use nl2sql_core::{BenchConfig, CorrectionConfig, ExecutionConfig, GenerationConfig};
use nl2sql_llm::HuggingFaceProvider;
use nl2sql_pipeline::Nl2SqlPipeline;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let spider_dir = std::env::var("SPIDER_DIR")
        .map_err(|_| "SPIDER_DIR must point at the Spider dataset directory")?;
    let api_key =
        std::env::var("HF_API_KEY").map_err(|_| "HF_API_KEY must hold an access token")?;

    let defaults = BenchConfig::default();
    let config = BenchConfig {
        n_samples: env_parse("BENCH_SAMPLES", defaults.n_samples),
        seed: env_parse("BENCH_SEED", defaults.seed),
        concurrency: env_parse("BENCH_CONCURRENCY", defaults.concurrency),
        databases_dir: std::env::var("SPIDER_DATABASES_DIR").ok().map(Into::into),
        enable_judge: std::env::var("BENCH_JUDGE").is_ok_and(|v| v == "1"),
        output_dir: std::env::var("BENCH_OUTPUT_DIR").ok().map(Into::into),
        ..defaults
    };

    let provider = Arc::new(HuggingFaceProvider::new(api_key, GenerationConfig::default()));
    let pipeline = Nl2SqlPipeline::new(
        provider.clone(),
        provider.clone(),
        GenerationConfig::default(),
        CorrectionConfig::default(),
    );

    let loader = SpiderDataLoader::load(&spider_dir)?;
    let mut runner = BenchmarkRunner::new(loader, config.clone());
    runner.set_pipeline(Arc::new(pipeline));
    if config.enable_judge {
        runner.set_judge(JudgeEvaluator::new(provider));
    }
    if let Some(dir) = &config.databases_dir {
        runner.set_execution(ExecutionEvaluator::new(dir.clone(), ExecutionConfig::default()));
    }

    let report = runner.run().await?;
    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}
