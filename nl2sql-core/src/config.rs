//! Configuration types
//!
//! Every stage takes its configuration explicitly at construction time, so
//! multiple configurations can run concurrently in benchmarks. Nothing reads
//! ambient global state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Generation parameters for the SQL-producing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_new_tokens: i32,
    /// Low temperature keeps SQL generation close to deterministic.
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "Qwen/Qwen2.5-Coder-32B-Instruct".to_string(),
            max_new_tokens: 2048,
            temperature: 0.1,
        }
    }
}

/// Bounds for the correction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Maximum fix round-trips after the initial candidate.
    pub max_attempts: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Sandboxed-execution settings for the execution evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-query timeout. Untrusted queries must not hang an evaluation.
    pub timeout: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Settings for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub n_samples: usize,
    pub shuffle: bool,
    pub seed: u64,
    /// Upper bound on samples evaluated concurrently.
    pub concurrency: usize,
    /// Spider databases directory; enables execution-accuracy evaluation.
    pub databases_dir: Option<PathBuf>,
    /// Whether to run the LLM judge on non-exact-match samples.
    pub enable_judge: bool,
    /// Where to persist the JSON report, if anywhere.
    pub output_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            n_samples: 100,
            shuffle: true,
            seed: 42,
            concurrency: 4,
            databases_dir: None,
            enable_judge: false,
            output_dir: None,
        }
    }
}
