//! Benchmark results and aggregation

use nl2sql_core::BenchConfig;
use serde::{Deserialize, Serialize};

/// Everything recorded for one evaluated sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub sample_id: usize,
    pub db_id: String,
    pub question: String,
    pub gold_sql: String,
    pub predicted_sql: String,
    pub exact_match: bool,
    /// `None` when execution evaluation was disabled or the gold query
    /// itself could not run.
    pub execution_match: Option<bool>,
    /// `None` when the judge was disabled or the sample was not judgeable.
    pub judge_match: Option<bool>,
    pub judge_score: Option<i32>,
    pub judge_rationale: Option<String>,
    pub syntax_valid: bool,
    pub error: Option<String>,
    pub latency_ms: f64,
}

impl BenchmarkResult {
    /// The row recorded when the pipeline itself failed on a sample.
    pub fn error_row(
        sample_id: usize,
        db_id: String,
        question: String,
        gold_sql: String,
        error: String,
        latency_ms: f64,
    ) -> Self {
        Self {
            sample_id,
            db_id,
            question,
            gold_sql,
            predicted_sql: String::new(),
            exact_match: false,
            execution_match: None,
            judge_match: None,
            judge_score: None,
            judge_rationale: None,
            syntax_valid: false,
            error: Some(error),
            latency_ms,
        }
    }
}

/// Aggregated rates over one run. Rates are percentages rounded to two
/// decimals; optional rates cover only the samples where that evaluator
/// actually produced a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub sample_count: usize,
    pub exact_match_rate: f64,
    pub execution_match_rate: Option<f64>,
    pub judge_match_rate: Option<f64>,
    pub judge_avg_score: Option<f64>,
    pub valid_sql_rate: f64,
    pub error_count: usize,
    pub avg_latency_ms: f64,
}

/// Aggregated report plus the per-sample details it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub summary: ReportSummary,
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    /// Aggregate a completed, ordered sequence of results. Pure function;
    /// aggregation happens exactly once per run, after all samples finish.
    pub fn aggregate(results: Vec<BenchmarkResult>) -> Self {
        let sample_count = results.len();

        let exact_matches = results.iter().filter(|r| r.exact_match).count();
        let valid = results.iter().filter(|r| r.syntax_valid).count();
        let error_count = results.iter().filter(|r| r.error.is_some()).count();
        let total_latency: f64 = results.iter().map(|r| r.latency_ms).sum();

        let executed: Vec<bool> = results.iter().filter_map(|r| r.execution_match).collect();
        let judged: Vec<&BenchmarkResult> =
            results.iter().filter(|r| r.judge_match.is_some()).collect();

        let summary = ReportSummary {
            sample_count,
            exact_match_rate: percentage(exact_matches, sample_count),
            execution_match_rate: if executed.is_empty() {
                None
            } else {
                Some(percentage(
                    executed.iter().filter(|m| **m).count(),
                    executed.len(),
                ))
            },
            judge_match_rate: if judged.is_empty() {
                None
            } else {
                Some(percentage(
                    judged.iter().filter(|r| r.judge_match == Some(true)).count(),
                    judged.len(),
                ))
            },
            judge_avg_score: if judged.is_empty() {
                None
            } else {
                let total: i32 = judged.iter().filter_map(|r| r.judge_score).sum();
                Some(round2(total as f64 / judged.len() as f64))
            },
            valid_sql_rate: percentage(valid, sample_count),
            error_count,
            avg_latency_ms: if sample_count == 0 {
                0.0
            } else {
                round2(total_latency / sample_count as f64)
            },
        };

        Self { summary, results }
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The JSON document persisted after a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedReport {
    pub summary: ReportSummary,
    pub timestamp: String,
    pub config: BenchConfig,
    pub details: Vec<BenchmarkResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(sample_id: usize, exact: bool) -> BenchmarkResult {
        BenchmarkResult {
            sample_id,
            db_id: "db".to_string(),
            question: "q".to_string(),
            gold_sql: "SELECT 1".to_string(),
            predicted_sql: "SELECT 1".to_string(),
            exact_match: exact,
            execution_match: None,
            judge_match: None,
            judge_score: None,
            judge_rationale: None,
            syntax_valid: true,
            error: None,
            latency_ms: 100.0,
        }
    }

    #[test]
    fn test_exact_match_rate_is_a_rounded_percentage() {
        let results: Vec<BenchmarkResult> =
            (0..10).map(|i| result(i, i < 3)).collect();
        let report = BenchmarkReport::aggregate(results);
        assert_eq!(report.summary.exact_match_rate, 30.0);
        assert_eq!(report.summary.sample_count, 10);
    }

    #[test]
    fn test_optional_rates_cover_applicable_samples_only() {
        let mut results: Vec<BenchmarkResult> = (0..4).map(|i| result(i, false)).collect();
        results[0].execution_match = Some(true);
        results[1].execution_match = Some(false);
        // Samples 2 and 3 were not executable and must not dilute the rate.
        let report = BenchmarkReport::aggregate(results);
        assert_eq!(report.summary.execution_match_rate, Some(50.0));
        assert_eq!(report.summary.judge_match_rate, None);
        assert_eq!(report.summary.judge_avg_score, None);
    }

    #[test]
    fn test_judge_average_score_over_judged_samples() {
        let mut results: Vec<BenchmarkResult> = (0..3).map(|i| result(i, false)).collect();
        results[0].judge_match = Some(true);
        results[0].judge_score = Some(5);
        results[1].judge_match = Some(false);
        results[1].judge_score = Some(2);
        let report = BenchmarkReport::aggregate(results);
        assert_eq!(report.summary.judge_match_rate, Some(50.0));
        assert_eq!(report.summary.judge_avg_score, Some(3.5));
    }

    #[test]
    fn test_empty_run_aggregates_to_zeroes() {
        let report = BenchmarkReport::aggregate(Vec::new());
        assert_eq!(report.summary.sample_count, 0);
        assert_eq!(report.summary.exact_match_rate, 0.0);
        assert_eq!(report.summary.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_error_rows_count_against_validity() {
        let mut results: Vec<BenchmarkResult> = (0..2).map(|i| result(i, false)).collect();
        results[1] = BenchmarkResult::error_row(
            1,
            "db".to_string(),
            "q".to_string(),
            "SELECT 1".to_string(),
            "provider timeout".to_string(),
            50.0,
        );
        let report = BenchmarkReport::aggregate(results);
        assert_eq!(report.summary.error_count, 1);
        assert_eq!(report.summary.valid_sql_rate, 50.0);
    }
}
