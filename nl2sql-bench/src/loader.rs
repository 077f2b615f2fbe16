//! Spider dataset loading
//!
//! Reads the Spider `dev.json` and `tables.json` files and pre-builds one
//! CREATE TABLE schema string per database for prompting.

use nl2sql_core::BenchError;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One Spider dev-set example. `sample_id` is the position in `dev.json`,
/// assigned before any shuffling so runs are comparable across seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiderSample {
    pub sample_id: usize,
    pub db_id: String,
    pub question: String,
    pub gold_sql: String,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    db_id: String,
    question: String,
    query: String,
}

/// Raw Spider table metadata for one database.
#[derive(Debug, Deserialize)]
struct RawTableInfo {
    db_id: String,
    table_names_original: Vec<String>,
    /// Pairs of (table index, column name); table index -1 is the `*` entry.
    column_names_original: Vec<(i64, String)>,
    column_types: Vec<String>,
    #[serde(default)]
    primary_keys: Vec<usize>,
}

/// Loads and holds the Spider dev set plus per-database schema strings.
#[derive(Debug)]
pub struct SpiderDataLoader {
    samples: Vec<SpiderSample>,
    schemas: HashMap<String, String>,
}

impl SpiderDataLoader {
    /// Load `dev.json` and `tables.json` from a Spider dataset directory.
    pub fn load(spider_dir: impl AsRef<Path>) -> Result<Self, BenchError> {
        let dev_path = spider_dir.as_ref().join("dev.json");
        let tables_path = spider_dir.as_ref().join("tables.json");

        let raw_samples: Vec<RawSample> = read_json(&dev_path)?;
        let raw_tables: Vec<RawTableInfo> = read_json(&tables_path)?;

        let samples = raw_samples
            .into_iter()
            .enumerate()
            .map(|(sample_id, raw)| SpiderSample {
                sample_id,
                db_id: raw.db_id,
                question: raw.question,
                gold_sql: raw.query,
            })
            .collect::<Vec<_>>();

        let mut schemas = HashMap::new();
        for table_info in &raw_tables {
            schemas.insert(table_info.db_id.clone(), build_schema_string(table_info)?);
        }

        tracing::info!(
            samples = samples.len(),
            databases = schemas.len(),
            "loaded Spider dataset"
        );

        Ok(Self { samples, schemas })
    }

    /// Take up to `n` samples, optionally shuffled with a seeded generator
    /// so repeated runs draw the same subset.
    pub fn samples(&self, n: usize, shuffle: bool, seed: u64) -> Vec<SpiderSample> {
        let mut picked = self.samples.clone();
        if shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            picked.shuffle(&mut rng);
        }
        picked.truncate(n);
        picked
    }

    /// The pre-built CREATE TABLE schema string for a database.
    pub fn schema(&self, db_id: &str) -> Option<&str> {
        self.schemas.get(db_id).map(String::as_str)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, BenchError> {
    if !path.exists() {
        return Err(BenchError::DatasetNotFound {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| BenchError::MalformedDataset {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Convert Spider table metadata into CREATE TABLE statements.
fn build_schema_string(info: &RawTableInfo) -> Result<String, BenchError> {
    let mut columns_by_table: HashMap<usize, Vec<(usize, &str)>> = HashMap::new();
    for (column_idx, (table_idx, name)) in info.column_names_original.iter().enumerate() {
        // The shared `*` pseudo-column carries table index -1.
        if *table_idx < 0 {
            continue;
        }
        let table_idx = *table_idx as usize;
        if table_idx >= info.table_names_original.len() {
            return Err(BenchError::MalformedDataset {
                message: format!(
                    "{}: column '{}' references table index {} out of range",
                    info.db_id, name, table_idx
                ),
            });
        }
        columns_by_table
            .entry(table_idx)
            .or_default()
            .push((column_idx, name));
    }

    let mut statements = Vec::new();
    for (table_idx, table_name) in info.table_names_original.iter().enumerate() {
        let Some(columns) = columns_by_table.get(&table_idx) else {
            continue;
        };

        let mut column_defs = Vec::new();
        for (column_idx, name) in columns {
            let sql_type = info
                .column_types
                .get(*column_idx)
                .map(|t| t.to_uppercase())
                .unwrap_or_else(|| "TEXT".to_string());
            let pk = if info.primary_keys.contains(column_idx) {
                " PRIMARY KEY"
            } else {
                ""
            };
            column_defs.push(format!("    {} {}{}", name, sql_type, pk));
        }

        statements.push(format!(
            "CREATE TABLE {} (\n{}\n);",
            table_name,
            column_defs.join(",\n")
        ));
    }

    Ok(statements.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concert_info() -> RawTableInfo {
        RawTableInfo {
            db_id: "concert_singer".to_string(),
            table_names_original: vec!["stadium".to_string(), "singer".to_string()],
            column_names_original: vec![
                (-1, "*".to_string()),
                (0, "Stadium_ID".to_string()),
                (0, "Capacity".to_string()),
                (1, "Singer_ID".to_string()),
                (1, "Name".to_string()),
            ],
            column_types: vec![
                "text".to_string(),
                "number".to_string(),
                "number".to_string(),
                "number".to_string(),
                "text".to_string(),
            ],
            primary_keys: vec![1, 3],
        }
    }

    #[test]
    fn test_schema_string_skips_star_column() {
        let schema = build_schema_string(&concert_info()).unwrap();
        assert!(!schema.contains('*'));
        assert!(schema.contains("CREATE TABLE stadium"));
        assert!(schema.contains("Stadium_ID NUMBER PRIMARY KEY"));
        assert!(schema.contains("Name TEXT"));
    }

    #[test]
    fn test_schema_string_marks_primary_keys_by_global_index() {
        let schema = build_schema_string(&concert_info()).unwrap();
        assert!(schema.contains("Singer_ID NUMBER PRIMARY KEY"));
        assert!(!schema.contains("Capacity NUMBER PRIMARY KEY"));
    }

    #[test]
    fn test_out_of_range_table_index_is_malformed() {
        let mut info = concert_info();
        info.column_names_original.push((9, "ghost".to_string()));
        assert!(matches!(
            build_schema_string(&info),
            Err(BenchError::MalformedDataset { .. })
        ));
    }

    #[test]
    fn test_samples_are_deterministic_per_seed() {
        let loader = SpiderDataLoader {
            samples: (0..50)
                .map(|i| SpiderSample {
                    sample_id: i,
                    db_id: "db".to_string(),
                    question: format!("q{}", i),
                    gold_sql: "SELECT 1".to_string(),
                })
                .collect(),
            schemas: HashMap::new(),
        };

        let a = loader.samples(10, true, 42);
        let b = loader.samples(10, true, 42);
        let c = loader.samples(10, true, 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_unshuffled_samples_keep_dataset_order() {
        let loader = SpiderDataLoader {
            samples: (0..5)
                .map(|i| SpiderSample {
                    sample_id: i,
                    db_id: "db".to_string(),
                    question: format!("q{}", i),
                    gold_sql: "SELECT 1".to_string(),
                })
                .collect(),
            schemas: HashMap::new(),
        };

        let picked = loader.samples(3, false, 42);
        let ids: Vec<usize> = picked.iter().map(|s| s.sample_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_missing_dataset_file_is_reported() {
        let err = SpiderDataLoader::load("/nonexistent/spider").unwrap_err();
        assert!(matches!(err, BenchError::DatasetNotFound { .. }));
    }
}
