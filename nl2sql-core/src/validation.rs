//! Validation outcomes and the correction audit trail

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table or column reference found in a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Qualifier (table name or alias) if the reference was qualified.
    pub table: Option<String>,
    pub column: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// A reference that failed to resolve against the schema.
///
/// Ambiguity is a distinct variant from not-found: both are repair targets,
/// but the fixes differ (qualify vs. rename).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedRef {
    /// A FROM/JOIN target that is not a declared table.
    Table { name: String },
    /// A column that exists in no in-scope table.
    Column {
        table: Option<String>,
        column: String,
    },
    /// An unqualified column that exists in more than one in-scope table.
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
    },
}

impl fmt::Display for UnresolvedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedRef::Table { name } => write!(f, "unknown table '{}'", name),
            UnresolvedRef::Column { table: Some(t), column } => {
                write!(f, "unknown column '{}.{}'", t, column)
            }
            UnresolvedRef::Column { table: None, column } => {
                write!(f, "unknown column '{}'", column)
            }
            UnresolvedRef::AmbiguousColumn { column, candidates } => write!(
                f,
                "ambiguous column '{}' (present in: {})",
                column,
                candidates.join(", ")
            ),
        }
    }
}

/// Outcome of validating one SQL candidate. Produced fresh per check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// Syntactically well-formed and every reference resolves.
    Valid,
    /// The statement is not grammatically well-formed.
    Syntax {
        detail: String,
        line: usize,
        column: usize,
    },
    /// Syntax passed but one or more references failed to resolve.
    Schema { unresolved: Vec<UnresolvedRef> },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Human-readable diagnostic suitable for a correction prompt.
    pub fn diagnostic(&self) -> String {
        match self {
            ValidationOutcome::Valid => "valid".to_string(),
            ValidationOutcome::Syntax { detail, line, column } => {
                format!("Syntax error at line {}, column {}: {}", line, column, detail)
            }
            ValidationOutcome::Schema { unresolved } => {
                let refs: Vec<String> = unresolved.iter().map(|r| r.to_string()).collect();
                format!("Schema error: {}", refs.join("; "))
            }
        }
    }
}

/// One round of the correction loop: the candidate that entered validation,
/// what the validators said, and the repaired candidate (if a fix ran).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAttempt {
    /// 0-based; attempt 0 is the generator's original candidate.
    pub attempt_index: usize,
    pub input_sql: String,
    pub outcome: ValidationOutcome,
    /// `None` when the candidate was valid, the retry budget was exhausted,
    /// or the fix capability failed.
    pub repaired_sql: Option<String>,
}

/// Final result of a correction session: best-effort SQL plus the full
/// audit trail. On exhaustion the last candidate is returned with
/// `is_valid = false` rather than nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedSql {
    pub sql: String,
    pub is_valid: bool,
    pub attempts: Vec<CorrectionAttempt>,
}

impl VerifiedSql {
    /// Diagnostics from every failed validation round, in order.
    pub fn diagnostics(&self) -> Vec<String> {
        self.attempts
            .iter()
            .filter(|a| !a.outcome.is_valid())
            .map(|a| a.outcome.diagnostic())
            .collect()
    }

    /// Number of fix round-trips that actually ran.
    pub fn corrections_made(&self) -> usize {
        self.attempts.iter().filter(|a| a.repaired_sql.is_some()).count()
    }
}

/// Verdict from the external semantic-equivalence judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub equivalent: bool,
    /// 1..=5, where 5 is certain equivalence.
    pub score: i32,
    pub rationale: String,
}

impl JudgeVerdict {
    /// The fail-closed verdict used when judge output cannot be parsed.
    pub fn fail_closed(rationale: impl Into<String>) -> Self {
        Self {
            equivalent: false,
            score: 1,
            rationale: rationale.into(),
        }
    }
}
