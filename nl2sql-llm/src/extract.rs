//! Extraction of structured content from untrusted model output
//!
//! Generators wrap SQL in markdown fences or lead with prose despite being
//! told not to; judges return JSON with varying decoration. Both are
//! normalized here, fail-closed where it matters.

use nl2sql_core::JudgeVerdict;
use serde::Deserialize;

/// Pull the SQL statement out of raw model output: strips markdown code
/// fences and any leading prose before the first SELECT/WITH keyword.
pub fn extract_sql(raw: &str) -> String {
    let text = strip_fences(raw);

    // Drop leading prose: the statement starts at the first SELECT or WITH.
    let lower = text.to_lowercase();
    let start = ["select", "with"]
        .iter()
        .filter_map(|kw| find_word(&lower, kw))
        .min();

    match start {
        Some(pos) => text[pos..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Parse a judge verdict from raw model output. Any output that does not
/// contain a well-formed verdict object is a non-match (fail-closed).
pub fn parse_judge_verdict(raw: &str) -> JudgeVerdict {
    #[derive(Deserialize)]
    struct RawVerdict {
        equivalent: bool,
        #[serde(default)]
        score: Option<i32>,
        #[serde(default, alias = "rationale")]
        reasoning: Option<String>,
    }

    let text = strip_fences(raw);

    // The object may be embedded in prose; take the outermost braces.
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(open), Some(close)) if open < close => &text[open..=close],
        _ => return JudgeVerdict::fail_closed(format!("unparseable judge output: {}", raw.trim())),
    };

    match serde_json::from_str::<RawVerdict>(json) {
        Ok(verdict) => JudgeVerdict {
            equivalent: verdict.equivalent,
            score: verdict.score.unwrap_or(if verdict.equivalent { 5 } else { 1 }).clamp(1, 5),
            rationale: verdict.reasoning.unwrap_or_default(),
        },
        Err(err) => JudgeVerdict::fail_closed(format!("malformed judge verdict: {}", err)),
    }
}

/// Remove markdown code fences, keeping the first fenced block's content
/// when one exists.
fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }

    let mut inside = false;
    let mut block = Vec::new();
    for line in trimmed.lines() {
        if line.trim_start().starts_with("```") {
            if inside {
                break;
            }
            inside = true;
            continue;
        }
        if inside {
            block.push(line);
        }
    }

    if block.is_empty() {
        trimmed.replace("```", "").trim().to_string()
    } else {
        block.join("\n").trim().to_string()
    }
}

/// Find `word` in `haystack` at a word boundary.
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(word) {
        let pos = from + offset;
        let before_ok = pos == 0
            || !haystack[..pos]
                .chars()
                .next_back()
                .map(|c| c.is_ascii_alphanumeric() || c == '_')
                .unwrap_or(false);
        let after = pos + word.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..]
                .chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '_')
                .unwrap_or(false);
        if before_ok && after_ok {
            return Some(pos);
        }
        from = pos + word.len();
    }
    None
}
