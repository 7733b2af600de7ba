//! Corpus record splitting.
//!
//! The record boundary is an explicit deployment choice, never inferred from
//! the corpus contents: a fact file may hold one fact per line, or multi-line
//! records (a question/answer pair, say) separated by blank lines.

use serde::{Deserialize, Serialize};

/// How the raw corpus text is split into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// One record per non-empty line.
    Line,

    /// Multi-line records separated by one or more blank lines.
    BlankLine,
}

/// Split a corpus into ordered records under the given policy.
///
/// Records are trimmed; empty records are dropped. Order follows the corpus.
pub fn split_records(corpus: &str, policy: SplitPolicy) -> Vec<String> {
    match policy {
        SplitPolicy::Line => corpus
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        SplitPolicy::BlankLine => {
            let mut records = Vec::new();
            let mut current: Vec<&str> = Vec::new();
            for line in corpus.lines() {
                if line.trim().is_empty() {
                    flush_record(&mut current, &mut records);
                } else {
                    current.push(line.trim_end());
                }
            }
            flush_record(&mut current, &mut records);
            records
        }
    }
}

fn flush_record(current: &mut Vec<&str>, records: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let record = current.join("\n").trim().to_string();
    if !record.is_empty() {
        records.push(record);
    }
    current.clear();
}
