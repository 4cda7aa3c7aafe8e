//! Commit canonicalization.
//!
//! The git walker emits one row per (commit, language) pair. Counting commits
//! requires collapsing those rows back into one record per hash.
//!
//! ## Example
//!
//! Rows for hash `A1`:
//! - `Python` +10 -2
//! - `Go` +5 -1
//! - `Python` +3 -0
//!
//! Result: one commit with `languages = {Go, Python}`, +18 -3.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::RawCommitRecord;

/// One physical commit, built fresh on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalCommit {
    pub commit_hash: String,
    pub owner_id: String,
    /// Latest timestamp seen across the contributing rows
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    pub languages: BTreeSet<String>,
    pub total_added_lines: i64,
    pub total_removed_lines: i64,
}

impl CanonicalCommit {
    fn from_row(row: &RawCommitRecord) -> Self {
        Self {
            commit_hash: row.commit_hash.clone(),
            owner_id: row.owner_id.clone(),
            timestamp: row.timestamp,
            author_name: row.author_name.clone(),
            languages: BTreeSet::from([row.language.clone()]),
            total_added_lines: row.added_lines,
            total_removed_lines: row.removed_lines,
        }
    }

    fn absorb(&mut self, row: &RawCommitRecord) {
        // Rows of one commit normally share a timestamp; re-ingestion with a
        // skewed clock is tolerated by keeping the latest.
        if row.timestamp > self.timestamp {
            self.timestamp = row.timestamp;
            self.author_name = row.author_name.clone();
        }
        self.languages.insert(row.language.clone());
        self.total_added_lines += row.added_lines;
        self.total_removed_lines += row.removed_lines;
    }

    pub fn changed_lines(&self) -> i64 {
        self.total_added_lines + self.total_removed_lines
    }
}

/// Collapse raw rows sharing a commit hash into canonical commits.
///
/// Output is ordered by (timestamp, hash).
pub fn aggregate(rows: &[RawCommitRecord]) -> Vec<CanonicalCommit> {
    let mut by_hash: HashMap<&str, CanonicalCommit> = HashMap::with_capacity(rows.len());

    for row in rows {
        by_hash
            .entry(row.commit_hash.as_str())
            .and_modify(|c| c.absorb(row))
            .or_insert_with(|| CanonicalCommit::from_row(row));
    }

    let mut commits: Vec<CanonicalCommit> = by_hash.into_values().collect();
    commits.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.commit_hash.cmp(&b.commit_hash))
    });

    tracing::debug!(
        rows = rows.len(),
        commits = commits.len(),
        "Canonicalized commit rows"
    );

    commits
}

/// Re-emit canonical commits as raw rows, one per commit.
///
/// All lines are attributed to the first language of each commit. Feeding the
/// result back through [`aggregate`] yields the same commits apart from the
/// language sets, which collapse to that first language.
pub fn flatten(commits: &[CanonicalCommit]) -> Vec<RawCommitRecord> {
    commits
        .iter()
        .map(|c| RawCommitRecord {
            commit_hash: c.commit_hash.clone(),
            owner_id: c.owner_id.clone(),
            timestamp: c.timestamp,
            author_name: c.author_name.clone(),
            language: c.languages.iter().next().cloned().unwrap_or_default(),
            added_lines: c.total_added_lines,
            removed_lines: c.total_removed_lines,
            repository: None,
        })
        .collect()
}
