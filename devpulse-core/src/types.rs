//! Core domain types for devpulse
//!
//! These types represent the raw rows handed to the metrics engine by the
//! raw data store.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Owner** | The account whose repositories and Copilot seats are being measured |
//! | **Commit row** | One (commit, touched-file-language) pair from the git log walker |
//! | **Canonical commit** | All commit rows sharing a hash, collapsed into one record |
//! | **Usage row** | One (day, IDE, model, language) slice of Copilot code completions |
//! | **Chat row** | One (day, IDE, model) slice of Copilot chat activity |
//!
//! A single physical commit usually appears as several commit rows, one per
//! language it touched. Anything that counts commits must canonicalize first
//! (see [`crate::metrics::commits`]); anything that counts lines can work on
//! the raw rows directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================
// Source control
// ============================================

/// One row per (commit, touched-file-language) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommitRecord {
    /// Commit SHA
    pub commit_hash: String,
    /// Owner the row belongs to (filled in by the importer when absent)
    #[serde(default)]
    pub owner_id: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Commit author display name
    pub author_name: String,
    /// Language of the files this row accounts for
    pub language: String,
    /// Lines added in files of this language
    pub added_lines: i64,
    /// Lines removed in files of this language
    pub removed_lines: i64,
    /// Repository the commit came from, if the ingester knew it
    #[serde(default)]
    pub repository: Option<String>,
}

impl RawCommitRecord {
    /// Lines touched by this row (added + removed).
    pub fn changed_lines(&self) -> i64 {
        self.added_lines + self.removed_lines
    }

    /// Reject rows with negative line counts.
    pub fn validate(&self) -> Result<()> {
        if self.added_lines < 0 || self.removed_lines < 0 {
            return Err(Error::InvalidRecord(format!(
                "commit {} ({}) has negative line counts: +{} -{}",
                self.commit_hash, self.language, self.added_lines, self.removed_lines
            )));
        }
        Ok(())
    }
}

// ============================================
// Copilot usage
// ============================================

/// One (day, IDE, model, language) slice of Copilot code-completion usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCopilotUsageRecord {
    #[serde(default)]
    pub owner_id: String,
    /// Day the usage was recorded for
    pub date: NaiveDate,
    pub ide: String,
    pub model: String,
    pub language: String,
    /// Distinct engaged users in this slice
    pub total_users: i64,
    pub code_acceptances: i64,
    pub code_suggestions: i64,
    pub lines_accepted: i64,
    pub lines_suggested: i64,
}

impl RawCopilotUsageRecord {
    /// Reject rows with negative counters.
    pub fn validate(&self) -> Result<()> {
        let counters = [
            self.total_users,
            self.code_acceptances,
            self.code_suggestions,
            self.lines_accepted,
            self.lines_suggested,
        ];
        if counters.iter().any(|&c| c < 0) {
            return Err(Error::InvalidRecord(format!(
                "copilot usage for {} on {} has negative counters",
                self.language, self.date
            )));
        }
        Ok(())
    }
}

/// One (day, IDE, model) slice of Copilot chat usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCopilotChatRecord {
    #[serde(default)]
    pub owner_id: String,
    pub date: NaiveDate,
    pub ide: String,
    pub model: String,
    /// Distinct chat users in this slice
    pub total_users: i64,
    pub total_chats: i64,
    #[serde(default)]
    pub copy_events: i64,
    #[serde(default)]
    pub insertion_events: i64,
}

impl RawCopilotChatRecord {
    /// Reject rows with negative counters.
    pub fn validate(&self) -> Result<()> {
        if self.total_users < 0
            || self.total_chats < 0
            || self.copy_events < 0
            || self.insertion_events < 0
        {
            return Err(Error::InvalidRecord(format!(
                "copilot chat on {} has negative counters",
                self.date
            )));
        }
        Ok(())
    }
}

// ============================================
// Date ranges
// ============================================

/// Inclusive range of whole days. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Range covering `from..=to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Range with only an optional lower and upper bound.
    pub fn bounded(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// True when neither end is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Whether the UTC calendar day of `ts` falls inside the range.
    pub fn contains_timestamp(&self, ts: DateTime<Utc>) -> bool {
        self.contains(ts.date_naive())
    }
}
