//! Gross sums and zero-guarded ratios.
//!
//! Everything here is a pure function over slices. The grouped variants
//! accept their group-by dimensions by name so they can be driven straight
//! from CLI or config input; unknown names fail with
//! [`Error::InvalidGroupingKey`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{RawCommitRecord, RawCopilotUsageRecord};

/// Sum of `selector(r)` over `records`; 0 for empty input.
pub fn gross_sum<T, F>(records: &[T], selector: F) -> i64
where
    F: Fn(&T) -> i64,
{
    records.iter().map(selector).sum()
}

/// `numerator / denominator`, or 0.0 when the denominator is not positive.
pub fn safe_ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

/// Same as [`safe_ratio`], scaled to a percentage.
pub fn safe_percentage(numerator: i64, denominator: i64) -> f64 {
    100.0 * safe_ratio(numerator, denominator)
}

// ============================================
// Named calculator operations
// ============================================

/// Lines touched (added + removed) across all commit rows.
pub fn gross_productivity(commits: &[RawCommitRecord]) -> i64 {
    gross_sum(commits, RawCommitRecord::changed_lines)
}

/// Accepted completions across all usage rows.
pub fn gross_ai_acceptances(usage: &[RawCopilotUsageRecord]) -> i64 {
    gross_sum(usage, |u| u.code_acceptances)
}

/// Accepted / suggested completions.
pub fn relative_ai_acceptances(usage: &[RawCopilotUsageRecord]) -> f64 {
    safe_ratio(
        gross_ai_acceptances(usage),
        gross_sum(usage, |u| u.code_suggestions),
    )
}

/// Accepted lines across all usage rows.
pub fn gross_ai_lines(usage: &[RawCopilotUsageRecord]) -> i64 {
    gross_sum(usage, |u| u.lines_accepted)
}

/// Accepted / suggested lines.
pub fn relative_ai_lines(usage: &[RawCopilotUsageRecord]) -> f64 {
    safe_ratio(gross_ai_lines(usage), gross_sum(usage, |u| u.lines_suggested))
}

// ============================================
// Grouped operations
// ============================================

/// Dimensions commit rows can be grouped by.
pub const COMMIT_DIMENSIONS: &[&str] = &["author", "language", "repository"];

/// Dimensions usage rows can be grouped by.
pub const USAGE_DIMENSIONS: &[&str] = &["ide", "language", "model"];

/// A summed value for one group. `key` lines up with the requested dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTotal {
    pub key: Vec<String>,
    pub value: i64,
}

/// Accepted/suggested totals and their ratio for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRatio {
    pub key: Vec<String>,
    pub accepted: i64,
    pub suggested: i64,
    pub ratio: f64,
}

fn validate_dimensions(dimensions: &[&str], allowed: &'static [&'static str]) -> Result<()> {
    if dimensions.is_empty() || dimensions.iter().any(|d| !allowed.contains(d)) {
        return Err(Error::InvalidGroupingKey {
            requested: dimensions.iter().map(|d| d.to_string()).collect(),
            allowed,
        });
    }
    Ok(())
}

fn commit_dimension(row: &RawCommitRecord, dimension: &str) -> String {
    match dimension {
        "author" => row.author_name.clone(),
        "language" => row.language.clone(),
        _ => row.repository.clone().unwrap_or_default(),
    }
}

fn usage_dimension(row: &RawCopilotUsageRecord, dimension: &str) -> String {
    match dimension {
        "ide" => row.ide.clone(),
        "language" => row.language.clone(),
        _ => row.model.clone(),
    }
}

/// Lines touched, grouped by any of [`COMMIT_DIMENSIONS`].
pub fn gross_productivity_grouped_by(
    commits: &[RawCommitRecord],
    dimensions: &[&str],
) -> Result<Vec<GroupedTotal>> {
    validate_dimensions(dimensions, COMMIT_DIMENSIONS)?;

    let mut totals: BTreeMap<Vec<String>, i64> = BTreeMap::new();
    for row in commits {
        let key = dimensions.iter().map(|d| commit_dimension(row, d)).collect();
        *totals.entry(key).or_insert(0) += row.changed_lines();
    }

    Ok(totals
        .into_iter()
        .map(|(key, value)| GroupedTotal { key, value })
        .collect())
}

/// Accepted lines, grouped by any of [`USAGE_DIMENSIONS`].
pub fn gross_ai_lines_grouped_by(
    usage: &[RawCopilotUsageRecord],
    dimensions: &[&str],
) -> Result<Vec<GroupedTotal>> {
    validate_dimensions(dimensions, USAGE_DIMENSIONS)?;

    let mut totals: BTreeMap<Vec<String>, i64> = BTreeMap::new();
    for row in usage {
        let key = dimensions.iter().map(|d| usage_dimension(row, d)).collect();
        *totals.entry(key).or_insert(0) += row.lines_accepted;
    }

    Ok(totals
        .into_iter()
        .map(|(key, value)| GroupedTotal { key, value })
        .collect())
}

/// Accepted / suggested lines, grouped by any of [`USAGE_DIMENSIONS`].
pub fn relative_ai_lines_grouped_by(
    usage: &[RawCopilotUsageRecord],
    dimensions: &[&str],
) -> Result<Vec<GroupedRatio>> {
    validate_dimensions(dimensions, USAGE_DIMENSIONS)?;

    let mut totals: BTreeMap<Vec<String>, (i64, i64)> = BTreeMap::new();
    for row in usage {
        let key = dimensions.iter().map(|d| usage_dimension(row, d)).collect();
        let entry = totals.entry(key).or_insert((0, 0));
        entry.0 += row.lines_accepted;
        entry.1 += row.lines_suggested;
    }

    Ok(totals
        .into_iter()
        .map(|(key, (accepted, suggested))| GroupedRatio {
            key,
            accepted,
            suggested,
            ratio: safe_ratio(accepted, suggested),
        })
        .collect())
}
