//! Productivity series: code lines and commit counts per period bucket.
//!
//! Each [`ProductivityMetric`] variant dispatches to one
//! [`ProductivityStrategy`]. Strategies take the raw commit rows and the raw
//! Copilot usage rows of a query window and return a chronological series.
//!
//! ## Code lines
//!
//! Raw commit rows are bucketed as-is: a commit touching two languages
//! contributes both rows. AI-attributed lines are the usage bucket's
//! `lines_accepted` divided by a denominator chosen by
//! [`CodeLinesNormalization`]:
//!
//! | Normalization | Denominator |
//! |---------------|-------------|
//! | `GrandTotal` | added lines across the whole window (computed once up front) |
//! | `PerBucket` | added lines inside the bucket |
//!
//! `GrandTotal` is the default and matches the figures earlier reports
//! published. It is not bucket-local, so percentages of different buckets do
//! not add up the way readers may expect.
//!
//! ## Commit counts
//!
//! Rows are canonicalized first so each commit counts once. The AI figure is
//! the bucket-local acceptance rate of Copilot suggestions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::metrics::commits::{self, CanonicalCommit};
use crate::metrics::period::{bucket_records, Bucket, Period};
use crate::metrics::ratio::{gross_sum, safe_ratio};
use crate::types::{RawCommitRecord, RawCopilotUsageRecord};

// ============================================
// Metric selection
// ============================================

/// Which productivity series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductivityMetric {
    #[serde(rename = "code-lines")]
    CodeLines,
    #[serde(rename = "commits")]
    CommitCount,
}

impl ProductivityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductivityMetric::CodeLines => "code-lines",
            ProductivityMetric::CommitCount => "commits",
        }
    }

    /// Strategy implementing this metric.
    pub fn strategy(
        &self,
        normalization: CodeLinesNormalization,
    ) -> Box<dyn ProductivityStrategy> {
        match self {
            ProductivityMetric::CodeLines => Box::new(CodeLinesStrategy { normalization }),
            ProductivityMetric::CommitCount => Box::new(CommitCountStrategy),
        }
    }
}

impl std::fmt::Display for ProductivityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductivityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "code-lines" | "lines" => Ok(ProductivityMetric::CodeLines),
            "commits" | "commit-count" => Ok(ProductivityMetric::CommitCount),
            _ => Err(Error::InvalidMetric(s.to_string())),
        }
    }
}

/// Denominator used for the code-lines AI percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeLinesNormalization {
    /// Added lines across every bucket of the query window
    #[default]
    GrandTotal,
    /// Added lines inside the bucket being computed
    PerBucket,
}

// ============================================
// Output
// ============================================

/// One bucket of the code-lines series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeLineMetricsBucket {
    pub bucket_start: NaiveDate,
    pub bucket_end: NaiveDate,
    /// Added + removed lines of every commit row in the bucket
    pub net_changed_lines: i64,
    pub net_changed_lines_by_copilot: i64,
    /// Fraction in `[0, 1]` for well-formed input
    pub percentage_changed_lines_by_copilot: f64,
    pub distinct_author_count: i64,
}

/// One bucket of the commit-count series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitCountBucket {
    pub bucket_start: NaiveDate,
    pub bucket_end: NaiveDate,
    pub total_commits: i64,
    pub percentage_ai_suggestions_accepted: f64,
    pub distinct_author_count: i64,
}

/// A computed series, tagged by metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metric", content = "buckets")]
pub enum ProductivitySeries {
    #[serde(rename = "code-lines")]
    CodeLines(Vec<CodeLineMetricsBucket>),
    #[serde(rename = "commits")]
    CommitCount(Vec<CommitCountBucket>),
}

impl ProductivitySeries {
    /// Empty series of the given metric.
    pub fn empty(metric: ProductivityMetric) -> Self {
        match metric {
            ProductivityMetric::CodeLines => ProductivitySeries::CodeLines(Vec::new()),
            ProductivityMetric::CommitCount => ProductivitySeries::CommitCount(Vec::new()),
        }
    }

    pub fn metric(&self) -> ProductivityMetric {
        match self {
            ProductivitySeries::CodeLines(_) => ProductivityMetric::CodeLines,
            ProductivitySeries::CommitCount(_) => ProductivityMetric::CommitCount,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProductivitySeries::CodeLines(b) => b.len(),
            ProductivitySeries::CommitCount(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A productivity series plus the context it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatedMetrics {
    pub owner_id: String,
    /// Languages seen in the commit rows, sorted
    pub languages: Vec<String>,
    pub period: Period,
    pub metric: ProductivityMetric,
    pub series: ProductivitySeries,
}

impl CalculatedMetrics {
    /// Result for a window with no commit activity.
    pub fn empty(owner_id: &str, period: Period, metric: ProductivityMetric) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            languages: Vec::new(),
            period,
            metric,
            series: ProductivitySeries::empty(metric),
        }
    }
}

// ============================================
// Strategies
// ============================================

/// Computes one productivity series from the rows of a query window.
pub trait ProductivityStrategy {
    fn compute(
        &self,
        commits: &[RawCommitRecord],
        usage: &[RawCopilotUsageRecord],
        period: Period,
    ) -> ProductivitySeries;
}

/// Lines changed per bucket and the share attributed to Copilot.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeLinesStrategy {
    pub normalization: CodeLinesNormalization,
}

impl ProductivityStrategy for CodeLinesStrategy {
    fn compute(
        &self,
        commits: &[RawCommitRecord],
        usage: &[RawCopilotUsageRecord],
        period: Period,
    ) -> ProductivitySeries {
        let grand_total_added = gross_sum(commits, |c| c.added_lines);
        let usage_buckets = bucket_records(usage, period, |u| u.date);
        let commit_buckets = bucket_records(commits, period, |c| c.timestamp.date_naive());

        let buckets = commit_buckets
            .into_iter()
            .map(|(bucket, rows)| {
                let net_changed_lines = gross_sum(&rows, |c| c.changed_lines());
                let distinct_author_count =
                    distinct_count(rows.iter().map(|c| c.author_name.as_str()));

                let (percentage, by_copilot) = match usage_buckets.get(&bucket) {
                    Some(usage_rows) => {
                        let ai_lines = gross_sum(usage_rows, |u| u.lines_accepted);
                        let denominator = match self.normalization {
                            CodeLinesNormalization::GrandTotal => grand_total_added,
                            CodeLinesNormalization::PerBucket => {
                                gross_sum(&rows, |c| c.added_lines)
                            }
                        };
                        let percentage = safe_ratio(ai_lines, denominator);
                        let by_copilot = (percentage * net_changed_lines as f64).round() as i64;
                        (percentage, by_copilot)
                    }
                    None => (0.0, 0),
                };

                CodeLineMetricsBucket {
                    bucket_start: bucket.start,
                    bucket_end: bucket.end,
                    net_changed_lines,
                    net_changed_lines_by_copilot: by_copilot,
                    percentage_changed_lines_by_copilot: percentage,
                    distinct_author_count,
                }
            })
            .collect();

        ProductivitySeries::CodeLines(buckets)
    }
}

/// Canonical commits per bucket and the bucket's suggestion acceptance rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitCountStrategy;

impl ProductivityStrategy for CommitCountStrategy {
    fn compute(
        &self,
        commits: &[RawCommitRecord],
        usage: &[RawCopilotUsageRecord],
        period: Period,
    ) -> ProductivitySeries {
        let canonical = commits::aggregate(commits);
        let usage_buckets = bucket_records(usage, period, |u| u.date);
        let commit_buckets: BTreeMap<Bucket, Vec<&CanonicalCommit>> =
            bucket_records(&canonical, period, |c| c.timestamp.date_naive());

        let buckets = commit_buckets
            .into_iter()
            .map(|(bucket, rows)| {
                let acceptance = usage_buckets.get(&bucket).map_or(0.0, |usage_rows| {
                    safe_ratio(
                        gross_sum(usage_rows, |u| u.code_acceptances),
                        gross_sum(usage_rows, |u| u.code_suggestions),
                    )
                });

                CommitCountBucket {
                    bucket_start: bucket.start,
                    bucket_end: bucket.end,
                    total_commits: rows.len() as i64,
                    percentage_ai_suggestions_accepted: acceptance,
                    distinct_author_count: distinct_count(
                        rows.iter().map(|c| c.author_name.as_str()),
                    ),
                }
            })
            .collect();

        ProductivitySeries::CommitCount(buckets)
    }
}

fn distinct_count<'a>(names: impl Iterator<Item = &'a str>) -> i64 {
    names.collect::<BTreeSet<_>>().len() as i64
}

// ============================================
// Entry points
// ============================================

/// Compute a productivity series. An empty commit window yields an empty series.
pub fn compute(
    commits: &[RawCommitRecord],
    usage: &[RawCopilotUsageRecord],
    period: Period,
    metric: ProductivityMetric,
    normalization: CodeLinesNormalization,
) -> ProductivitySeries {
    if commits.is_empty() {
        return ProductivitySeries::empty(metric);
    }

    let series = metric.strategy(normalization).compute(commits, usage, period);

    tracing::debug!(
        metric = %metric,
        period = %period,
        commit_rows = commits.len(),
        usage_rows = usage.len(),
        buckets = series.len(),
        "Computed productivity series"
    );

    series
}

/// [`compute`] wrapped with the owner and the languages seen in the window.
pub fn calculate_metrics(
    owner_id: &str,
    commits: &[RawCommitRecord],
    usage: &[RawCopilotUsageRecord],
    period: Period,
    metric: ProductivityMetric,
    normalization: CodeLinesNormalization,
) -> CalculatedMetrics {
    let languages: BTreeSet<&str> = commits.iter().map(|c| c.language.as_str()).collect();

    CalculatedMetrics {
        owner_id: owner_id.to_string(),
        languages: languages.into_iter().map(str::to_string).collect(),
        period,
        metric,
        series: compute(commits, usage, period, metric, normalization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testutil::{commit, date, usage};

    fn window_commits() -> Vec<RawCommitRecord> {
        vec![
            // week of 2024-04-29
            commit("A1", "2024-05-01T10:00:00Z", "ana", "Python", 10, 2),
            commit("A1", "2024-05-01T10:00:00Z", "ana", "Go", 5, 1),
            commit("B2", "2024-05-02T09:00:00Z", "bo", "Python", 20, 0),
            // week of 2024-05-06
            commit("C3", "2024-05-08T16:00:00Z", "ana", "Rust", 15, 5),
        ]
    }

    fn window_usage() -> Vec<RawCopilotUsageRecord> {
        vec![
            usage("2024-05-01", "Python", 10, 20, 10, 30),
            usage("2024-05-03", "Go", 5, 30, 15, 20),
            // no commits that week
            usage("2024-05-20", "Rust", 50, 60, 99, 120),
        ]
    }

    fn code_lines(series: ProductivitySeries) -> Vec<CodeLineMetricsBucket> {
        match series {
            ProductivitySeries::CodeLines(b) => b,
            other => panic!("expected code-lines series, got {other:?}"),
        }
    }

    #[test]
    fn test_code_lines_grand_total_normalization() {
        let series = compute(
            &window_commits(),
            &window_usage(),
            Period::Week,
            ProductivityMetric::CodeLines,
            CodeLinesNormalization::GrandTotal,
        );
        let buckets = code_lines(series);
        assert_eq!(buckets.len(), 2);

        let first = &buckets[0];
        assert_eq!(first.bucket_start, date("2024-04-29"));
        assert_eq!(first.bucket_end, date("2024-05-06"));
        assert_eq!(first.net_changed_lines, 38);
        assert_eq!(first.distinct_author_count, 2);
        // 25 accepted lines over 50 added lines in the whole window
        assert_eq!(first.percentage_changed_lines_by_copilot, 0.5);
        assert_eq!(first.net_changed_lines_by_copilot, 19);

        let second = &buckets[1];
        assert_eq!(second.bucket_start, date("2024-05-06"));
        assert_eq!(second.net_changed_lines, 20);
        assert_eq!(second.distinct_author_count, 1);
        assert_eq!(second.percentage_changed_lines_by_copilot, 0.0);
        assert_eq!(second.net_changed_lines_by_copilot, 0);
    }

    #[test]
    fn test_code_lines_per_bucket_normalization() {
        let buckets = code_lines(compute(
            &window_commits(),
            &window_usage(),
            Period::Week,
            ProductivityMetric::CodeLines,
            CodeLinesNormalization::PerBucket,
        ));

        // 25 accepted lines over 35 added lines in the first week
        let first = &buckets[0];
        assert!((first.percentage_changed_lines_by_copilot - 25.0 / 35.0).abs() < 1e-12);
        assert_eq!(first.net_changed_lines_by_copilot, 27);
    }

    #[test]
    fn test_commit_count_canonicalizes() {
        let series = compute(
            &window_commits(),
            &window_usage(),
            Period::Week,
            ProductivityMetric::CommitCount,
            CodeLinesNormalization::default(),
        );
        let ProductivitySeries::CommitCount(buckets) = series else {
            panic!("expected commit-count series");
        };

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].total_commits, 2);
        assert_eq!(buckets[0].distinct_author_count, 2);
        assert!((buckets[0].percentage_ai_suggestions_accepted - 0.3).abs() < 1e-12);

        assert_eq!(buckets[1].total_commits, 1);
        assert_eq!(buckets[1].percentage_ai_suggestions_accepted, 0.0);
    }

    #[test]
    fn test_empty_commits_give_empty_series() {
        for metric in [ProductivityMetric::CodeLines, ProductivityMetric::CommitCount] {
            let series = compute(
                &[],
                &window_usage(),
                Period::Month,
                metric,
                CodeLinesNormalization::GrandTotal,
            );
            assert!(series.is_empty());
            assert_eq!(series.metric(), metric);
        }
    }

    #[test]
    fn test_calculate_metrics_collects_languages() {
        let metrics = calculate_metrics(
            "owner-1",
            &window_commits(),
            &[],
            Period::Month,
            ProductivityMetric::CodeLines,
            CodeLinesNormalization::GrandTotal,
        );
        assert_eq!(metrics.languages, vec!["Go", "Python", "Rust"]);
        assert_eq!(metrics.series.len(), 1);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(
            "code_lines".parse::<ProductivityMetric>().unwrap(),
            ProductivityMetric::CodeLines
        );
        assert_eq!(
            "COMMITS".parse::<ProductivityMetric>().unwrap(),
            ProductivityMetric::CommitCount
        );
        assert!(matches!(
            "velocity".parse::<ProductivityMetric>(),
            Err(Error::InvalidMetric(_))
        ));
    }

    #[test]
    fn test_series_serializes_with_metric_tag() {
        let series = ProductivitySeries::CommitCount(vec![]);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["metric"], "commits");
        assert!(json["buckets"].as_array().unwrap().is_empty());
    }
}
