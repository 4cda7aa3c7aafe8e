//! Per-owner metric queries over the raw store.
//!
//! Each function fetches the rows for one owner with a [`MetricsFilter`] and
//! hands them to one of the pure aggregators. Nothing is cached or written
//! back.

use crate::db::{Database, MetricsFilter};
use crate::error::Result;
use crate::metrics::language::{self, LanguageBreakdown};
use crate::metrics::period::Period;
use crate::metrics::productivity::{
    self, CalculatedMetrics, CodeLinesNormalization, ProductivityMetric,
};
use crate::metrics::ratio::{self, GroupedRatio, GroupedTotal};
use crate::metrics::usage_period::{self, PeriodBreakdown};
use crate::metrics::users::{self, UsersBucket};

/// Productivity series for one owner.
///
/// Returns an empty result without touching the usage table when the owner
/// has no commits in the window.
pub fn calculated_metrics(
    db: &Database,
    owner_id: &str,
    period: Period,
    metric: ProductivityMetric,
    normalization: CodeLinesNormalization,
    filter: &MetricsFilter,
) -> Result<CalculatedMetrics> {
    let commits = db.list_commits(owner_id, filter)?;
    if commits.is_empty() {
        tracing::info!(owner_id, %period, %metric, "No commits in window");
        return Ok(CalculatedMetrics::empty(owner_id, period, metric));
    }

    let usage = db.list_copilot_usage(owner_id, filter)?;
    let metrics =
        productivity::calculate_metrics(owner_id, &commits, &usage, period, metric, normalization);

    tracing::info!(
        owner_id,
        %period,
        %metric,
        buckets = metrics.series.len(),
        "Calculated productivity metrics"
    );
    Ok(metrics)
}

/// Copilot usage per language for one owner.
pub fn language_breakdown(
    db: &Database,
    owner_id: &str,
    filter: &MetricsFilter,
) -> Result<Vec<LanguageBreakdown>> {
    let usage = db.list_copilot_usage(owner_id, filter)?;
    Ok(language::compute(&usage, filter.range.as_ref()))
}

/// Copilot usage per period bucket for one owner.
pub fn period_breakdown(
    db: &Database,
    owner_id: &str,
    period: Period,
    filter: &MetricsFilter,
) -> Result<Vec<PeriodBreakdown>> {
    let usage = db.list_copilot_usage(owner_id, filter)?;
    Ok(usage_period::compute(&usage, period, filter.range.as_ref()))
}

/// Daily code-completion and chat users for one owner.
///
/// The language filter applies to code-completion rows only; chat rows carry
/// no language.
pub fn users_metrics(
    db: &Database,
    owner_id: &str,
    filter: &MetricsFilter,
) -> Result<Vec<UsersBucket>> {
    let code = db.list_copilot_usage(owner_id, filter)?;
    let chat = db.list_copilot_chat(owner_id, filter.range.as_ref())?;
    Ok(users::compute(&code, &chat))
}

/// Lines touched per group of commit dimensions.
pub fn productivity_grouped_by(
    db: &Database,
    owner_id: &str,
    dimensions: &[&str],
    filter: &MetricsFilter,
) -> Result<Vec<GroupedTotal>> {
    let commits = db.list_commits(owner_id, filter)?;
    ratio::gross_productivity_grouped_by(&commits, dimensions)
}

/// Accepted/suggested lines per group of usage dimensions.
pub fn ai_lines_grouped_by(
    db: &Database,
    owner_id: &str,
    dimensions: &[&str],
    filter: &MetricsFilter,
) -> Result<Vec<GroupedRatio>> {
    let usage = db.list_copilot_usage(owner_id, filter)?;
    ratio::relative_ai_lines_grouped_by(&usage, dimensions)
}
