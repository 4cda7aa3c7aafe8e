//! The periodic owner report.
//!
//! | Section | Metric | Bucket | Window |
//! |---------|--------|--------|--------|
//! | `weekly_productivity` | code lines | week | last `productivity_weeks` weeks |
//! | `monthly_productivity` | code lines | month | last `productivity_months` months |
//! | `languages` | usage per language | - | last `usage_days` days |
//! | `daily_usage` | usage per bucket | day | last `usage_days` days |
//! | `users` | engaged users | day | last `usage_days` days |
//!
//! Every window ends on `as_of`, inclusive.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::db::{Database, MetricsFilter};
use crate::error::Result;
use crate::metrics::language::LanguageBreakdown;
use crate::metrics::period::Period;
use crate::metrics::productivity::{CalculatedMetrics, CodeLinesNormalization, ProductivityMetric};
use crate::metrics::queries;
use crate::metrics::usage_period::PeriodBreakdown;
use crate::metrics::users::UsersBucket;
use crate::types::DateRange;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub owner_id: String,
    pub as_of: NaiveDate,
    pub weekly_productivity: CalculatedMetrics,
    pub monthly_productivity: CalculatedMetrics,
    pub languages: Vec<LanguageBreakdown>,
    pub daily_usage: Vec<PeriodBreakdown>,
    pub users: Vec<UsersBucket>,
}

impl MetricsReport {
    /// True when no section has any data.
    pub fn is_empty(&self) -> bool {
        self.weekly_productivity.series.is_empty()
            && self.monthly_productivity.series.is_empty()
            && self.languages.is_empty()
            && self.daily_usage.is_empty()
            && self.users.is_empty()
    }
}

/// Date windows of one report, each ending on `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindows {
    pub weekly: DateRange,
    pub monthly: DateRange,
    pub usage: DateRange,
}

impl ReportWindows {
    pub fn new(as_of: NaiveDate, config: &ReportConfig) -> Self {
        let days_back = |days: u64| as_of.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);

        Self {
            weekly: DateRange::new(days_back(7 * u64::from(config.productivity_weeks)), as_of),
            monthly: DateRange::new(
                as_of
                    .checked_sub_months(Months::new(config.productivity_months))
                    .unwrap_or(NaiveDate::MIN),
                as_of,
            ),
            usage: DateRange::new(days_back(u64::from(config.usage_days)), as_of),
        }
    }
}

/// Build the report for `owner_id` as of `as_of`.
pub fn generate_report(
    db: &Database,
    owner_id: &str,
    as_of: NaiveDate,
    config: &ReportConfig,
    normalization: CodeLinesNormalization,
) -> Result<MetricsReport> {
    config.validate()?;
    let windows = ReportWindows::new(as_of, config);

    let weekly_productivity = queries::calculated_metrics(
        db,
        owner_id,
        Period::Week,
        ProductivityMetric::CodeLines,
        normalization,
        &MetricsFilter::new().with_range(windows.weekly),
    )?;
    let monthly_productivity = queries::calculated_metrics(
        db,
        owner_id,
        Period::Month,
        ProductivityMetric::CodeLines,
        normalization,
        &MetricsFilter::new().with_range(windows.monthly),
    )?;

    let usage_filter = MetricsFilter::new().with_range(windows.usage);
    let languages = queries::language_breakdown(db, owner_id, &usage_filter)?;
    let daily_usage = queries::period_breakdown(db, owner_id, Period::Day, &usage_filter)?;
    let users = queries::users_metrics(db, owner_id, &usage_filter)?;

    let report = MetricsReport {
        owner_id: owner_id.to_string(),
        as_of,
        weekly_productivity,
        monthly_productivity,
        languages,
        daily_usage,
        users,
    };

    tracing::info!(
        owner_id,
        %as_of,
        empty = report.is_empty(),
        "Generated metrics report"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testutil::date;

    #[test]
    fn test_default_windows() {
        let windows = ReportWindows::new(date("2024-05-31"), &ReportConfig::default());

        assert_eq!(windows.weekly.from, Some(date("2024-03-22")));
        assert_eq!(windows.monthly.from, Some(date("2023-11-30")));
        assert_eq!(windows.usage.from, Some(date("2024-05-24")));
        for range in [windows.weekly, windows.monthly, windows.usage] {
            assert_eq!(range.to, Some(date("2024-05-31")));
        }
    }

    #[test]
    fn test_month_window_clamps_to_month_end() {
        let config = ReportConfig {
            productivity_months: 1,
            ..ReportConfig::default()
        };
        let windows = ReportWindows::new(date("2024-03-31"), &config);
        assert_eq!(windows.monthly.from, Some(date("2024-02-29")));
    }

    #[test]
    fn test_empty_store_gives_empty_report() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        let report = generate_report(
            &db,
            "nobody",
            date("2024-05-31"),
            &ReportConfig::default(),
            CodeLinesNormalization::GrandTotal,
        )
        .unwrap();
        assert!(report.is_empty());
        assert_eq!(report.weekly_productivity.period, Period::Week);
        assert_eq!(report.monthly_productivity.period, Period::Month);
    }
}
