//! Copilot usage per period bucket.
//!
//! Unlike the code-lines productivity series, every ratio here is normalized
//! inside its own bucket. Ratios are fractions, not percentages.

use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::period::{bucket_records, Period};
use crate::metrics::ratio::{gross_sum, safe_ratio};
use crate::types::{DateRange, RawCopilotUsageRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBreakdown {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_code_acceptances: i64,
    pub pct_code_acceptances: f64,
    pub total_lines_accepted: i64,
    pub pct_lines_accepted: f64,
}

/// Bucket usage rows by `period`, ascending by bucket start.
pub fn compute(
    rows: &[RawCopilotUsageRecord],
    period: Period,
    range: Option<&DateRange>,
) -> Vec<PeriodBreakdown> {
    let in_range: Vec<&RawCopilotUsageRecord> = rows
        .iter()
        .filter(|r| range.map_or(true, |range| range.contains(r.date)))
        .collect();

    bucket_records(&in_range, period, |r| r.date)
        .into_iter()
        .map(|(bucket, group)| {
            let total_code_acceptances = gross_sum(&group, |r| r.code_acceptances);
            let total_lines_accepted = gross_sum(&group, |r| r.lines_accepted);

            PeriodBreakdown {
                period_start: bucket.start,
                period_end: bucket.end,
                total_code_acceptances,
                pct_code_acceptances: safe_ratio(
                    total_code_acceptances,
                    gross_sum(&group, |r| r.code_suggestions),
                ),
                total_lines_accepted,
                pct_lines_accepted: safe_ratio(
                    total_lines_accepted,
                    gross_sum(&group, |r| r.lines_suggested),
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testutil::{date, usage};

    #[test]
    fn test_daily_buckets_ascending() {
        let rows = vec![
            usage("2024-05-02", "Go", 3, 6, 4, 16),
            usage("2024-05-01", "Python", 10, 20, 5, 10),
            usage("2024-05-01", "Rust", 0, 20, 5, 10),
        ];
        let breakdown = compute(&rows, Period::Day, None);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].period_start, date("2024-05-01"));
        assert_eq!(breakdown[0].period_end, date("2024-05-02"));
        assert_eq!(breakdown[0].total_code_acceptances, 10);
        assert_eq!(breakdown[0].pct_code_acceptances, 0.25);
        assert_eq!(breakdown[0].total_lines_accepted, 10);
        assert_eq!(breakdown[0].pct_lines_accepted, 0.5);

        assert_eq!(breakdown[1].period_start, date("2024-05-02"));
        assert_eq!(breakdown[1].pct_lines_accepted, 0.25);
    }

    #[test]
    fn test_monthly_with_range() {
        let rows = vec![
            usage("2024-04-30", "Go", 100, 100, 100, 100),
            usage("2024-05-01", "Go", 1, 4, 1, 4),
            usage("2024-05-31", "Go", 1, 0, 0, 0),
        ];
        let range = DateRange::bounded(Some(date("2024-05-01")), None);
        let breakdown = compute(&rows, Period::Month, Some(&range));

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].period_end, date("2024-06-01"));
        assert_eq!(breakdown[0].total_code_acceptances, 2);
        assert_eq!(breakdown[0].pct_code_acceptances, 0.5);
    }

    #[test]
    fn test_zero_suggestions_is_zero_ratio() {
        let rows = vec![usage("2024-05-01", "Go", 0, 0, 0, 0)];
        let breakdown = compute(&rows, Period::Week, None);
        assert_eq!(breakdown[0].pct_code_acceptances, 0.0);
        assert_eq!(breakdown[0].pct_lines_accepted, 0.0);
    }
}
