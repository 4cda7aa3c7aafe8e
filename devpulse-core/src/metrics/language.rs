//! Copilot usage broken down by language.

use serde::Serialize;

use crate::metrics::period::group_by;
use crate::metrics::ratio::{gross_sum, safe_percentage};
use crate::types::{DateRange, RawCopilotUsageRecord};

/// Completion totals for one language. Percentages are 0–100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageBreakdown {
    pub language: String,
    pub code_acceptances: i64,
    pub code_suggestions: i64,
    pub lines_accepted: i64,
    pub lines_suggested: i64,
    pub pct_code_acceptances: f64,
    pub pct_lines_accepted: f64,
}

/// Sum usage rows per language, optionally restricted to `range`.
///
/// Output is sorted by language name.
pub fn compute(rows: &[RawCopilotUsageRecord], range: Option<&DateRange>) -> Vec<LanguageBreakdown> {
    let in_range: Vec<&RawCopilotUsageRecord> = rows
        .iter()
        .filter(|r| range.map_or(true, |range| range.contains(r.date)))
        .collect();

    group_by(&in_range, |r| r.language.clone())
        .into_iter()
        .map(|(language, group)| {
            let code_acceptances = gross_sum(&group, |r| r.code_acceptances);
            let code_suggestions = gross_sum(&group, |r| r.code_suggestions);
            let lines_accepted = gross_sum(&group, |r| r.lines_accepted);
            let lines_suggested = gross_sum(&group, |r| r.lines_suggested);

            LanguageBreakdown {
                language,
                code_acceptances,
                code_suggestions,
                lines_accepted,
                lines_suggested,
                pct_code_acceptances: safe_percentage(code_acceptances, code_suggestions),
                pct_lines_accepted: safe_percentage(lines_accepted, lines_suggested),
            }
        })
        .collect()
}
