//! Engaged users per day, code completion and chat side by side.
//!
//! The two sides are summed independently and then full-outer-joined on
//! date, so a day with only chat activity still shows up with zero code
//! users (and vice versa).

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{DateRange, RawCopilotChatRecord, RawCopilotUsageRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsersBucket {
    pub date: NaiveDate,
    pub total_code_assistant_users: i64,
    pub total_chat_users: i64,
}

fn users_per_day<T>(
    rows: &[T],
    date_fn: impl Fn(&T) -> NaiveDate,
    users_fn: impl Fn(&T) -> i64,
) -> BTreeMap<NaiveDate, i64> {
    let mut per_day = BTreeMap::new();
    for row in rows {
        *per_day.entry(date_fn(row)).or_insert(0) += users_fn(row);
    }
    per_day
}

/// Full outer join of two per-day user maps, ascending by date.
pub fn merge(
    code: &BTreeMap<NaiveDate, i64>,
    chat: &BTreeMap<NaiveDate, i64>,
) -> Vec<UsersBucket> {
    let dates: BTreeSet<&NaiveDate> = code.keys().chain(chat.keys()).collect();

    dates
        .into_iter()
        .map(|date| UsersBucket {
            date: *date,
            total_code_assistant_users: code.get(date).copied().unwrap_or(0),
            total_chat_users: chat.get(date).copied().unwrap_or(0),
        })
        .collect()
}

/// Per-day engaged users across code completion and chat rows.
pub fn compute(code: &[RawCopilotUsageRecord], chat: &[RawCopilotChatRecord]) -> Vec<UsersBucket> {
    merge(
        &users_per_day(code, |r| r.date, |r| r.total_users),
        &users_per_day(chat, |r| r.date, |r| r.total_users),
    )
}

/// [`compute`] restricted to the days inside `range`.
pub fn compute_in_range(
    code: &[RawCopilotUsageRecord],
    chat: &[RawCopilotChatRecord],
    range: &DateRange,
) -> Vec<UsersBucket> {
    let code: Vec<RawCopilotUsageRecord> = code
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect();
    let chat: Vec<RawCopilotChatRecord> = chat
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect();
    compute(&code, &chat)
}
