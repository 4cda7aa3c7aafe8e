//! Row builders shared by the metrics unit tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{RawCommitRecord, RawCopilotChatRecord, RawCopilotUsageRecord};

pub const OWNER: &str = "owner-1";

pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

pub fn date(ymd: &str) -> NaiveDate {
    NaiveDate::parse_from_str(ymd, "%Y-%m-%d").expect("valid YYYY-MM-DD date")
}

pub fn commit(
    hash: &str,
    timestamp: &str,
    author: &str,
    language: &str,
    added: i64,
    removed: i64,
) -> RawCommitRecord {
    RawCommitRecord {
        commit_hash: hash.to_string(),
        owner_id: OWNER.to_string(),
        timestamp: ts(timestamp),
        author_name: author.to_string(),
        language: language.to_string(),
        added_lines: added,
        removed_lines: removed,
        repository: None,
    }
}

pub fn usage(
    day: &str,
    language: &str,
    code_acceptances: i64,
    code_suggestions: i64,
    lines_accepted: i64,
    lines_suggested: i64,
) -> RawCopilotUsageRecord {
    RawCopilotUsageRecord {
        owner_id: OWNER.to_string(),
        date: date(day),
        ide: "vscode".to_string(),
        model: "default".to_string(),
        language: language.to_string(),
        total_users: 1,
        code_acceptances,
        code_suggestions,
        lines_accepted,
        lines_suggested,
    }
}

pub fn usage_users(day: &str, total_users: i64) -> RawCopilotUsageRecord {
    RawCopilotUsageRecord {
        total_users,
        ..usage(day, "Rust", 0, 0, 0, 0)
    }
}

pub fn chat(day: &str, total_users: i64) -> RawCopilotChatRecord {
    RawCopilotChatRecord {
        owner_id: OWNER.to_string(),
        date: date(day),
        ide: "vscode".to_string(),
        model: "default".to_string(),
        total_users,
        total_chats: total_users * 2,
        copy_events: 0,
        insertion_events: 0,
    }
}
