//! Integration tests for the raw store and the metric queries
//!
//! These tests load the JSON fixtures in `tests/fixtures/` into an on-disk
//! store and check the end-to-end query and report flow.

use chrono::NaiveDate;
use devpulse_core::config::ReportConfig;
use devpulse_core::db::{Database, MetricsFilter};
use devpulse_core::metrics::{generate_report, queries};
use devpulse_core::types::{
    DateRange, RawCommitRecord, RawCopilotChatRecord, RawCopilotUsageRecord,
};
use devpulse_core::{CodeLinesNormalization, Period, ProductivityMetric, ProductivitySeries};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tempfile::TempDir;

const OWNER: &str = "acme";

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load_fixture<T: DeserializeOwned>(name: &str) -> Vec<T> {
    let content = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Open a fresh on-disk store seeded with every fixture for `OWNER`
fn seeded_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("data.db")).unwrap();
    db.migrate().unwrap();

    let mut commits: Vec<RawCommitRecord> = load_fixture("commits.json");
    let mut usage: Vec<RawCopilotUsageRecord> = load_fixture("copilot_usage.json");
    let mut chat: Vec<RawCopilotChatRecord> = load_fixture("copilot_chat.json");
    commits.iter_mut().for_each(|r| r.owner_id = OWNER.to_string());
    usage.iter_mut().for_each(|r| r.owner_id = OWNER.to_string());
    chat.iter_mut().for_each(|r| r.owner_id = OWNER.to_string());

    db.insert_commits(&commits).unwrap();
    db.insert_copilot_usage(&usage).unwrap();
    db.insert_copilot_chat(&chat).unwrap();

    (dir, db)
}

// ============================================
// Productivity
// ============================================

#[test]
fn test_weekly_code_lines() {
    let (_dir, db) = seeded_db();
    let filter = MetricsFilter::new().with_range(DateRange::new(day("2024-04-29"), day("2024-05-12")));

    let metrics = queries::calculated_metrics(
        &db,
        OWNER,
        Period::Week,
        ProductivityMetric::CodeLines,
        CodeLinesNormalization::GrandTotal,
        &filter,
    )
    .unwrap();

    assert_eq!(metrics.owner_id, OWNER);
    assert_eq!(metrics.languages, vec!["Go", "Python", "Rust"]);

    let ProductivitySeries::CodeLines(buckets) = metrics.series else {
        panic!("expected code-lines series");
    };
    assert_eq!(buckets.len(), 2);

    // 50 added lines in the window; 25 accepted lines in week one, 6 in week two
    assert_eq!(buckets[0].bucket_start, day("2024-04-29"));
    assert_eq!(buckets[0].net_changed_lines, 38);
    assert_eq!(buckets[0].distinct_author_count, 2);
    assert_eq!(buckets[0].percentage_changed_lines_by_copilot, 0.5);
    assert_eq!(buckets[0].net_changed_lines_by_copilot, 19);

    assert_eq!(buckets[1].bucket_start, day("2024-05-06"));
    assert_eq!(buckets[1].net_changed_lines, 20);
    assert!((buckets[1].percentage_changed_lines_by_copilot - 0.12).abs() < 1e-12);
    assert_eq!(buckets[1].net_changed_lines_by_copilot, 2);
}

#[test]
fn test_monthly_commit_counts() {
    let (_dir, db) = seeded_db();

    let metrics = queries::calculated_metrics(
        &db,
        OWNER,
        Period::Month,
        ProductivityMetric::CommitCount,
        CodeLinesNormalization::GrandTotal,
        &MetricsFilter::new(),
    )
    .unwrap();

    let ProductivitySeries::CommitCount(buckets) = metrics.series else {
        panic!("expected commit-count series");
    };
    assert_eq!(buckets.len(), 2);

    assert_eq!(buckets[0].bucket_start, day("2024-04-01"));
    assert_eq!(buckets[0].bucket_end, day("2024-05-01"));
    assert_eq!(buckets[0].total_commits, 1);
    assert!((buckets[0].percentage_ai_suggestions_accepted - 0.2).abs() < 1e-12);

    // a1f3c9e touches two languages but counts once
    assert_eq!(buckets[1].total_commits, 3);
    assert_eq!(buckets[1].distinct_author_count, 2);
    assert!((buckets[1].percentage_ai_suggestions_accepted - 19.0 / 58.0).abs() < 1e-12);
}

#[test]
fn test_language_filter_narrows_productivity() {
    let (_dir, db) = seeded_db();
    let filter = MetricsFilter::new().with_languages(["Go"]);

    let metrics = queries::calculated_metrics(
        &db,
        OWNER,
        Period::Year,
        ProductivityMetric::CodeLines,
        CodeLinesNormalization::PerBucket,
        &filter,
    )
    .unwrap();

    assert_eq!(metrics.languages, vec!["Go"]);
    let ProductivitySeries::CodeLines(buckets) = metrics.series else {
        panic!("expected code-lines series");
    };
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].net_changed_lines, 56);
    // Go usage: 20 accepted lines over 45 added Go lines
    assert!((buckets[0].percentage_changed_lines_by_copilot - 20.0 / 45.0).abs() < 1e-12);
}

#[test]
fn test_unknown_owner_is_empty_not_error() {
    let (_dir, db) = seeded_db();

    let metrics = queries::calculated_metrics(
        &db,
        "someone-else",
        Period::Week,
        ProductivityMetric::CommitCount,
        CodeLinesNormalization::GrandTotal,
        &MetricsFilter::new(),
    )
    .unwrap();

    assert!(metrics.series.is_empty());
    assert!(metrics.languages.is_empty());
    assert_eq!(metrics.series.metric(), ProductivityMetric::CommitCount);
}

// ============================================
// Copilot breakdowns
// ============================================

#[test]
fn test_language_breakdown_for_may() {
    let (_dir, db) = seeded_db();
    let filter = MetricsFilter::new().with_range(DateRange::new(day("2024-05-01"), day("2024-05-31")));

    let breakdown = queries::language_breakdown(&db, OWNER, &filter).unwrap();
    let languages: Vec<_> = breakdown.iter().map(|b| b.language.as_str()).collect();
    assert_eq!(languages, vec!["Go", "Python", "Rust"]);

    assert!((breakdown[0].pct_code_acceptances - 100.0 * 5.0 / 30.0).abs() < 1e-9);
    assert_eq!(breakdown[1].pct_code_acceptances, 50.0);
    assert_eq!(breakdown[2].pct_lines_accepted, 50.0);
}

#[test]
fn test_daily_period_breakdown() {
    let (_dir, db) = seeded_db();

    let daily = queries::period_breakdown(&db, OWNER, Period::Day, &MetricsFilter::new()).unwrap();
    let starts: Vec<_> = daily.iter().map(|b| b.period_start).collect();
    assert_eq!(
        starts,
        vec![
            day("2024-04-10"),
            day("2024-05-01"),
            day("2024-05-03"),
            day("2024-05-08")
        ]
    );
    assert_eq!(daily[1].total_code_acceptances, 10);
    assert_eq!(daily[1].pct_code_acceptances, 0.5);
}

#[test]
fn test_users_outer_join() {
    let (_dir, db) = seeded_db();

    let users = queries::users_metrics(&db, OWNER, &MetricsFilter::new()).unwrap();
    let rows: Vec<_> = users
        .iter()
        .map(|u| (u.date, u.total_code_assistant_users, u.total_chat_users))
        .collect();
    assert_eq!(
        rows,
        vec![
            (day("2024-04-10"), 1, 0),
            (day("2024-05-01"), 2, 0),
            (day("2024-05-02"), 0, 3),
            (day("2024-05-03"), 1, 0),
            (day("2024-05-08"), 1, 2),
        ]
    );
}

#[test]
fn test_users_language_filter_skips_chat() {
    let (_dir, db) = seeded_db();

    let filter = MetricsFilter::new().with_languages(["Rust"]);
    let users = queries::users_metrics(&db, OWNER, &filter).unwrap();
    let rows: Vec<_> = users
        .iter()
        .map(|u| (u.date, u.total_code_assistant_users, u.total_chat_users))
        .collect();
    assert_eq!(rows, vec![(day("2024-05-02"), 0, 3), (day("2024-05-08"), 1, 2)]);
}

#[test]
fn test_grouped_queries() {
    let (_dir, db) = seeded_db();

    let by_repo =
        queries::productivity_grouped_by(&db, OWNER, &["repository"], &MetricsFilter::new()).unwrap();
    let totals: Vec<_> = by_repo.iter().map(|g| (g.key[0].as_str(), g.value)).collect();
    assert_eq!(totals, vec![("api", 38), ("cli", 70)]);

    let by_ide = queries::ai_lines_grouped_by(&db, OWNER, &["ide"], &MetricsFilter::new()).unwrap();
    assert_eq!(by_ide.len(), 2);
    assert_eq!(by_ide[0].key, vec!["jetbrains".to_string()]);
    assert_eq!(by_ide[0].ratio, 0.5);

    assert!(queries::ai_lines_grouped_by(&db, OWNER, &["author"], &MetricsFilter::new()).is_err());
}

// ============================================
// Store behavior
// ============================================

#[test]
fn test_reimport_skips_duplicate_commits() {
    let (_dir, db) = seeded_db();

    let mut commits: Vec<RawCommitRecord> = load_fixture("commits.json");
    commits.iter_mut().for_each(|r| r.owner_id = OWNER.to_string());
    assert_eq!(db.insert_commits(&commits).unwrap(), 0);
    assert_eq!(db.list_commits(OWNER, &MetricsFilter::new()).unwrap().len(), 5);
}

#[test]
fn test_store_survives_reopen() {
    let (dir, db) = seeded_db();
    drop(db);

    let db = Database::open(&dir.path().join("data.db")).unwrap();
    db.migrate().unwrap();
    assert_eq!(db.list_copilot_chat(OWNER, None).unwrap().len(), 2);
}

// ============================================
// Report
// ============================================

#[test]
fn test_report_sections() {
    let (_dir, db) = seeded_db();

    let report = generate_report(
        &db,
        OWNER,
        day("2024-05-12"),
        &ReportConfig::default(),
        CodeLinesNormalization::GrandTotal,
    )
    .unwrap();

    assert!(!report.is_empty());
    assert_eq!(report.weekly_productivity.series.len(), 3);
    assert_eq!(report.monthly_productivity.series.len(), 2);

    // usage window is 2024-05-05 ..= 2024-05-12
    assert_eq!(report.languages.len(), 1);
    assert_eq!(report.languages[0].language, "Rust");
    assert_eq!(report.daily_usage.len(), 1);
    assert_eq!(report.users.len(), 1);
    assert_eq!(report.users[0].total_chat_users, 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["weekly_productivity"]["series"]["metric"], "code-lines");
    assert_eq!(json["as_of"], "2024-05-12");
}
