//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//!
//! Dates are stored as `YYYY-MM-DD` text. Commit timestamps are stored as
//! fixed-width RFC 3339 UTC text (microsecond precision, `Z` suffix), so the
//! first ten characters are always the UTC calendar day.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: raw metric tables
    r#"
    -- ============================================
    -- Source control
    -- ============================================

    -- One row per (commit, language). `repository` is '' when unknown so the
    -- uniqueness constraint also covers rows without one.
    CREATE TABLE IF NOT EXISTS raw_commit_metrics (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id         TEXT NOT NULL,
        commit_hash      TEXT NOT NULL,
        timestamp        TEXT NOT NULL,
        author_name      TEXT NOT NULL,
        language         TEXT NOT NULL,
        added_lines      INTEGER NOT NULL CHECK (added_lines >= 0),
        removed_lines    INTEGER NOT NULL CHECK (removed_lines >= 0),
        repository       TEXT NOT NULL DEFAULT '',

        UNIQUE(owner_id, commit_hash, language, repository)
    );

    -- ============================================
    -- Copilot
    -- ============================================

    CREATE TABLE IF NOT EXISTS raw_copilot_code_metrics (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id         TEXT NOT NULL,
        date             TEXT NOT NULL,
        ide              TEXT NOT NULL,
        model            TEXT NOT NULL,
        language         TEXT NOT NULL,
        total_users      INTEGER NOT NULL DEFAULT 0,
        code_acceptances INTEGER NOT NULL DEFAULT 0,
        code_suggestions INTEGER NOT NULL DEFAULT 0,
        lines_accepted   INTEGER NOT NULL DEFAULT 0,
        lines_suggested  INTEGER NOT NULL DEFAULT 0,

        UNIQUE(owner_id, date, ide, model, language)
    );

    CREATE TABLE IF NOT EXISTS raw_copilot_chat_metrics (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id         TEXT NOT NULL,
        date             TEXT NOT NULL,
        ide              TEXT NOT NULL,
        model            TEXT NOT NULL,
        total_users      INTEGER NOT NULL DEFAULT 0,
        total_chats      INTEGER NOT NULL DEFAULT 0,
        copy_events      INTEGER NOT NULL DEFAULT 0,
        insertion_events INTEGER NOT NULL DEFAULT 0,

        UNIQUE(owner_id, date, ide, model)
    );
    "#,
    // Version 2: owner/date indexes for the filtered list queries
    r#"
    CREATE INDEX IF NOT EXISTS idx_commit_owner_ts
        ON raw_commit_metrics(owner_id, timestamp);
    CREATE INDEX IF NOT EXISTS idx_commit_owner_language
        ON raw_commit_metrics(owner_id, language);
    CREATE INDEX IF NOT EXISTS idx_copilot_code_owner_date
        ON raw_copilot_code_metrics(owner_id, date);
    CREATE INDEX IF NOT EXISTS idx_copilot_chat_owner_date
        ON raw_copilot_chat_metrics(owner_id, date);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get current schema version
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
