//! Database repository layer
//!
//! Insert and filtered list operations for the three raw metric tables.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::types::{DateRange, RawCommitRecord, RawCopilotChatRecord, RawCopilotUsageRecord};

/// Filter for the commit and Copilot usage list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsFilter {
    /// Inclusive day range; `None` means all time
    pub range: Option<DateRange>,
    /// Keep only these languages; empty means all
    pub languages: Vec<String>,
}

impl MetricsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.conn())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Poisoned by a panicking caller; the connection is still usable.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================
    // Commit operations
    // ============================================

    /// Insert commit rows in one transaction.
    ///
    /// Rows already stored for the same (owner, hash, language, repository)
    /// are skipped. Returns the number of rows actually inserted.
    pub fn insert_commits(&self, rows: &[RawCommitRecord]) -> Result<usize> {
        for row in rows {
            require_owner(&row.owner_id)?;
            row.validate()?;
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO raw_commit_metrics
                    (owner_id, commit_hash, timestamp, author_name, language,
                     added_lines, removed_lines, repository)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for row in rows {
                inserted += stmt.execute(params![
                    row.owner_id,
                    row.commit_hash,
                    format_timestamp(row.timestamp),
                    row.author_name,
                    row.language,
                    row.added_lines,
                    row.removed_lines,
                    row.repository.as_deref().unwrap_or(""),
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(
            rows = rows.len(),
            inserted,
            skipped = rows.len() - inserted,
            "Inserted commit rows"
        );
        Ok(inserted)
    }

    /// Commit rows for `owner_id`, ordered by timestamp.
    pub fn list_commits(&self, owner_id: &str, filter: &MetricsFilter) -> Result<Vec<RawCommitRecord>> {
        let conn = self.conn();

        let mut query = FilteredQuery::new("SELECT * FROM raw_commit_metrics WHERE owner_id = ?", owner_id);
        query.range("substr(timestamp, 1, 10)", filter.range.as_ref());
        query.languages(&filter.languages);
        query.order_by("timestamp ASC, commit_hash ASC, language ASC");

        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(query.params().as_slice(), Self::row_to_commit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(owner_id, rows = rows.len(), "Listed commit rows");
        Ok(rows)
    }

    fn row_to_commit(row: &Row) -> rusqlite::Result<RawCommitRecord> {
        let repository: String = row.get("repository")?;

        Ok(RawCommitRecord {
            commit_hash: row.get("commit_hash")?,
            owner_id: row.get("owner_id")?,
            timestamp: parse_timestamp(row, "timestamp")?,
            author_name: row.get("author_name")?,
            language: row.get("language")?,
            added_lines: row.get("added_lines")?,
            removed_lines: row.get("removed_lines")?,
            repository: (!repository.is_empty()).then_some(repository),
        })
    }

    // ============================================
    // Copilot code-completion operations
    // ============================================

    /// Insert or update Copilot usage rows in one transaction.
    ///
    /// A row for an existing (owner, date, ide, model, language) slice
    /// replaces the stored counters, so re-importing a day is safe.
    pub fn insert_copilot_usage(&self, rows: &[RawCopilotUsageRecord]) -> Result<usize> {
        for row in rows {
            require_owner(&row.owner_id)?;
            row.validate()?;
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO raw_copilot_code_metrics
                    (owner_id, date, ide, model, language, total_users,
                     code_acceptances, code_suggestions, lines_accepted, lines_suggested)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(owner_id, date, ide, model, language) DO UPDATE SET
                    total_users = excluded.total_users,
                    code_acceptances = excluded.code_acceptances,
                    code_suggestions = excluded.code_suggestions,
                    lines_accepted = excluded.lines_accepted,
                    lines_suggested = excluded.lines_suggested
                "#,
            )?;

            for row in rows {
                written += stmt.execute(params![
                    row.owner_id,
                    row.date.to_string(),
                    row.ide,
                    row.model,
                    row.language,
                    row.total_users,
                    row.code_acceptances,
                    row.code_suggestions,
                    row.lines_accepted,
                    row.lines_suggested,
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(rows = rows.len(), "Upserted copilot usage rows");
        Ok(written)
    }

    /// Copilot usage rows for `owner_id`, ordered by date.
    pub fn list_copilot_usage(
        &self,
        owner_id: &str,
        filter: &MetricsFilter,
    ) -> Result<Vec<RawCopilotUsageRecord>> {
        let conn = self.conn();

        let mut query =
            FilteredQuery::new("SELECT * FROM raw_copilot_code_metrics WHERE owner_id = ?", owner_id);
        query.range("date", filter.range.as_ref());
        query.languages(&filter.languages);
        query.order_by("date ASC, language ASC, ide ASC, model ASC");

        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(query.params().as_slice(), Self::row_to_usage)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(owner_id, rows = rows.len(), "Listed copilot usage rows");
        Ok(rows)
    }

    fn row_to_usage(row: &Row) -> rusqlite::Result<RawCopilotUsageRecord> {
        Ok(RawCopilotUsageRecord {
            owner_id: row.get("owner_id")?,
            date: parse_date(row, "date")?,
            ide: row.get("ide")?,
            model: row.get("model")?,
            language: row.get("language")?,
            total_users: row.get("total_users")?,
            code_acceptances: row.get("code_acceptances")?,
            code_suggestions: row.get("code_suggestions")?,
            lines_accepted: row.get("lines_accepted")?,
            lines_suggested: row.get("lines_suggested")?,
        })
    }

    // ============================================
    // Copilot chat operations
    // ============================================

    /// Insert or update Copilot chat rows in one transaction.
    pub fn insert_copilot_chat(&self, rows: &[RawCopilotChatRecord]) -> Result<usize> {
        for row in rows {
            require_owner(&row.owner_id)?;
            row.validate()?;
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO raw_copilot_chat_metrics
                    (owner_id, date, ide, model, total_users, total_chats,
                     copy_events, insertion_events)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(owner_id, date, ide, model) DO UPDATE SET
                    total_users = excluded.total_users,
                    total_chats = excluded.total_chats,
                    copy_events = excluded.copy_events,
                    insertion_events = excluded.insertion_events
                "#,
            )?;

            for row in rows {
                written += stmt.execute(params![
                    row.owner_id,
                    row.date.to_string(),
                    row.ide,
                    row.model,
                    row.total_users,
                    row.total_chats,
                    row.copy_events,
                    row.insertion_events,
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(rows = rows.len(), "Upserted copilot chat rows");
        Ok(written)
    }

    /// Copilot chat rows for `owner_id`, ordered by date.
    ///
    /// Chat activity has no language, so only the date range applies.
    pub fn list_copilot_chat(
        &self,
        owner_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<RawCopilotChatRecord>> {
        let conn = self.conn();

        let mut query =
            FilteredQuery::new("SELECT * FROM raw_copilot_chat_metrics WHERE owner_id = ?", owner_id);
        query.range("date", range);
        query.order_by("date ASC, ide ASC, model ASC");

        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(query.params().as_slice(), Self::row_to_chat)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(owner_id, rows = rows.len(), "Listed copilot chat rows");
        Ok(rows)
    }

    fn row_to_chat(row: &Row) -> rusqlite::Result<RawCopilotChatRecord> {
        Ok(RawCopilotChatRecord {
            owner_id: row.get("owner_id")?,
            date: parse_date(row, "date")?,
            ide: row.get("ide")?,
            model: row.get("model")?,
            total_users: row.get("total_users")?,
            total_chats: row.get("total_chats")?,
            copy_events: row.get("copy_events")?,
            insertion_events: row.get("insertion_events")?,
        })
    }
}

// ============================================
// Helpers
// ============================================

/// SQL text plus positional parameters, built up clause by clause.
struct FilteredQuery {
    sql: String,
    params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl FilteredQuery {
    fn new(base: &str, owner_id: &str) -> Self {
        Self {
            sql: base.to_string(),
            params: vec![Box::new(owner_id.to_string())],
        }
    }

    fn range(&mut self, day_expr: &str, range: Option<&DateRange>) {
        let Some(range) = range else { return };

        if let Some(from) = range.from {
            self.sql.push_str(&format!(" AND {} >= ?", day_expr));
            self.params.push(Box::new(from.to_string()));
        }
        if let Some(to) = range.to {
            self.sql.push_str(&format!(" AND {} <= ?", day_expr));
            self.params.push(Box::new(to.to_string()));
        }
    }

    fn languages(&mut self, languages: &[String]) {
        if languages.is_empty() {
            return;
        }
        let placeholders = vec!["?"; languages.len()].join(", ");
        self.sql.push_str(&format!(" AND language IN ({})", placeholders));
        for language in languages {
            self.params.push(Box::new(language.clone()));
        }
    }

    fn order_by(&mut self, clause: &str) {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(clause);
    }

    fn params(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

fn require_owner(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(Error::InvalidRecord("row has no owner_id".to_string()));
    }
    Ok(())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e))
}

fn parse_date(row: &Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(column)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| conversion_error(row, column, e))
}

fn conversion_error(row: &Row, column: &str, err: chrono::ParseError) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}
