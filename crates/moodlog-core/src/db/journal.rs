//! Journal entry and reason operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{date_column, parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::*;

const ENTRY_COLUMNS: &str =
    "e.id, e.user_id, e.entry_date, e.mood_score, e.content, e.import_hash, e.created_at, e.updated_at";

impl Database {
    /// Create a journal entry for a user
    pub fn create_journal_entry(&self, user_id: &str, entry: &NewJournalEntry) -> Result<i64> {
        let entry = entry.validated()?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO journal_entries (user_id, entry_date, mood_score, content)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                user_id,
                entry.entry_date.to_string(),
                entry.mood_score,
                entry.content
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_reasons(&tx, id, &entry.reasons)?;

        tx.commit()?;
        debug!(id, user = user_id, reasons = entry.reasons.len(), "Journal entry created");
        Ok(id)
    }

    /// Insert an imported entry unless one with the same hash already exists
    ///
    /// Returns the new id, or `None` when the entry was a duplicate.
    pub fn insert_imported_entry(
        &self,
        user_id: &str,
        entry: &NewJournalEntry,
        import_hash: &str,
    ) -> Result<Option<i64>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = insert_imported(&tx, user_id, entry, import_hash)?;
        tx.commit()?;
        Ok(id)
    }

    /// Insert a batch of imported entries in one transaction
    ///
    /// Duplicates are skipped. If any entry fails, nothing from the batch is kept.
    pub fn insert_imported_entries<'a, I>(&self, user_id: &str, rows: I) -> Result<ImportStats>
    where
        I: IntoIterator<Item = (&'a NewJournalEntry, &'a str)>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();

        for (entry, import_hash) in rows {
            match insert_imported(&tx, user_id, entry, import_hash)? {
                Some(_) => stats.imported += 1,
                None => stats.skipped += 1,
            }
        }

        tx.commit()?;
        Ok(stats)
    }

    /// Get a single entry by id
    pub fn get_journal_entry(&self, id: i64) -> Result<Option<JournalEntry>> {
        let conn = self.conn()?;

        let sql = format!("SELECT {} FROM journal_entries e WHERE e.id = ?", ENTRY_COLUMNS);
        let entry = conn
            .query_row(&sql, params![id], Self::row_to_journal_entry)
            .optional()?;

        match entry {
            Some(mut entry) => {
                entry.reasons = load_reasons(&conn, entry.id)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// List a user's entries, newest first
    pub fn list_journal_entries(
        &self,
        user_id: &str,
        filter: &JournalFilter,
    ) -> Result<Vec<JournalEntry>> {
        let conn = self.conn()?;

        // Build dynamic WHERE clause
        let mut conditions = vec!["e.user_id = ?".to_string()];
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(from) = filter.from {
            conditions.push("e.entry_date >= ?".to_string());
            values.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            conditions.push("e.entry_date <= ?".to_string());
            values.push(Box::new(to.to_string()));
        }
        if let Some(ref reason) = filter.reason {
            conditions.push(
                "e.id IN (SELECT entry_id FROM journal_reasons WHERE reason = ?)".to_string(),
            );
            values.push(Box::new(reason.clone()));
        }

        // SQLite treats a negative LIMIT as "no limit"
        values.push(Box::new(filter.limit.unwrap_or(-1)));
        values.push(Box::new(filter.offset.unwrap_or(0).max(0)));

        let sql = format!(
            r#"
            SELECT {}
            FROM journal_entries e
            WHERE {}
            ORDER BY e.entry_date DESC, e.id DESC
            LIMIT ? OFFSET ?
            "#,
            ENTRY_COLUMNS,
            conditions.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();

        let mut entries = stmt
            .query_map(params_refs.as_slice(), Self::row_to_journal_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for entry in &mut entries {
            entry.reasons = load_reasons(&conn, entry.id)?;
        }

        Ok(entries)
    }

    /// All of a user's entries, oldest first
    pub fn all_journal_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>> {
        let mut entries = self.list_journal_entries(user_id, &JournalFilter::default())?;
        entries.reverse();
        Ok(entries)
    }

    /// Apply a partial update and return the updated entry
    pub fn update_journal_entry(
        &self,
        id: i64,
        update: &JournalEntryUpdate,
    ) -> Result<JournalEntry> {
        if let Some(score) = update.mood_score {
            validate_mood_score(score)?;
        }

        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;

            let exists: bool = tx
                .query_row(
                    "SELECT 1 FROM journal_entries WHERE id = ?",
                    params![id],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if !exists {
                return Err(Error::NotFound(format!("Journal entry {}", id)));
            }

            let mut updates = vec!["updated_at = CURRENT_TIMESTAMP"];
            let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(date) = update.entry_date {
                updates.push("entry_date = ?");
                values.push(Box::new(date.to_string()));
            }
            if let Some(score) = update.mood_score {
                updates.push("mood_score = ?");
                values.push(Box::new(score));
            }
            if let Some(ref content) = update.content {
                let content = content.trim();
                updates.push("content = ?");
                values.push(Box::new((!content.is_empty()).then(|| content.to_string())));
            }

            values.push(Box::new(id));
            let sql = format!(
                "UPDATE journal_entries SET {} WHERE id = ?",
                updates.join(", ")
            );
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                values.iter().map(|p| p.as_ref()).collect();
            tx.execute(&sql, params_refs.as_slice())?;

            if let Some(ref reasons) = update.reasons {
                tx.execute("DELETE FROM journal_reasons WHERE entry_id = ?", params![id])?;
                insert_reasons(&tx, id, &normalize_reasons(reasons))?;
            }

            tx.commit()?;
        }

        self.get_journal_entry(id)?
            .ok_or_else(|| Error::NotFound(format!("Journal entry {}", id)))
    }

    /// Delete an entry and its reasons. Returns false if it did not exist.
    pub fn delete_journal_entry(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM journal_reasons WHERE entry_id = ?", params![id])?;
        let deleted = tx.execute("DELETE FROM journal_entries WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Every date the user wrote an entry on (may repeat)
    pub fn journal_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT entry_date FROM journal_entries WHERE user_id = ?")?;

        let dates = stmt
            .query_map(params![user_id], |row| date_column(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(dates)
    }

    /// Reasons the user has used, most frequent first
    pub fn reason_counts(&self, user_id: &str) -> Result<Vec<ReasonCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.reason, COUNT(*) as cnt
            FROM journal_reasons r
            JOIN journal_entries e ON e.id = r.entry_id
            WHERE e.user_id = ?
            GROUP BY r.reason
            ORDER BY cnt DESC, r.reason ASC
            "#,
        )?;

        let counts = stmt
            .query_map(params![user_id], |row| {
                Ok(ReasonCount {
                    reason: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    /// Summary numbers for the status screen
    pub fn journal_stats(&self, user_id: &str) -> Result<JournalStats> {
        let conn = self.conn()?;

        let (total_entries, first, last): (i64, Option<String>, Option<String>) = conn.query_row(
            "SELECT COUNT(*), MIN(entry_date), MAX(entry_date) FROM journal_entries WHERE user_id = ?",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let distinct_reasons: i64 = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT r.reason)
            FROM journal_reasons r
            JOIN journal_entries e ON e.id = r.entry_id
            WHERE e.user_id = ?
            "#,
            params![user_id],
            |row| row.get(0),
        )?;

        let breathing_sessions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM breathing_sessions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(JournalStats {
            total_entries,
            first_entry: first.as_deref().map(parse_date).transpose()?,
            last_entry: last.as_deref().map(parse_date).transpose()?,
            distinct_reasons,
            breathing_sessions,
        })
    }

    /// Map a row selected with `ENTRY_COLUMNS`; reasons are loaded separately
    fn row_to_journal_entry(row: &rusqlite::Row) -> rusqlite::Result<JournalEntry> {
        let created_at: String = row.get(6)?;
        let updated_at: Option<String> = row.get(7)?;

        Ok(JournalEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            entry_date: date_column(row, 2)?,
            mood_score: row.get(3)?,
            reasons: vec![],
            content: row.get(4)?,
            import_hash: row.get(5)?,
            created_at: parse_datetime(&created_at),
            updated_at: updated_at.as_deref().map(parse_datetime),
        })
    }
}

fn insert_imported(
    conn: &Connection,
    user_id: &str,
    entry: &NewJournalEntry,
    import_hash: &str,
) -> Result<Option<i64>> {
    let entry = entry.validated()?;

    let inserted = conn.execute(
        r#"
        INSERT OR IGNORE INTO journal_entries (user_id, entry_date, mood_score, content, import_hash)
        VALUES (?, ?, ?, ?, ?)
        "#,
        params![
            user_id,
            entry.entry_date.to_string(),
            entry.mood_score,
            entry.content,
            import_hash
        ],
    )?;

    if inserted == 0 {
        return Ok(None);
    }

    let id = conn.last_insert_rowid();
    insert_reasons(conn, id, &entry.reasons)?;
    Ok(Some(id))
}

fn insert_reasons(conn: &Connection, entry_id: i64, reasons: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO journal_reasons (entry_id, reason, position) VALUES (?, ?, ?)",
    )?;
    for (position, reason) in reasons.iter().enumerate() {
        stmt.execute(params![entry_id, reason, position as i64])?;
    }
    Ok(())
}

fn load_reasons(conn: &Connection, entry_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT reason FROM journal_reasons WHERE entry_id = ? ORDER BY position",
    )?;
    let reasons = stmt
        .query_map(params![entry_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(reasons)
}
