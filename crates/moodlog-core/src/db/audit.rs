//! Audit log operations

use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::error::Result;

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

impl Database {
    /// Log an audit entry
    pub fn log_audit(
        &self,
        user_id: &str,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (user_id, action, entity_type, entity_id, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![user_id, action, entity_type, entity_id, details],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List audit log entries, newest first, optionally for one user
    pub fn list_audit_log(&self, user_id: Option<&str>, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, user_id, action, entity_type, entity_id, details
            FROM audit_log
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let entries = stmt
            .query_map(params![user_id, limit], |row| {
                let timestamp_str: String = row.get(1)?;
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: timestamp_str,
                    user_id: row.get(2)?,
                    action: row.get(3)?,
                    entity_type: row.get(4)?,
                    entity_id: row.get(5)?,
                    details: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
