//! Breathing session log

use chrono::NaiveDate;
use rusqlite::params;

use super::{date_column, parse_date, parse_datetime, Database};
use crate::breathing::{validate_cycles, BreathingPattern};
use crate::error::Result;
use crate::models::{BreathingSession, NewBreathingSession};

impl Database {
    /// Record a completed breathing exercise
    pub fn log_breathing_session(
        &self,
        user_id: &str,
        session: &NewBreathingSession,
    ) -> Result<i64> {
        validate_cycles(session.cycles)?;

        let duration_secs = session
            .pattern
            .session_duration(session.cycles)
            .as_secs_f64()
            .round() as i64;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO breathing_sessions (user_id, pattern, cycles, duration_secs, completed_on)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                session.pattern.as_str(),
                session.cycles,
                duration_secs,
                session.completed_on.to_string()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List a user's sessions, most recent first
    pub fn list_breathing_sessions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<BreathingSession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, pattern, cycles, duration_secs, completed_on, created_at
            FROM breathing_sessions
            WHERE user_id = ?
            ORDER BY completed_on DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, limit], |row| {
                let pattern: String = row.get(2)?;
                let completed_on: String = row.get(5)?;
                let created_at: String = row.get(6)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    pattern,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    completed_on,
                    created_at,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for (id, user_id, pattern, cycles, duration_secs, completed_on, created_at) in rows {
            // Skip rows written by a newer version with patterns this build doesn't know
            let Ok(pattern) = pattern.parse::<BreathingPattern>() else {
                tracing::warn!(id, pattern = %pattern, "Unknown breathing pattern in database");
                continue;
            };
            sessions.push(BreathingSession {
                id,
                user_id,
                pattern,
                cycles,
                duration_secs,
                completed_on: parse_date(&completed_on)?,
                created_at: parse_datetime(&created_at),
            });
        }

        Ok(sessions)
    }

    /// Every date the user completed a breathing session on (may repeat)
    pub fn breathing_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT completed_on FROM breathing_sessions WHERE user_id = ?")?;

        let dates = stmt
            .query_map(params![user_id], |row| date_column(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(dates)
    }
}
