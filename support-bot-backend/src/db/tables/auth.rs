//! Auth session database operations

use chrono::{Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::models::AuthSession;
use super::super::sqlite::parse_timestamp;
use super::super::{Database, DbResult};

/// How long an issued token stays valid
const SESSION_TTL_HOURS: i64 = 24;

impl Database {
    pub fn create_auth_session(&self, account_id: i64, user_id: i64) -> DbResult<AuthSession> {
        let conn = self.conn()?;
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::hours(SESSION_TTL_HOURS);

        conn.execute(
            "INSERT INTO auth_sessions (token, account_id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                &token,
                account_id,
                user_id,
                created_at.to_rfc3339(),
                expires_at.to_rfc3339()
            ],
        )?;

        Ok(AuthSession {
            token,
            account_id,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Look up an unexpired session by token
    pub fn validate_auth_session(&self, token: &str) -> DbResult<Option<AuthSession>> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let session = conn
            .query_row(
                "SELECT token, account_id, user_id, created_at, expires_at FROM auth_sessions WHERE token = ?1 AND expires_at > ?2",
                rusqlite::params![token, now],
                |row| {
                    let created_at_str: String = row.get(3)?;
                    let expires_at_str: String = row.get(4)?;
                    Ok(AuthSession {
                        token: row.get(0)?,
                        account_id: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: parse_timestamp(3, &created_at_str)?,
                        expires_at: parse_timestamp(4, &expires_at_str)?,
                    })
                },
            )
            .optional()?;

        Ok(session)
    }

    pub fn delete_auth_session(&self, token: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }
}
