//! Account and user database operations

use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::models::{Account, User};
use super::super::sqlite::{parse_json, parse_timestamp};
use super::super::{Database, DbResult};

impl Database {
    pub fn create_account(&self, name: &str, features: &[&str]) -> DbResult<Account> {
        let conn = self.conn()?;
        let created_at = Utc::now();
        let features: Vec<String> = features.iter().map(|f| f.to_string()).collect();
        let features_json = serde_json::to_string(&features)?;

        conn.execute(
            "INSERT INTO accounts (name, features, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, features_json, created_at.to_rfc3339()],
        )?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            features,
            created_at,
        })
    }

    pub fn get_account(&self, account_id: i64) -> DbResult<Option<Account>> {
        let conn = self.conn()?;

        let account = conn
            .query_row(
                "SELECT id, name, features, created_at FROM accounts WHERE id = ?1",
                [account_id],
                |row| {
                    let features_json: String = row.get(2)?;
                    let created_at_str: String = row.get(3)?;
                    Ok(Account {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        features: parse_json(2, &features_json)?,
                        created_at: parse_timestamp(3, &created_at_str)?,
                    })
                },
            )
            .optional()?;

        Ok(account)
    }

    pub fn create_user(&self, account_id: i64, name: &str, email: &str, admin: bool) -> DbResult<User> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (account_id, name, email, admin) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![account_id, name, email, if admin { 1 } else { 0 }],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            account_id,
            name: name.to_string(),
            email: email.to_string(),
            admin,
        })
    }

    /// Get a user, scoped to the account
    pub fn get_user(&self, account_id: i64, user_id: i64) -> DbResult<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                "SELECT id, account_id, name, email, admin FROM users WHERE id = ?1 AND account_id = ?2",
                [user_id, account_id],
                |row| {
                    let admin: i64 = row.get(4)?;
                    Ok(User {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        name: row.get(2)?,
                        email: row.get(3)?,
                        admin: admin != 0,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }
}
