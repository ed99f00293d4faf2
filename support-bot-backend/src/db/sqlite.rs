use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

/// Pool size for file-backed databases
const MAX_POOL_SIZE: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("json column error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at `database_url`; ":memory:" gives a
    /// private in-memory database backed by a single pooled connection.
    pub fn new(database_url: &str) -> DbResult<Self> {
        let in_memory = database_url == ":memory:";

        let manager = if in_memory {
            SqliteConnectionManager::memory()
        } else {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqliteConnectionManager::file(database_url)
        };
        let manager = manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        // An in-memory database lives and dies with its connection, so keep exactly one alive
        let pool = if in_memory {
            Pool::builder()
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(manager)?
        } else {
            Pool::builder().max_size(MAX_POOL_SIZE).build(manager)?
        };

        let db = Self { pool };
        db.init()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Round trip to the store
    pub fn ping(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn init(&self) -> DbResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                features TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                admin INTEGER NOT NULL DEFAULT 0,
                UNIQUE(account_id, email)
            );

            CREATE TABLE IF NOT EXISTS auth_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT UNIQUE NOT NULL,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS portals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                name TEXT NOT NULL,
                main_portal INTEGER NOT NULL DEFAULT 0,
                product_id INTEGER REFERENCES products(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                portal_id INTEGER NOT NULL UNIQUE REFERENCES portals(id),
                product_id INTEGER REFERENCES products(id),
                external_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                template_data TEXT NOT NULL DEFAULT '{}',
                additional_settings TEXT NOT NULL DEFAULT '{}',
                enable_in_portal INTEGER NOT NULL DEFAULT 0,
                training_status TEXT,
                last_updated_by INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                attachable_type TEXT,
                attachable_id INTEGER,
                content_file_name TEXT NOT NULL,
                content_url TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_bots_account ON bots(account_id);
            CREATE INDEX IF NOT EXISTS idx_portals_account ON portals(account_id);
            CREATE INDEX IF NOT EXISTS idx_products_account ON products(account_id);
            CREATE INDEX IF NOT EXISTS idx_attachments_owner
                ON attachments(attachable_type, attachable_id);",
        )?;

        Ok(())
    }
}

/// Parse an RFC 3339 column inside a row mapper
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a JSON TEXT column inside a row mapper
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
