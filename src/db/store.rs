//! SQLite database store implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Settings key under which the GitHub access token is persisted.
const TOKEN_KEY: &str = "github_token";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;

        Ok(())
    }

    // --- Settings ---

    /// Get a setting value by key.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a setting.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a setting. Returns whether a row was removed.
    pub fn delete_setting(&self, key: &str) -> Result<bool, DbError> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    // --- Token ---

    /// The persisted GitHub token, if any.
    pub fn get_token(&self) -> Result<Option<String>, DbError> {
        Ok(self.get_setting(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Persist the GitHub token. An empty token clears it.
    pub fn set_token(&self, token: &str) -> Result<(), DbError> {
        let token = token.trim();
        if token.is_empty() {
            self.delete_setting(TOKEN_KEY)?;
            return Ok(());
        }
        self.set_setting(TOKEN_KEY, token)
    }

    /// Forget the persisted GitHub token.
    pub fn clear_token(&self) -> Result<bool, DbError> {
        self.delete_setting(TOKEN_KEY)
    }
}
