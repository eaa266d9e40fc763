// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Local session storage: a small key/value table in SQLite

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::services::UserProfile;
use crate::{OnboardError, Result};

/// Key the authenticated profile is stored under
pub const USER_INFO_KEY: &str = "userInfo";

/// Session store (thread-safe wrapper)
#[derive(Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

/// One stored entry
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl SessionStore {
    /// Open or create the store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;
        Ok(store)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| OnboardError::SessionStore("lock poisoned".to_string()))
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    /// Store a raw value, replacing any previous one
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO session_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM session_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM session_storage WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM session_storage", [])?;
        Ok(())
    }

    /// All entries, ordered by key
    pub fn entries(&self) -> Result<Vec<SessionEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM session_storage ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| {
                let updated_str: String = row.get(2)?;
                Ok(SessionEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: DateTime::parse_from_rfc3339(&updated_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Store a value as JSON
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set_item(key, &json)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_user_info(&self, profile: &UserProfile) -> Result<()> {
        self.set_json(USER_INFO_KEY, profile)
    }

    pub fn load_user_info(&self) -> Result<Option<UserProfile>> {
        self.get_json(USER_INFO_KEY)
    }
}
