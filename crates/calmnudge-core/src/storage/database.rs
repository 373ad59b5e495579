//! SQLite storage.
//!
//! Provides persistent storage for:
//! - Completed activities (test, reflection, breathing)
//! - The notification outbox standing in for the OS scheduler
//! - Key-value store for reminder state and permission status

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::activity::ActivityKind;
use crate::error::DatabaseError;

/// One completed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub kind: ActivityKind,
    pub completed_at: DateTime<Utc>,
}

/// A notification waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite database at `<data_dir>/calmnudge.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database in the data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("calmnudge.db"))
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS activities (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                kind         TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS outbox (
                id         TEXT PRIMARY KEY,
                fire_at    TEXT NOT NULL,
                title      TEXT NOT NULL,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_activities_kind_completed_at ON activities(kind, completed_at);",
        )?;
        Ok(())
    }

    // ── Activities ───────────────────────────────────────────────────

    /// Record a completed activity.
    pub fn record_activity(
        &self,
        kind: ActivityKind,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO activities (kind, completed_at) VALUES (?1, ?2)",
            params![kind.as_str(), fmt_time(completed_at)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Latest completion of `kind`, if any.
    pub fn last_completed(&self, kind: ActivityKind) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        // Fixed-width UTC timestamps sort chronologically as text.
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(completed_at) FROM activities WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        raw.map(|s| parse_time("completed_at", &s)).transpose()
    }

    /// Most recent activities, newest first.
    pub fn recent_activities(&self, limit: usize) -> Result<Vec<ActivityRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, completed_at FROM activities ORDER BY completed_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, completed_at) = row?;
            records.push(ActivityRecord {
                id,
                kind: kind.parse().map_err(|e: crate::error::ValidationError| {
                    DatabaseError::Corrupt {
                        key: "activities.kind".to_string(),
                        message: e.to_string(),
                    }
                })?,
                completed_at: parse_time("completed_at", &completed_at)?,
            });
        }
        Ok(records)
    }

    // ── Outbox ───────────────────────────────────────────────────────

    /// Insert or replace an outbox entry.
    pub fn outbox_put(&self, entry: &OutboxEntry) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO outbox (id, fire_at, title, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                fmt_time(entry.fire_at),
                entry.title,
                entry.body,
                fmt_time(entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// Remove an outbox entry. Returns whether a row existed.
    pub fn outbox_remove(&self, id: &str) -> Result<bool, DatabaseError> {
        let removed = self.conn.execute("DELETE FROM outbox WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// All outbox entries, soonest first.
    pub fn outbox_list(&self) -> Result<Vec<OutboxEntry>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, fire_at, title, body, created_at FROM outbox ORDER BY fire_at ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, fire_at, title, body, created_at) = row?;
            entries.push(OutboxEntry {
                id,
                fire_at: parse_time("fire_at", &fire_at)?,
                title,
                body,
                created_at: parse_time("created_at", &created_at)?,
            });
        }
        Ok(entries)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn fmt_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(key: &str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })
}
