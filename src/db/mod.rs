//! Database module - SQLite storage for plans, logs and sync clients
//!
//! Plans and logs are stored as opaque JSON text keyed by date. Every write
//! replaces the whole row (last write wins).

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::{Map, Value};

/// Key in `meta_sync` holding the time of the last client upload
pub const LAST_SYNC_KEY: &str = "last_server_sync_time";

/// Current UTC time, fixed width so timestamps sort as strings
pub fn utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Table holding one JSON payload per date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Plans,
    Logs,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Plans => "workout_plans",
            Table::Logs => "workout_logs",
        }
    }

    fn payload_column(self) -> &'static str {
        match self {
            Table::Plans => "plan_json",
            Table::Logs => "log_json",
        }
    }
}

/// One stored plan or log
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: String,
    pub last_modified: String,
    pub payload: Value,
}

impl Record {
    /// Payload with `_lastModified` added, as the sync client expects
    pub fn stamped_payload(&self) -> Value {
        let mut payload = self.payload.clone();
        if let Value::Object(map) = &mut payload {
            map.insert("_lastModified".into(), Value::String(self.last_modified.clone()));
        }
        payload
    }
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("failed to open database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Fresh private database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS workout_plans (
                    date TEXT PRIMARY KEY,
                    plan_json TEXT NOT NULL,
                    last_modified TEXT NOT NULL,
                    last_modified_by TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_plans_modified ON workout_plans(last_modified);

                CREATE TABLE IF NOT EXISTS workout_logs (
                    date TEXT PRIMARY KEY,
                    log_json TEXT NOT NULL,
                    last_modified TEXT NOT NULL,
                    last_modified_by TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_logs_modified ON workout_logs(last_modified);

                CREATE TABLE IF NOT EXISTS clients (
                    id TEXT PRIMARY KEY,
                    name TEXT,
                    last_seen_at TEXT
                );

                CREATE TABLE IF NOT EXISTS meta_sync (
                    key TEXT PRIMARY KEY,
                    value TEXT
                );",
            )
            .context("failed to initialize schema")?;
        Ok(())
    }

    // --- plans and logs ---

    /// Store (or replace) the payload for `date`; returns the write timestamp.
    pub fn put(&self, table: Table, date: &str, payload: &Value, modified_by: &str) -> Result<String> {
        let now = utc_now();
        self.put_at(table, date, payload, modified_by, &now)?;
        Ok(now)
    }

    fn put_at(&self, table: Table, date: &str, payload: &Value, modified_by: &str, now: &str) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (date, {}, last_modified, last_modified_by) VALUES (?1, ?2, ?3, ?4)",
            table.name(),
            table.payload_column()
        );
        self.conn
            .execute(&sql, params![date, serde_json::to_string(payload)?, now, modified_by])
            .with_context(|| format!("failed to save {} for {}", table.name(), date))?;
        Ok(())
    }

    pub fn get(&self, table: Table, date: &str) -> Result<Option<Record>> {
        let sql = self.select(table, "WHERE date = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![date], raw_record)
            .optional()
            .with_context(|| format!("failed to fetch {} for {}", table.name(), date))?;
        raw.map(decode).transpose()
    }

    /// Rows dated within `[start, end]`, oldest first, at most `limit`
    pub fn between(&self, table: Table, start: &str, end: &str, limit: usize) -> Result<Vec<Record>> {
        let sql = self.select(table, "WHERE date >= ?1 AND date <= ?2 ORDER BY date LIMIT ?3");
        self.query(&sql, params![start, end, limit as i64])
    }

    /// Most recent rows dated within `[start, end]`, newest first
    pub fn recent_between(&self, table: Table, start: &str, end: &str, limit: usize) -> Result<Vec<Record>> {
        let sql = self.select(table, "WHERE date >= ?1 AND date <= ?2 ORDER BY date DESC LIMIT ?3");
        self.query(&sql, params![start, end, limit as i64])
    }

    /// Rows written strictly after `since`
    pub fn modified_since(&self, table: Table, since: &str) -> Result<Vec<Record>> {
        let sql = self.select(table, "WHERE last_modified > ?1 ORDER BY date");
        self.query(&sql, params![since])
    }

    pub fn all(&self, table: Table) -> Result<Vec<Record>> {
        let sql = self.select(table, "ORDER BY date");
        self.query(&sql, [])
    }

    /// Rows dated on or after `date`
    pub fn dated_from(&self, table: Table, date: &str) -> Result<Vec<Record>> {
        let sql = self.select(table, "WHERE date >= ?1 ORDER BY date");
        self.query(&sql, params![date])
    }

    pub fn count_between(&self, table: Table, start: &str, end: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE date >= ?1 AND date <= ?2", table.name());
        let count = self.conn.query_row(&sql, params![start, end], |row| row.get(0))?;
        Ok(count)
    }

    pub fn dates_between(&self, table: Table, start: &str, end: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT date FROM {} WHERE date >= ?1 AND date <= ?2 ORDER BY date",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let dates = stmt
            .query_map(params![start, end], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(dates)
    }

    fn select(&self, table: Table, tail: &str) -> String {
        format!(
            "SELECT date, {}, last_modified FROM {} {}",
            table.payload_column(),
            table.name(),
            tail
        )
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, raw_record)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(decode).collect()
    }

    // --- sync clients ---

    /// Create or rename a client and mark it as seen now
    pub fn register_client(&self, id: &str, name: &str) -> Result<String> {
        let now = utc_now();
        self.conn.execute(
            "INSERT OR REPLACE INTO clients (id, name, last_seen_at) VALUES (?1, ?2, ?3)",
            params![id, name, now],
        )?;
        Ok(now)
    }

    /// Update `last_seen_at` of an already known client
    pub fn touch_client(&self, id: &str, now: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE clients SET last_seen_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    pub fn client_last_seen(&self, id: &str) -> Result<Option<String>> {
        let seen = self
            .conn
            .query_row("SELECT last_seen_at FROM clients WHERE id = ?1", params![id], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(seen.flatten())
    }

    /// Store uploaded logs, the uploading client and the sync time atomically.
    ///
    /// Returns the applied dates and the server time used for every row.
    pub fn apply_log_upload(&self, client_id: &str, client_name: &str, logs: &Map<String, Value>) -> Result<(Vec<String>, String)> {
        let now = utc_now();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO clients (id, name, last_seen_at) VALUES (?1, ?2, ?3)",
            params![client_id, client_name, now],
        )?;
        let mut applied = Vec::with_capacity(logs.len());
        for (date, log) in logs {
            self.put_at(Table::Logs, date, log, client_id, &now)?;
            applied.push(date.clone());
        }
        tx.execute(
            "INSERT OR REPLACE INTO meta_sync (key, value) VALUES (?1, ?2)",
            params![LAST_SYNC_KEY, now],
        )?;

        tx.commit().context("failed to commit log upload")?;
        Ok((applied, now))
    }

    // --- meta ---

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta_sync WHERE key = ?1", params![key], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(value.flatten())
    }
}

fn raw_record(row: &Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode((date, json, last_modified): (String, String, String)) -> Result<Record> {
    let payload = serde_json::from_str(&json)
        .with_context(|| format!("stored payload for {} is not valid JSON", date))?;
    Ok(Record { date, last_modified, payload })
}
