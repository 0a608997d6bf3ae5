//! Keyed JSON-document store over SQLite.
//!
//! Every table shares one shape: an auto-incrementing integer key and an
//! opaque JSON document. Keys are monotonic and never reused within a
//! table, even after deletes. Each operation is a durability point: once
//! it returns `Ok`, the document survives a process restart.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare the store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite failure: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("no record with key {key} in table `{table}`")]
    NotFound { table: String, key: i64 },
    #[error("invalid table name `{0}`")]
    InvalidTable(String),
}

/// A stored document annotated with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: i64,
    pub value: Value,
}

pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (or create) the store file inside `dir`.
    pub fn open(dir: &Path, file_name: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(file_name))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An ephemeral store, for tests and dry runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Create a table. Idempotent; succeeds if the table already exists.
    pub fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)
    }

    /// Insert a document and return it annotated with its new key.
    pub fn create(&self, table: &str, value: &Value) -> Result<Record, StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)?;

        conn.execute(
            &format!("INSERT INTO {} (json_data) VALUES (?1)", table),
            params![value.to_string()],
        )?;

        Ok(Record {
            key: conn.last_insert_rowid(),
            value: value.clone(),
        })
    }

    /// Point lookup. An absent key is `None`, not an error.
    pub fn read_one(&self, table: &str, key: i64) -> Result<Option<Value>, StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)?;

        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT json_data FROM {} WHERE id = ?1", table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// All records in insertion order.
    pub fn read_all(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, json_data FROM {} ORDER BY id",
            table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            records.push(Record {
                key,
                value: serde_json::from_str(&raw)?,
            });
        }
        Ok(records)
    }

    /// Full-document replace. Callers are expected to have read the record
    /// first; a missing key is `NotFound`.
    pub fn update(&self, table: &str, key: i64, value: &Value) -> Result<(), StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)?;

        let changed = conn.execute(
            &format!("UPDATE {} SET json_data = ?1 WHERE id = ?2", table),
            params![value.to_string(), key],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                key,
            });
        }
        Ok(())
    }

    /// Delete a record. Idempotent; deleting an absent key is fine.
    pub fn delete(&self, table: &str, key: i64) -> Result<(), StoreError> {
        let table = valid_table(table)?;
        let conn = self.conn.lock().unwrap();
        ensure_table(&conn, table)?;

        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", table),
            params![key],
        )?;
        Ok(())
    }
}

// Table names are spliced into SQL, so only identifier characters pass.
fn valid_table(name: &str) -> Result<&str, StoreError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(StoreError::InvalidTable(name.to_string()))
    }
}

fn ensure_table(conn: &Connection, table: &str) -> Result<(), StoreError> {
    // AUTOINCREMENT keeps deleted keys retired forever.
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, json_data TEXT NOT NULL)",
            table
        ),
        [],
    )?;
    Ok(())
}
