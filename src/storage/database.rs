//! SQLite record store for recognition results
//!
//! Append-only: rows are inserted one at a time and never updated or deleted
//! by the application.

use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("nothing to save: image filename and recognized text are required")]
    EmptyRecord,
    #[error("could not prepare database directory: {0}")]
    Directory(#[from] std::io::Error),
}

/// A persisted recognition
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRecord {
    pub id: i64,
    pub image_filename: String,
    pub recognized_text: String,
    /// SQLite `CURRENT_TIMESTAMP` text (UTC, `YYYY-MM-DD HH:MM:SS`)
    pub timestamp: String,
}

/// Database connection wrapper
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;

        info!("Opened recognition database at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS recognitions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_filename TEXT NOT NULL,
                recognized_text TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    /// Append one recognition and return its row id
    pub fn append(&self, image_filename: &str, recognized_text: &str) -> Result<i64, StoreError> {
        if image_filename.is_empty() || recognized_text.is_empty() {
            return Err(StoreError::EmptyRecord);
        }

        self.conn.execute(
            "INSERT INTO recognitions (image_filename, recognized_text) VALUES (?1, ?2)",
            params![image_filename, recognized_text],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Saved recognition #{} ({} -> {})", id, image_filename, recognized_text);
        Ok(id)
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<RecognitionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, image_filename, recognized_text, timestamp
             FROM recognitions
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RecognitionRecord {
                id: row.get(0)?,
                image_filename: row.get(1)?,
                recognized_text: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recognitions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Close the connection, reporting any pending error
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_returns_increasing_ids() {
        let store = RecordStore::open_in_memory().unwrap();

        let first = store.append("plate_01.jpg", "浙岱渔12345").unwrap();
        let second = store.append("plate_02.jpg", "闽狮渔06789").unwrap();

        assert!(second > first);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_records_are_allowed() {
        let store = RecordStore::open_in_memory().unwrap();

        store.append("same.png", "A1").unwrap();
        store.append("same.png", "A1").unwrap();

        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_empty_fields_rejected() {
        let store = RecordStore::open_in_memory().unwrap();

        assert!(matches!(store.append("", "A1"), Err(StoreError::EmptyRecord)));
        assert!(matches!(store.append("x.png", ""), Err(StoreError::EmptyRecord)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_recent_is_newest_first_with_timestamp() {
        let store = RecordStore::open_in_memory().unwrap();
        store.append("a.png", "AAA").unwrap();
        store.append("b.png", "BBB").unwrap();
        store.append("c.png", "CCC").unwrap();

        let records = store.recent(2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].recognized_text, "CCC");
        assert_eq!(records[1].image_filename, "b.png");
        assert!(!records[0].timestamp.is_empty());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");

        {
            let store = RecordStore::open(&path).unwrap();
            store.append("hull.bmp", "ZHE-001").unwrap();
            store.close().unwrap();
        }

        let store = RecordStore::open(&path).unwrap();
        let records = store.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_filename, "hull.bmp");
        assert_eq!(records[0].recognized_text, "ZHE-001");
    }
}
