//! Shared bot flags
//!
//! Small key/value table in SQLite holding operator toggles that must survive
//! restarts and be visible to every process pointed at the same file. The
//! maintenance mode lives here.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::gate::{MaintenanceMode, MaintenanceSource};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bot_flags (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const MAINTENANCE_FLAG: &str = "maintenance_mode";

#[derive(Error, Debug)]
pub enum FlagError {
    #[error("Flag store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Flag store lock poisoned")]
    Poisoned,
}

pub type FlagResult<T> = Result<T, FlagError>;

/// Thread-safe flag store handle
#[derive(Clone)]
pub struct FlagStore {
    conn: Arc<Mutex<Connection>>,
}

impl FlagStore {
    /// Open or create the flag store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> FlagResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> FlagResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> FlagResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> FlagResult<T>) -> FlagResult<T> {
        let conn = self.conn.lock().map_err(|_| FlagError::Poisoned)?;
        f(&conn)
    }

    pub fn get(&self, name: &str) -> FlagResult<Option<String>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM bot_flags WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    pub fn set(&self, name: &str, value: &str) -> FlagResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bot_flags (name, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![name, value, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }
}

impl MaintenanceSource for FlagStore {
    fn maintenance_state(&self) -> FlagResult<MaintenanceMode> {
        self.get(MAINTENANCE_FLAG)
            .map(|raw| MaintenanceMode::from_flag_value(raw.as_deref()))
    }

    fn set_maintenance_state(&self, mode: &MaintenanceMode) -> FlagResult<()> {
        self.set(MAINTENANCE_FLAG, &mode.to_flag_value())
    }
}
