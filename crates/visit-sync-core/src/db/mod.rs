//! Local visit store backed by SQLite.

mod encounters;
mod locations;
mod patients;
mod schema;
mod visits;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Map SQLite constraint failures (UNIQUE, FOREIGN KEY) to [`DbError::Constraint`].
pub(crate) fn constraint_error(err: rusqlite::Error) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(message.unwrap_or_else(|| code.to_string()))
        }
        other => DbError::Sqlite(other),
    }
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Thread-safe handle to one `Database`, shared across the process.
///
/// Every call blocks on the mutex and on SQLite. Async callers run batches
/// through `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<Mutex<Database>>,
}

impl SharedDatabase {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Lock the underlying database.
    pub fn lock(&self) -> DbResult<MutexGuard<'_, Database>> {
        self.inner
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))
    }
}
