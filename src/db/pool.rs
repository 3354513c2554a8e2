//! SQLite connection wrapper (lightweight for CLI usage).
//!
//! Every connection is configured the same way: foreign keys enforced, WAL
//! journaling so the daemon's small writes do not block `stats` readers, and a
//! busy timeout so lock contention is retried by SQLite itself.

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// How long a statement waits on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(3);

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    /// Open (creating if needed) the database at `path`.
    pub fn new(path: &str) -> AppResult<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(Path::new(path))?;
        configure(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing database; a missing file is `StorageUnavailable`.
    pub fn open_existing(path: &str) -> AppResult<Self> {
        if !Self::exists(path) {
            return Err(AppError::StorageUnavailable(path.to_string()));
        }
        Self::new(path)
    }

    pub fn exists(path: &str) -> bool {
        Path::new(path).is_file()
    }

    /// Helper to execute a closure with a mutable connection reference.
    pub fn with_conn<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        func(&mut self.conn)
    }
}

fn configure(conn: &Connection) -> AppResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // journal_mode returns a row, so it cannot go through execute_batch
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    Ok(())
}
