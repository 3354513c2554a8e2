//! Schema migrations.
//!
//! Applied migrations are recorded in the internal `log` table with
//! `operation = 'migration_applied'` and the migration version as target, so
//! running the engine again is a no-op.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_tracking_schema",
        description: "Created sessions, applications, app_usage and clients tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            client      TEXT NOT NULL,
            start_time  INTEGER NOT NULL,
            end_time    INTEGER,
            duration    INTEGER,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            CHECK ((end_time IS NULL) = (duration IS NULL)),
            CHECK (duration IS NULL OR duration >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_client ON sessions(client);
        CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
        CREATE INDEX IF NOT EXISTS idx_sessions_active ON sessions(end_time) WHERE end_time IS NULL;

        CREATE TABLE IF NOT EXISTS applications (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT NOT NULL UNIQUE,
            bundle_id  TEXT
        );

        CREATE TABLE IF NOT EXISTS app_usage (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id      INTEGER NOT NULL,
            application_id  INTEGER NOT NULL,
            total_seconds   INTEGER NOT NULL DEFAULT 0,
            last_seen       INTEGER,
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
            FOREIGN KEY (application_id) REFERENCES applications(id),
            UNIQUE(session_id, application_id)
        );

        CREATE INDEX IF NOT EXISTS idx_app_usage_session ON app_usage(session_id);

        CREATE TABLE IF NOT EXISTS clients (
            name        TEXT PRIMARY KEY,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );
        "#,
    },
];

/// Ensure that the `log` table exists. It also stores the migration ledger.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, migration: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(migration.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", migration.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![migration.version, migration.description],
    )?;

    tx.commit()?;
    Ok(())
}

/// Public entry point: run all pending migrations, returning the versions applied.
///
/// Called by `db::initialize::init_db()`.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if is_applied(conn, migration.version)? {
            continue;
        }
        apply(conn, migration)?;
        applied.push(migration.version);
    }

    Ok(applied)
}
