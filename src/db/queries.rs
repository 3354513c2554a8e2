use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::session::Session;
use rusqlite::{Connection, OptionalExtension, Result, Row, TransactionBehavior, params};

const SESSION_COLUMNS: &str = "id, client, start_time, end_time, duration, created_at";

pub fn map_session(row: &Row) -> Result<Session> {
    Ok(Session {
        id: row.get("id")?,
        client: row.get("client")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        duration: row.get("duration")?,
        created_at: row.get("created_at")?,
    })
}

/// Register a client name. Existing names are left untouched.
pub fn ensure_client(conn: &Connection, name: &str) -> AppResult<()> {
    conn.execute("INSERT OR IGNORE INTO clients (name) VALUES (?1)", [name])?;
    Ok(())
}

pub fn list_clients(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM clients ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert a new open session and return its id.
pub fn create_session(conn: &Connection, client: &str, start_time: i64) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO sessions (client, start_time) VALUES (?1, ?2)",
        params![client, start_time],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Close a session at `end_time`.
///
/// Returns `false` when nothing was updated: the session does not exist or it
/// was already closed at a different time. Closing twice at the same time is
/// a successful no-op. `end_time` is clamped so the duration is never negative.
pub fn close_session(conn: &Connection, id: i64, end_time: i64) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE sessions
            SET end_time = MAX(?2, start_time),
                duration = MAX(?2, start_time) - start_time
          WHERE id = ?1
            AND (end_time IS NULL OR end_time = MAX(?2, start_time))",
        params![id, end_time],
    )?;
    Ok(changed > 0)
}

/// Close a session with a fixed duration counted from its start.
pub fn close_session_with_duration(conn: &Connection, id: i64, duration: i64) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE sessions
            SET end_time = start_time + ?2,
                duration = ?2
          WHERE id = ?1 AND end_time IS NULL",
        params![id, duration.max(0)],
    )?;
    Ok(changed > 0)
}

pub fn find_session(conn: &Connection, id: i64) -> AppResult<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
    let session = conn.query_row(&sql, [id], map_session).optional()?;
    Ok(session)
}

pub fn open_sessions(conn: &Connection) -> AppResult<Vec<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE end_time IS NULL ORDER BY start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_session)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn sessions_for_client(conn: &Connection, client: &str) -> AppResult<Vec<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE client = ?1 ORDER BY start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([client], map_session)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Ids of open sessions started before `older_than`.
pub fn find_stale_open_sessions(conn: &Connection, older_than: i64) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM sessions
          WHERE end_time IS NULL AND start_time < ?1
          ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map([older_than], |row| row.get::<_, i64>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Latest `last_seen` across a session's usage rows.
pub fn last_seen_for_session(conn: &Connection, session_id: i64) -> AppResult<Option<i64>> {
    let last: Option<i64> = conn.query_row(
        "SELECT MAX(last_seen) FROM app_usage WHERE session_id = ?1",
        [session_id],
        |row| row.get(0),
    )?;
    Ok(last)
}

/// Add `increment_seconds` of foreground time for `app_name` to a session.
///
/// The application upsert and the usage upsert run in one transaction. An
/// existing `bundle_id` is never overwritten.
pub fn record_usage(
    pool: &mut DbPool,
    session_id: i64,
    app_name: &str,
    app_identifier: Option<&str>,
    increment_seconds: i64,
    observed_at: i64,
) -> AppResult<()> {
    let identifier = app_identifier.filter(|id| !id.trim().is_empty());

    let tx = pool
        .conn
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO applications (name, bundle_id) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET bundle_id = COALESCE(bundle_id, excluded.bundle_id)",
        params![app_name, identifier],
    )?;

    tx.execute(
        "INSERT INTO app_usage (session_id, application_id, total_seconds, last_seen)
         SELECT ?1, id, ?3, ?4 FROM applications WHERE name = ?2
         ON CONFLICT(session_id, application_id) DO UPDATE SET
             total_seconds = total_seconds + excluded.total_seconds,
             last_seen = excluded.last_seen",
        params![session_id, app_name, increment_seconds, observed_at],
    )?;

    tx.commit()?;
    Ok(())
}

pub fn application_bundle_id(conn: &Connection, name: &str) -> AppResult<Option<String>> {
    let id: Option<Option<String>> = conn
        .query_row(
            "SELECT bundle_id FROM applications WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.flatten())
}

/// Remove a session and, through the foreign key, its usage rows.
pub fn delete_session(conn: &Connection, id: i64) -> AppResult<bool> {
    let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

pub fn usage_row_count(conn: &Connection, session_id: i64) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM app_usage WHERE session_id = ?1",
        [session_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
